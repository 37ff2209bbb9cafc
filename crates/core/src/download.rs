//! Test result downloads.
//!
//! Result files are fetched by name from the backend and written into a caller-chosen
//! directory. The name must be a single plain path component so a hostile or mistyped name
//! cannot escape that directory. Existing files are never overwritten.

use crate::api::MedbotApi;
use crate::constants::DOWNLOAD_FALLBACK_MIME;
use crate::session::SessionStore;
use crate::{CoreError, CoreResult};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

/// Where a downloaded file ended up and what it contains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Sniffed from the content (best-effort).
    pub media_type: String,
    /// Lowercase hex SHA-256 of the content.
    pub sha256: String,
}

/// Accept only a single normal path component, e.g. `cbc98425.pdf`.
pub fn validate_file_name(name: &str) -> CoreResult<&str> {
    let trimmed = name.trim();
    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !trimmed.contains(['/', '\\']) => Ok(trimmed),
        _ => Err(CoreError::InvalidInput(format!(
            "invalid file name {name:?}: must be a plain file name"
        ))),
    }
}

pub fn sniff_media_type(bytes: &[u8]) -> String {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or(DOWNLOAD_FALLBACK_MIME)
        .to_owned()
}

fn already_exists(path: &Path) -> CoreError {
    CoreError::InvalidInput(format!("{} already exists", path.display()))
}

/// Create `path` and write `bytes`, failing if anything is already there.
fn write_new_file(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => return Err(already_exists(path)),
        Err(err) => return Err(CoreError::FileWrite(err)),
    };
    file.write_all(bytes).map_err(CoreError::FileWrite)
}

/// `GET /download-test/{fileName}` and save the body as `dest_dir/fileName`.
pub async fn download_test_result<A: MedbotApi>(
    api: &A,
    store: &SessionStore,
    file_name: &str,
    dest_dir: &Path,
) -> CoreResult<DownloadedFile> {
    let file_name = validate_file_name(file_name)?;
    let target = dest_dir.join(file_name);
    if target.exists() {
        return Err(already_exists(&target));
    }

    let session = store.current()?;
    let bytes = store.check(api.download_test(session.token(), file_name).await)?;

    fs::create_dir_all(dest_dir).map_err(CoreError::FileWrite)?;
    write_new_file(&target, &bytes)?;

    let digest = Sha256::digest(&bytes);
    let file = DownloadedFile {
        path: target,
        size_bytes: bytes.len() as u64,
        media_type: sniff_media_type(&bytes),
        sha256: hex::encode(digest),
    };
    tracing::info!(
        file = %file.path.display(),
        bytes = file.size_bytes,
        media_type = %file.media_type,
        "downloaded test result"
    );
    Ok(file)
}
