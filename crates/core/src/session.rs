//! Client session lifecycle.
//!
//! A [`Session`] is the bearer token plus the role and cached profile of whoever logged in. It is
//! persisted by a [`SessionStore`] as a small JSON key/value file so that every later CLI
//! invocation can authorise its calls. The lifecycle is explicit:
//!
//! - [`register`] creates a patient account; it does not log in
//! - [`login`] creates and saves a session
//! - [`logout`] removes it
//! - [`SessionStore::check`] removes it when an authenticated call comes back `401`
//!
//! A missing or empty token always means "not logged in".

use crate::api::MedbotApi;
use crate::{ApiError, CoreError, CoreResult};
use medbot_types::{EmailAddress, NonEmptyText, Role};
use medbot_wire::{DoctorProfile, PatientRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `contents` to `path`, readable and writable by the owner only on Unix.
fn write_owner_only(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    #[cfg(unix)]
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path)?;
    // `mode` only applies on creation; tighten a file left by an older save too.
    #[cfg(unix)]
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

/// Profile cached at login for the roles that have one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Profile {
    Doctor(DoctorProfile),
    Patient(PatientRecord),
}

/// The logged-in actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    token: String,
    role: Role,
    user_id: String,
    profile: Option<Profile>,
}

impl Session {
    pub fn new(token: NonEmptyText, role: Role, user_id: NonEmptyText) -> Self {
        Self {
            token: token.into_inner(),
            role,
            user_id: user_id.into_inner(),
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Backend id of the logged-in doctor, patient or staff member.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn doctor_profile(&self) -> Option<&DoctorProfile> {
        match &self.profile {
            Some(Profile::Doctor(profile)) => Some(profile),
            _ => None,
        }
    }

    /// Name shown in greetings; falls back to the role.
    pub fn display_name(&self) -> String {
        match &self.profile {
            Some(Profile::Doctor(p)) if !p.name.is_empty() => format!("Dr. {}", p.name),
            Some(Profile::Patient(p)) if !p.name.is_empty() => p.name.clone(),
            _ => format!("{} #{}", self.role, self.user_id),
        }
    }

    /// Fail with [`CoreError::WrongRole`] unless this session belongs to `required`.
    pub fn require_role(&self, required: Role) -> CoreResult<()> {
        if self.role == required {
            Ok(())
        } else {
            Err(CoreError::WrongRole {
                required,
                actual: self.role,
            })
        }
    }
}

// ============================================================================
// PERSISTENCE
// ============================================================================

/// On-disk layout. Profiles are stored as JSON strings under `doctorData` / `patientData`.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    #[serde(default)]
    token: String,
    role: Role,
    #[serde(default)]
    user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    doctor_id: Option<String>,
    #[serde(default, rename = "doctorData", skip_serializing_if = "Option::is_none")]
    doctor_data: Option<String>,
    #[serde(default, rename = "patientData", skip_serializing_if = "Option::is_none")]
    patient_data: Option<String>,
}

impl StoredSession {
    fn from_session(session: &Session) -> CoreResult<Self> {
        let (doctor_data, patient_data) = match &session.profile {
            Some(Profile::Doctor(p)) => (
                Some(serde_json::to_string(p).map_err(CoreError::Serialization)?),
                None,
            ),
            Some(Profile::Patient(p)) => (
                None,
                Some(serde_json::to_string(p).map_err(CoreError::Serialization)?),
            ),
            None => (None, None),
        };

        Ok(Self {
            token: session.token.clone(),
            role: session.role,
            user_id: session.user_id.clone(),
            doctor_id: (session.role == Role::Doctor).then(|| session.user_id.clone()),
            doctor_data,
            patient_data,
        })
    }

    fn into_session(self) -> Option<Session> {
        if self.token.trim().is_empty() {
            return None;
        }
        let user_id = if self.user_id.is_empty() {
            self.doctor_id.clone().unwrap_or_default()
        } else {
            self.user_id
        };

        // A profile that no longer decodes is dropped; the token is still usable.
        let profile = match self.role {
            Role::Doctor => self
                .doctor_data
                .and_then(|raw| serde_json::from_str(&raw).ok())
                .map(Profile::Doctor),
            Role::Patient => self
                .patient_data
                .and_then(|raw| serde_json::from_str(&raw).ok())
                .map(Profile::Patient),
            Role::Admin => None,
        };

        Some(Session {
            token: self.token,
            role: self.role,
            user_id,
            profile,
        })
    }
}

/// File-backed session storage.
#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, if any.
    ///
    /// A missing file, an empty token or an unreadable document all mean "not logged in"; the
    /// last case is logged.
    pub fn load(&self) -> CoreResult<Option<Session>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CoreError::SessionRead(err)),
        };

        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(stored) => Ok(stored.into_session()),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable session file: {err}");
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &Session) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(CoreError::SessionWrite)?;
            }
        }
        let stored = StoredSession::from_session(session)?;
        let json = serde_json::to_string_pretty(&stored).map_err(CoreError::Serialization)?;
        write_owner_only(&self.path, json.as_bytes()).map_err(CoreError::SessionWrite)
    }

    /// Remove the stored session. Returns `false` if there was nothing to remove.
    pub fn clear(&self) -> CoreResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(CoreError::SessionRemove(err)),
        }
    }

    /// The current session, or [`CoreError::NotAuthenticated`].
    pub fn current(&self) -> CoreResult<Session> {
        self.load()?.ok_or(CoreError::NotAuthenticated)
    }

    /// The current session, which must belong to `role`.
    pub fn current_as(&self, role: Role) -> CoreResult<Session> {
        let session = self.current()?;
        session.require_role(role)?;
        Ok(session)
    }

    /// Apply the session-expiry policy to the result of an authenticated call.
    ///
    /// `401` clears the stored session and becomes [`CoreError::SessionExpired`]; every other
    /// error passes through unchanged.
    pub fn check<T>(&self, result: Result<T, ApiError>) -> CoreResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(ApiError::Unauthorized) => {
                tracing::warn!("backend rejected the session token, clearing stored session");
                self.clear()?;
                Err(CoreError::SessionExpired)
            }
            Err(err) => Err(CoreError::Api(err)),
        }
    }
}

// ============================================================================
// LOGIN / LOGOUT
// ============================================================================

fn validate_identifier(role: Role, identifier: &str) -> CoreResult<String> {
    match role {
        Role::Patient => Ok(NonEmptyText::new(identifier)?.into_inner()),
        Role::Doctor | Role::Admin => Ok(EmailAddress::parse(identifier)?.as_str().to_owned()),
    }
}

/// Authenticate against the backend and persist the resulting session.
///
/// Doctors and patients also get their profile cached. A failed profile fetch is logged and
/// leaves the session without a profile; it does not fail the login.
///
/// # Errors
///
/// - [`CoreError::Text`] if the identifier or password is blank (or not an email where one is
///   expected); no call is made
/// - [`CoreError::Api`] with [`ApiError::InvalidCredentials`] when the backend rejects the
///   credentials; nothing is written
pub async fn login<A: MedbotApi>(
    api: &A,
    store: &SessionStore,
    role: Role,
    identifier: &str,
    password: &str,
) -> CoreResult<Session> {
    let identifier = validate_identifier(role, identifier)?;
    let password = NonEmptyText::new(password)?;

    let grant = api.login(role, &identifier, password.as_str()).await?;
    let role = match grant.role {
        Some(granted) if granted != role => {
            tracing::warn!(requested = %role, granted = %granted, "backend granted a different role");
            granted
        }
        _ => role,
    };

    let mut session = Session::new(
        NonEmptyText::new(&grant.access_token)?,
        role,
        NonEmptyText::new(&grant.user_id)?,
    );

    let profile = match role {
        Role::Doctor => api
            .doctor_profile(session.token(), session.user_id())
            .await
            .map(|p| Some(Profile::Doctor(p))),
        Role::Patient => api
            .patient_profile(session.token(), session.user_id())
            .await
            .map(|p| Some(Profile::Patient(p))),
        Role::Admin => Ok(None),
    };
    match profile {
        Ok(Some(profile)) => session = session.with_profile(profile),
        Ok(None) => {}
        Err(err) => tracing::warn!(user_id = session.user_id(), "failed to fetch profile: {err}"),
    }

    store.save(&session)?;
    tracing::info!(role = %role, user_id = session.user_id(), "logged in");
    Ok(session)
}

/// Create a patient account keyed by aadhaar number. No session is written.
///
/// # Errors
///
/// - [`CoreError::Text`] if the aadhaar number or password is blank; no call is made
/// - [`CoreError::Api`] with [`ApiError::Rejected`] if the account already exists
pub async fn register<A: MedbotApi>(api: &A, aadhaar: &str, password: &str) -> CoreResult<()> {
    let aadhaar = NonEmptyText::new(aadhaar)?;
    let password = NonEmptyText::new(password)?;

    if let Err(err) = api.register_patient(aadhaar.as_str(), password.as_str()).await {
        tracing::warn!("patient registration failed: {err}");
        return Err(err.into());
    }
    tracing::info!("patient account registered");
    Ok(())
}

/// Forget the stored session. Returns `false` if nobody was logged in.
pub fn logout(store: &SessionStore) -> CoreResult<bool> {
    let removed = store.clear()?;
    if removed {
        tracing::info!("logged out");
    }
    Ok(removed)
}
