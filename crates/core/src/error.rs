use medbot_types::{Role, TextError};
use medbot_wire::WireError;

/// Failure of a single call to the backend or one of the dictation services.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("not authorised (token missing, expired or revoked)")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    /// The backend refused the request and said why (e.g. an account that already exists).
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Decode(#[from] WireError),
}

/// Audio capture failures surfaced by an [`crate::recorder::AudioInput`].
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("microphone access denied: {0}")]
    PermissionDenied(String),
    #[error("audio input unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read audio: {0}")]
    Read(std::io::Error),
    #[error("recorder is busy ({0})")]
    Busy(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("not logged in")]
    NotAuthenticated,
    #[error("session expired, log in again")]
    SessionExpired,
    #[error("this action requires a {required} session (logged in as {actual})")]
    WrongRole { required: Role, actual: Role },
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("invalid text: {0}")]
    Text(#[from] TextError),
    #[error("failed to read session file: {0}")]
    SessionRead(std::io::Error),
    #[error("failed to write session file: {0}")]
    SessionWrite(std::io::Error),
    #[error("failed to remove session file: {0}")]
    SessionRemove(std::io::Error),
    #[error("failed to serialize session: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to write downloaded file: {0}")]
    FileWrite(std::io::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Rejected form submission. The form is handed back untouched alongside the cause.
#[derive(Debug)]
pub struct SubmitError<F> {
    pub form: F,
    pub error: CoreError,
}

impl<F> std::fmt::Display for SubmitError<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "submission failed: {}", self.error)
    }
}

impl<F: std::fmt::Debug> std::error::Error for SubmitError<F> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<F> SubmitError<F> {
    pub fn new(form: F, error: CoreError) -> Self {
        Self { form, error }
    }

    /// `true` when no call was attempted because nobody is logged in.
    pub fn is_not_authenticated(&self) -> bool {
        matches!(self.error, CoreError::NotAuthenticated)
    }

    pub fn into_parts(self) -> (F, CoreError) {
        (self.form, self.error)
    }
}
