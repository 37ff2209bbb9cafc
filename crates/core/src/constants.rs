//! Constants shared across the client.

/// Lab tests a doctor can order. Analysis output is matched against these names.
pub const AVAILABLE_TESTS: [&str; 10] = [
    "CBC Test",
    "Influenza Test",
    "Blood Glucose",
    "Lipid Panel",
    "Liver Function",
    "Kidney Function",
    "Thyroid Panel",
    "Urinalysis",
    "X-Ray",
    "ECG",
];

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TRANSCRIBE_URL: &str = "http://localhost:3000/api/transcribe";
pub const DEFAULT_ANALYZE_URL: &str = "http://localhost:3000/api/analyze";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Session file location relative to the user's home directory.
pub const DEFAULT_SESSION_FILE: &str = ".medbot/session.json";

/// Upper bound on concurrent profile lookups when resolving patient names.
pub const PROFILE_FETCH_CONCURRENCY: usize = 4;

pub const UNKNOWN_PATIENT: &str = "Unknown Patient";

// Display fallbacks for the diagnosis detail view.
pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_MEDICAL_HISTORY: &str = "No medical history recorded";
pub const NO_ALLERGIES: &str = "No known allergies";
pub const NO_FAMILY_HISTORY: &str = "No family history recorded";
pub const NO_NOTES: &str = "No notes";
pub const NO_TESTS: &str = "No tests recorded";

pub const NO_PATIENTS_MESSAGE: &str = "No patients found";
pub const NO_DIAGNOSES_MESSAGE: &str = "No diagnosis records found";
pub const NO_MEDICAL_RECORDS_MESSAGE: &str = "No medical records found";

pub const DEFAULT_AUDIO_MIME: &str = "audio/webm";
pub const AUDIO_CHUNK_BYTES: usize = 16 * 1024;
pub const TRANSCRIPT_PREVIEW_CHARS: usize = 50;
pub const TRANSCRIPTION_ERROR_TEXT: &str = "Error occurred during transcription";

pub const DOWNLOAD_FALLBACK_MIME: &str = "application/octet-stream";
