//! Wire models for the MedBot backend and dictation collaborators.
//!
//! This crate provides **wire models** and **translation helpers** for every JSON document
//! the client exchanges over the network:
//! - login grants and role profiles
//! - diagnosis records, vitals patches and the composite create payload
//! - transcription and analysis responses from the dictation services
//! - admission (allotment) payloads
//!
//! Backend field names (`SPo2`, `visiting_doctor_id`, `uploadedTests`, ...) stop at this
//! crate. Everything above it works with the public domain-level types re-exported here.

pub mod allotment;
pub mod auth;
pub mod diagnosis;
pub mod dictation;
pub mod profile;

mod lenient;

pub use allotment::{AdmissionRequest, AllocationDetails, PatientDetails};
pub use auth::{error_message, LoginGrant};
pub use diagnosis::{
    parse_int_prefix, DiagnosisRecord, DiagnosisStatus, NewDiagnosis, Prescription, Vitals,
    VitalsPatch,
};
pub use dictation::{AnalysisRequest, AnalysisResult, TranscriptionResponse};
pub use profile::{DoctorProfile, PatientRecord, PatientStatus};

use serde::de::DeserializeOwned;

/// Errors returned by the `medbot-wire` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`WireError`].
pub type WireResult<T> = Result<T, WireError>;

/// Decode a JSON document into a wire struct.
///
/// This uses `serde_path_to_error` so a schema mismatch names the failing field
/// (for example `prescriptions.0.drug`).
///
/// # Errors
///
/// Returns [`WireError::Translation`] if the bytes are not JSON or do not match `T`.
pub fn decode_json<T: DeserializeOwned>(what: &str, bytes: &[u8]) -> WireResult<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            Err(WireError::Translation(format!(
                "{what} schema mismatch at {path}: {source}"
            )))
        }
    }
}
