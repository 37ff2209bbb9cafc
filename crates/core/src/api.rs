//! Seams to the remote collaborators.
//!
//! `MedbotApi` is the hospital backend; `DictationApi` is the pair of speech services used by the
//! recorder. Both are implemented over HTTP in `medbot-client` and by in-memory fakes in tests.
//! Every authenticated method takes the bearer token explicitly; callers obtain it from a
//! [`crate::session::Session`].

use crate::ApiError;
use medbot_types::Role;
use medbot_wire::{
    AdmissionRequest, AnalysisResult, DiagnosisRecord, DoctorProfile, LoginGrant, NewDiagnosis,
    PatientRecord, VitalsPatch,
};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Raw audio handed to the transcription service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioClip {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[allow(async_fn_in_trait)]
pub trait MedbotApi {
    /// `POST /login/{role}/`. A rejected identifier/password pair is
    /// [`ApiError::InvalidCredentials`].
    async fn login(&self, role: Role, identifier: &str, password: &str) -> ApiResult<LoginGrant>;

    /// `POST /register/patient/`. Missing fields or an existing account come back as
    /// [`ApiError::Rejected`] with the backend's reason.
    async fn register_patient(&self, aadhaar: &str, password: &str) -> ApiResult<()>;

    async fn doctor_profile(&self, token: &str, doctor_id: &str) -> ApiResult<DoctorProfile>;

    async fn doctor_diagnoses(&self, token: &str, doctor_id: &str)
        -> ApiResult<Vec<DiagnosisRecord>>;

    async fn patient_profile(&self, token: &str, patient_id: &str) -> ApiResult<PatientRecord>;

    async fn list_patients(&self, token: &str) -> ApiResult<Vec<PatientRecord>>;

    async fn patient_diagnoses(
        &self,
        token: &str,
        patient_id: &str,
    ) -> ApiResult<Vec<DiagnosisRecord>>;

    async fn diagnosis_detail(&self, token: &str, diagnosis_id: &str)
        -> ApiResult<DiagnosisRecord>;

    async fn update_vitals(
        &self,
        token: &str,
        diagnosis_id: &str,
        patch: &VitalsPatch,
    ) -> ApiResult<()>;

    async fn create_diagnosis(&self, token: &str, body: &NewDiagnosis) -> ApiResult<()>;

    async fn create_admission(&self, token: &str, body: &AdmissionRequest) -> ApiResult<()>;

    async fn download_test(&self, token: &str, file_name: &str) -> ApiResult<Vec<u8>>;
}

#[allow(async_fn_in_trait)]
pub trait DictationApi {
    /// Upload a clip; `Ok(None)` when the service heard nothing.
    async fn transcribe(&self, clip: &AudioClip) -> ApiResult<Option<String>>;

    /// Extract structured fields from a transcript; `Ok(None)` when the service returned no
    /// result.
    async fn analyze(&self, transcript: &str) -> ApiResult<Option<AnalysisResult>>;
}
