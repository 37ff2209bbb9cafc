//! In-memory fakes of the collaborator traits for unit tests.

use crate::api::{ApiResult, AudioClip, DictationApi, MedbotApi};
use crate::ApiError;
use medbot_types::Role;
use medbot_wire::{
    AdmissionRequest, AnalysisResult, DiagnosisRecord, DoctorProfile, LoginGrant, NewDiagnosis,
    PatientRecord, Vitals, VitalsPatch, WireError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// How a fake call should fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Failure {
    Unauthorized,
    Server,
    Network,
}

impl Failure {
    fn to_error(self) -> ApiError {
        match self {
            Failure::Unauthorized => ApiError::Unauthorized,
            Failure::Server => ApiError::Server {
                status: 500,
                body: "boom".into(),
            },
            Failure::Network => ApiError::Network("connection refused".into()),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeApi {
    pub grant: Option<LoginGrant>,
    pub doctor: Option<DoctorProfile>,
    pub patients: Vec<PatientRecord>,
    pub diagnoses: Vec<DiagnosisRecord>,
    pub download: Vec<u8>,
    pub fail: Option<Failure>,
    pub failing_patient_ids: Vec<String>,
    /// Aadhaar numbers that already have an account.
    pub existing_accounts: Vec<String>,
    pub lookup_delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
    pub patches: Mutex<Vec<VitalsPatch>>,
    pub created: Mutex<Vec<NewDiagnosis>>,
    pub admissions: Mutex<Vec<AdmissionRequest>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeApi {
    fn record(&self, call: impl Into<String>) -> ApiResult<()> {
        self.calls.lock().expect("calls lock").push(call.into());
        match self.fail {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

pub(crate) fn doctor_grant() -> LoginGrant {
    LoginGrant {
        access_token: "access-123".into(),
        refresh_token: Some("refresh-456".into()),
        user_id: "4".into(),
        role: Some(Role::Doctor),
    }
}

pub(crate) fn doctor_profile() -> DoctorProfile {
    DoctorProfile {
        id: "4".into(),
        name: "Arjun Sharma".into(),
        department: Some("Pulmonology".into()),
        qualifications: vec!["MD".into()],
        specializations: vec!["Asthma".into()],
        email: Some("arjun@medbot.in".into()),
        contact_number: None,
        years_of_experience: Some(12),
    }
}

pub(crate) fn patient(id: &str, name: &str) -> PatientRecord {
    PatientRecord {
        id: id.into(),
        name: name.into(),
        aadhar: None,
        gender: None,
        age: None,
        date_of_birth: None,
        blood_group: None,
        contact_number: None,
        allergies: Vec::new(),
        medical_history: None,
        status: None,
        department: None,
        registered_at: None,
    }
}

pub(crate) fn diagnosis(id: &str) -> DiagnosisRecord {
    DiagnosisRecord {
        id: id.into(),
        patient_id: None,
        patient_name: None,
        patient_age: None,
        patient_gender: None,
        doctor_id: None,
        doctor_name: None,
        department: None,
        date: None,
        time: None,
        vitals: Vitals::default(),
        summary: None,
        tests: Vec::new(),
        test_results: Vec::new(),
        analysis: None,
        notes: None,
        prescriptions: Vec::new(),
        status: None,
        medical_history: None,
        allergies: Vec::new(),
        family_history: None,
        created_at: None,
        updated_at: None,
    }
}

impl MedbotApi for FakeApi {
    async fn login(&self, role: Role, identifier: &str, _password: &str) -> ApiResult<LoginGrant> {
        self.record(format!("login {} {identifier}", role.as_wire()))?;
        self.grant.clone().ok_or(ApiError::InvalidCredentials)
    }

    async fn register_patient(&self, aadhaar: &str, _password: &str) -> ApiResult<()> {
        self.record(format!("register_patient {aadhaar}"))?;
        if self.existing_accounts.iter().any(|a| a == aadhaar) {
            return Err(ApiError::Rejected("User already exists".into()));
        }
        Ok(())
    }

    async fn doctor_profile(&self, _token: &str, doctor_id: &str) -> ApiResult<DoctorProfile> {
        self.record(format!("doctor_profile {doctor_id}"))?;
        self.doctor
            .clone()
            .ok_or_else(|| ApiError::NotFound(format!("doctor {doctor_id}")))
    }

    async fn doctor_diagnoses(
        &self,
        _token: &str,
        doctor_id: &str,
    ) -> ApiResult<Vec<DiagnosisRecord>> {
        self.record(format!("doctor_diagnoses {doctor_id}"))?;
        Ok(self.diagnoses.clone())
    }

    async fn patient_profile(&self, _token: &str, patient_id: &str) -> ApiResult<PatientRecord> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.record(format!("patient_profile {patient_id}"))?;
        if self.failing_patient_ids.iter().any(|id| id == patient_id) {
            return Err(ApiError::Server {
                status: 500,
                body: "lookup failed".into(),
            });
        }
        self.patients
            .iter()
            .find(|p| p.id == patient_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("patient {patient_id}")))
    }

    async fn list_patients(&self, _token: &str) -> ApiResult<Vec<PatientRecord>> {
        self.record("list_patients")?;
        Ok(self.patients.clone())
    }

    async fn patient_diagnoses(
        &self,
        _token: &str,
        patient_id: &str,
    ) -> ApiResult<Vec<DiagnosisRecord>> {
        self.record(format!("patient_diagnoses {patient_id}"))?;
        Ok(self.diagnoses.clone())
    }

    async fn diagnosis_detail(
        &self,
        _token: &str,
        diagnosis_id: &str,
    ) -> ApiResult<DiagnosisRecord> {
        self.record(format!("diagnosis_detail {diagnosis_id}"))?;
        self.diagnoses
            .iter()
            .find(|d| d.id == diagnosis_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("diagnosis {diagnosis_id}")))
    }

    async fn update_vitals(
        &self,
        _token: &str,
        diagnosis_id: &str,
        patch: &VitalsPatch,
    ) -> ApiResult<()> {
        self.record(format!("update_vitals {diagnosis_id}"))?;
        self.patches.lock().expect("patches lock").push(patch.clone());
        Ok(())
    }

    async fn create_diagnosis(&self, _token: &str, body: &NewDiagnosis) -> ApiResult<()> {
        self.record("create_diagnosis")?;
        self.created.lock().expect("created lock").push(body.clone());
        Ok(())
    }

    async fn create_admission(&self, _token: &str, body: &AdmissionRequest) -> ApiResult<()> {
        self.record("create_admission")?;
        self.admissions
            .lock()
            .expect("admissions lock")
            .push(body.clone());
        Ok(())
    }

    async fn download_test(&self, _token: &str, file_name: &str) -> ApiResult<Vec<u8>> {
        self.record(format!("download_test {file_name}"))?;
        Ok(self.download.clone())
    }
}

/// Scripted dictation services.
#[derive(Default)]
pub(crate) struct FakeDictation {
    pub transcript: Option<String>,
    pub analysis: Option<AnalysisResult>,
    pub transcribe_fails: bool,
    pub analysis_malformed: bool,
    pub delay: Option<Duration>,
    pub clips: Mutex<Vec<AudioClip>>,
    pub analyzed: Mutex<Vec<String>>,
}

impl DictationApi for FakeDictation {
    async fn transcribe(&self, clip: &AudioClip) -> ApiResult<Option<String>> {
        self.clips.lock().expect("clips lock").push(clip.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.transcribe_fails {
            return Err(ApiError::Network("transcription service unreachable".into()));
        }
        Ok(self.transcript.clone())
    }

    async fn analyze(&self, transcript: &str) -> ApiResult<Option<AnalysisResult>> {
        self.analyzed
            .lock()
            .expect("analyzed lock")
            .push(transcript.to_owned());
        if self.analysis_malformed {
            return Err(ApiError::Decode(WireError::Translation(
                "analysis result schema mismatch at <root>: expected value".into(),
            )));
        }
        Ok(self.analysis.clone())
    }
}
