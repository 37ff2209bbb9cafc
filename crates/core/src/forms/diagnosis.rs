//! Diagnosis capture wizard.
//!
//! Step one collects vitals, the summary, ordered tests and uploaded result files; step two
//! collects prescriptions and notes. Dictation results can be merged in on either step.
//! `confirm` sends everything as one `POST /create-full-diagnosis/`.

use super::sealed::Editable;
use crate::api::MedbotApi;
use crate::constants::AVAILABLE_TESTS;
use crate::error::SubmitError;
use crate::merge::{canonical_test_name, merge_analysis};
use crate::session::SessionStore;
use crate::{CoreError, CoreResult};
use chrono::NaiveDateTime;
use medbot_types::{NonEmptyText, Role};
use medbot_wire::{AnalysisResult, NewDiagnosis, Prescription, Vitals};
use serde::{Deserialize, Serialize};

// ============================================================================
// DRAFT DATA
// ============================================================================

/// Everything entered so far. Also the format of a `--draft` file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisDraft {
    pub vitals: Vitals,
    pub diagnosis_summary: String,
    /// Selected tests, canonical names from [`AVAILABLE_TESTS`].
    pub tests: Vec<String>,
    /// Names of uploaded result files.
    pub uploaded_tests: Vec<String>,
    pub additional_notes: String,
    pub prescriptions: Vec<Prescription>,
}

impl Default for DiagnosisDraft {
    /// An empty draft with one blank prescription row.
    fn default() -> Self {
        Self {
            vitals: Vitals::default(),
            diagnosis_summary: String::new(),
            tests: Vec::new(),
            uploaded_tests: Vec::new(),
            additional_notes: String::new(),
            prescriptions: vec![Prescription::default()],
        }
    }
}

/// Free-text fields of the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    BloodPressure,
    Spo2,
    HeartRate,
    BloodSugar,
    DiagnosisSummary,
    AdditionalNotes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrescriptionField {
    Drug,
    Dosage,
    Duration,
    Method,
}

// ============================================================================
// TYPE-STATE MARKERS
// ============================================================================

/// Marker type: vitals, summary, tests and uploads.
#[derive(Clone, Copy, Debug)]
pub struct VitalsStep;

/// Marker type: prescriptions and notes; the only step that can be confirmed.
#[derive(Clone, Copy, Debug)]
pub struct PrescriptionsStep;

/// Marker type: accepted by the backend. No further edits.
#[derive(Clone, Debug)]
pub struct Submitted {
    request: NewDiagnosis,
}

impl Editable for VitalsStep {}
impl Editable for PrescriptionsStep {}

// ============================================================================
// DIAGNOSIS FORM
// ============================================================================

#[derive(Clone, Debug)]
pub struct DiagnosisForm<S> {
    patient_id: String,
    draft: DiagnosisDraft,
    state: S,
}

impl DiagnosisForm<VitalsStep> {
    /// Start a blank form for a patient.
    pub fn new(patient_id: NonEmptyText) -> Self {
        Self::with_draft(patient_id, DiagnosisDraft::default())
    }

    /// Start from previously entered data. Test names are normalised to the vocabulary and
    /// unknown ones dropped.
    pub fn with_draft(patient_id: NonEmptyText, mut draft: DiagnosisDraft) -> Self {
        let mut tests: Vec<String> = Vec::new();
        for name in &draft.tests {
            match canonical_test_name(name) {
                Some(canonical) if !tests.iter().any(|t| t == canonical) => {
                    tests.push(canonical.to_owned())
                }
                Some(_) => {}
                None => tracing::warn!(test = %name, "dropping unknown test from draft"),
            }
        }
        draft.tests = tests;

        Self {
            patient_id: patient_id.into_inner(),
            draft,
            state: VitalsStep,
        }
    }

    /// Move to the prescriptions step. Nothing is validated here.
    pub fn continue_to_prescriptions(self) -> DiagnosisForm<PrescriptionsStep> {
        DiagnosisForm {
            patient_id: self.patient_id,
            draft: self.draft,
            state: PrescriptionsStep,
        }
    }
}

impl<S> DiagnosisForm<S> {
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn draft(&self) -> &DiagnosisDraft {
        &self.draft
    }
}

impl<S: Editable> DiagnosisForm<S> {
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        let vitals = &mut self.draft.vitals;
        match field {
            FormField::BloodPressure => vitals.blood_pressure = value,
            FormField::Spo2 => vitals.spo2 = value,
            FormField::HeartRate => vitals.heart_rate = value,
            FormField::BloodSugar => vitals.blood_sugar = value,
            FormField::DiagnosisSummary => self.draft.diagnosis_summary = value,
            FormField::AdditionalNotes => self.draft.additional_notes = value,
        }
    }

    /// Select or deselect a test. Returns whether it is selected afterwards.
    pub fn toggle_test(&mut self, name: &str) -> CoreResult<bool> {
        let canonical = canonical_test_name(name).ok_or_else(|| {
            CoreError::InvalidInput(format!(
                "unknown test {name:?}; expected one of: {}",
                AVAILABLE_TESTS.join(", ")
            ))
        })?;

        if let Some(pos) = self.draft.tests.iter().position(|t| t == canonical) {
            self.draft.tests.remove(pos);
            Ok(false)
        } else {
            self.draft.tests.push(canonical.to_owned());
            Ok(true)
        }
    }

    pub fn add_uploaded_files<I, N>(&mut self, names: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        for name in names {
            let name: String = name.into();
            if !name.trim().is_empty() {
                self.draft.uploaded_tests.push(name);
            }
        }
    }

    /// Append a blank prescription row and return its index.
    pub fn add_prescription(&mut self) -> usize {
        self.draft.prescriptions.push(Prescription::default());
        self.draft.prescriptions.len() - 1
    }

    pub fn update_prescription(
        &mut self,
        index: usize,
        field: PrescriptionField,
        value: impl Into<String>,
    ) -> CoreResult<()> {
        let row = self
            .draft
            .prescriptions
            .get_mut(index)
            .ok_or_else(|| CoreError::InvalidInput(format!("no prescription row {index}")))?;
        let value = value.into();
        match field {
            PrescriptionField::Drug => row.drug = value,
            PrescriptionField::Dosage => row.dosage = value,
            PrescriptionField::Duration => row.duration = value,
            PrescriptionField::Method => row.method = value,
        }
        Ok(())
    }

    pub fn remove_prescription(&mut self, index: usize) -> CoreResult<Prescription> {
        if index >= self.draft.prescriptions.len() {
            return Err(CoreError::InvalidInput(format!("no prescription row {index}")));
        }
        Ok(self.draft.prescriptions.remove(index))
    }

    /// Merge a dictation analysis into the form.
    pub fn apply_analysis(&mut self, analysis: &AnalysisResult) {
        merge_analysis(&mut self.draft, analysis);
    }
}

impl DiagnosisForm<PrescriptionsStep> {
    pub fn back_to_vitals(self) -> DiagnosisForm<VitalsStep> {
        DiagnosisForm {
            patient_id: self.patient_id,
            draft: self.draft,
            state: VitalsStep,
        }
    }

    /// Build the create request. Blank prescription rows are not sent.
    fn to_request(&self, doctor_id: &str, now: NaiveDateTime) -> NewDiagnosis {
        let draft = &self.draft;
        NewDiagnosis {
            patient_id: self.patient_id.clone(),
            visiting_doctor_id: doctor_id.to_owned(),
            blood_pressure: draft.vitals.blood_pressure.trim().to_owned(),
            spo2: draft.vitals.spo2.trim().to_owned(),
            heart_rate: draft.vitals.heart_rate.trim().to_owned(),
            blood_sugar: draft.vitals.blood_sugar.trim().to_owned(),
            diagnosis_summary: draft.diagnosis_summary.trim().to_owned(),
            tests: draft.tests.clone(),
            uploaded_tests: draft.uploaded_tests.clone(),
            additional_notes: draft.additional_notes.trim().to_owned(),
            prescriptions: draft
                .prescriptions
                .iter()
                .filter(|p| !p.is_blank())
                .cloned()
                .collect(),
            diagnosis_date: now.format("%Y-%m-%d").to_string(),
            diagnosis_time: now.format("%H:%M:%S").to_string(),
        }
    }

    /// Submit the diagnosis on behalf of the logged-in doctor.
    ///
    /// **This method consumes `self`.** On success the form moves to [`Submitted`]. On any
    /// failure the form comes back unchanged inside the [`SubmitError`]:
    ///
    /// - no session: [`CoreError::NotAuthenticated`], and no call is made
    /// - not a doctor: [`CoreError::WrongRole`], no call is made
    /// - `401`: [`CoreError::SessionExpired`], the stored session is cleared
    /// - any other failed call: [`CoreError::Api`]
    pub async fn confirm<A: MedbotApi>(
        self,
        api: &A,
        store: &SessionStore,
        now: NaiveDateTime,
    ) -> Result<DiagnosisForm<Submitted>, SubmitError<Self>> {
        let session = match store.current_as(Role::Doctor) {
            Ok(session) => session,
            Err(err) => return Err(SubmitError::new(self, err)),
        };

        let request = self.to_request(session.user_id(), now);
        match store.check(api.create_diagnosis(session.token(), &request).await) {
            Ok(()) => {
                tracing::info!(
                    patient_id = %self.patient_id,
                    prescriptions = request.prescriptions.len(),
                    "diagnosis submitted"
                );
                Ok(DiagnosisForm {
                    patient_id: self.patient_id,
                    draft: self.draft,
                    state: Submitted { request },
                })
            }
            Err(err) => {
                tracing::error!(patient_id = %self.patient_id, "failed to submit diagnosis: {err}");
                Err(SubmitError::new(self, err))
            }
        }
    }
}

impl DiagnosisForm<Submitted> {
    /// The request the backend accepted.
    pub fn request(&self) -> &NewDiagnosis {
        &self.state.request
    }
}
