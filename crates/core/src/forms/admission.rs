//! Patient admission wizard (staff only).

use super::sealed::Editable;
use crate::api::MedbotApi;
use crate::error::SubmitError;
use crate::session::SessionStore;
use crate::CoreError;
use chrono::NaiveDateTime;
use medbot_types::Role;
use medbot_wire::{AdmissionRequest, AllocationDetails, PatientDetails};
use serde::Deserialize;

/// Both steps' data as read from a `--draft` file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdmissionDraft {
    pub patient: PatientDetails,
    pub allocation: AllocationDetails,
}

// ============================================================================
// TYPE-STATE MARKERS
// ============================================================================

#[derive(Clone, Copy, Debug)]
pub struct PatientDetailsStep;

#[derive(Clone, Copy, Debug)]
pub struct AllocationStep;

#[derive(Clone, Debug)]
pub struct Admitted {
    request: AdmissionRequest,
}

impl Editable for PatientDetailsStep {}
impl Editable for AllocationStep {}

// ============================================================================
// ADMISSION FORM
// ============================================================================

#[derive(Clone, Debug)]
pub struct AdmissionForm<S> {
    patient: PatientDetails,
    allocation: AllocationDetails,
    state: S,
}

impl Default for AdmissionForm<PatientDetailsStep> {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionForm<PatientDetailsStep> {
    pub fn new() -> Self {
        Self::from_draft(AdmissionDraft::default())
    }

    pub fn from_draft(draft: AdmissionDraft) -> Self {
        Self {
            patient: draft.patient,
            allocation: draft.allocation,
            state: PatientDetailsStep,
        }
    }

    pub fn patient_mut(&mut self) -> &mut PatientDetails {
        &mut self.patient
    }

    pub fn next(self) -> AdmissionForm<AllocationStep> {
        AdmissionForm {
            patient: self.patient,
            allocation: self.allocation,
            state: AllocationStep,
        }
    }
}

impl<S> AdmissionForm<S> {
    pub fn patient(&self) -> &PatientDetails {
        &self.patient
    }

    pub fn allocation(&self) -> &AllocationDetails {
        &self.allocation
    }
}

impl<S: Editable> AdmissionForm<S> {
    /// Pick a room; the bed is cleared because beds are numbered per room.
    pub fn select_room(&mut self, room_number: impl Into<String>) {
        self.allocation.room_number = room_number.into();
        self.allocation.bed_number.clear();
    }
}

impl AdmissionForm<AllocationStep> {
    pub fn allocation_mut(&mut self) -> &mut AllocationDetails {
        &mut self.allocation
    }

    pub fn back(self) -> AdmissionForm<PatientDetailsStep> {
        AdmissionForm {
            patient: self.patient,
            allocation: self.allocation,
            state: PatientDetailsStep,
        }
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let p = &self.patient;
        let a = &self.allocation;
        [
            ("name", &p.name),
            ("aadhar number", &p.aadhar_number),
            ("ward", &a.ward),
            ("room number", &a.room_number),
            ("bed number", &a.bed_number),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| label)
        .collect()
    }

    /// Admit the patient. Requires a staff session.
    ///
    /// **This method consumes `self`.** The wizard is handed back unchanged on failure,
    /// including when a required field is blank (no call is made in that case).
    pub async fn submit<A: MedbotApi>(
        self,
        api: &A,
        store: &SessionStore,
        now: NaiveDateTime,
    ) -> Result<AdmissionForm<Admitted>, SubmitError<Self>> {
        let session = match store.current_as(Role::Admin) {
            Ok(session) => session,
            Err(err) => return Err(SubmitError::new(self, err)),
        };

        let missing = self.missing_fields();
        if !missing.is_empty() {
            let err = CoreError::InvalidInput(format!("missing {}", missing.join(", ")));
            return Err(SubmitError::new(self, err));
        }

        let request = AdmissionRequest {
            patient: self.patient.clone(),
            allocation: self.allocation.clone(),
            admission_date: now.format("%Y-%m-%d").to_string(),
            admission_time: now.format("%H:%M:%S").to_string(),
        };

        match store.check(api.create_admission(session.token(), &request).await) {
            Ok(()) => {
                tracing::info!(ward = %request.allocation.ward, room = %request.allocation.room_number, "patient admitted");
                Ok(AdmissionForm {
                    patient: self.patient,
                    allocation: self.allocation,
                    state: Admitted { request },
                })
            }
            Err(err) => {
                tracing::error!("failed to admit patient: {err}");
                Err(SubmitError::new(self, err))
            }
        }
    }
}

impl AdmissionForm<Admitted> {
    pub fn request(&self) -> &AdmissionRequest {
        &self.state.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::testing::FakeApi;
    use chrono::NaiveDate;
    use medbot_types::NonEmptyText;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 28)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("valid timestamp")
    }

    fn staff_store(dir: &TempDir) -> SessionStore {
        let store = SessionStore::new(dir.path().join("session.json"));
        let session = Session::new(
            NonEmptyText::new("tok").unwrap(),
            Role::Admin,
            NonEmptyText::new("1").unwrap(),
        );
        store.save(&session).expect("save session");
        store
    }

    fn filled() -> AdmissionForm<AllocationStep> {
        let mut form = AdmissionForm::new();
        let patient = form.patient_mut();
        patient.name = "Devon Lane".into();
        patient.aadhar_number = "214598706321".into();
        patient.gender = "male".into();

        let mut form = form.next();
        let allocation = form.allocation_mut();
        allocation.ward = "general".into();
        allocation.floor = "2".into();
        form.select_room("204");
        form.allocation_mut().bed_number = "1".into();
        form
    }

    #[test]
    fn test_back_keeps_both_steps() {
        let form = filled().back();
        assert_eq!(form.patient().name, "Devon Lane");
        assert_eq!(form.allocation().room_number, "204");

        let mut form = form.next();
        form.select_room("205");
        assert_eq!(form.allocation().bed_number, "");
    }

    #[tokio::test]
    async fn test_submit_posts_request() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = staff_store(&temp_dir);
        let api = FakeApi::default();

        let admitted = filled()
            .submit(&api, &store, now())
            .await
            .expect("admission should succeed");

        assert_eq!(admitted.request().admission_date, "2025-04-28");
        assert_eq!(admitted.request().admission_time, "09:30:00");
        assert_eq!(api.admissions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_rejects_blank_fields_without_calling() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = staff_store(&temp_dir);
        let api = FakeApi::default();
        let mut form = filled();
        form.allocation_mut().bed_number.clear();

        let rejected = form
            .submit(&api, &store, now())
            .await
            .expect_err("missing bed should fail");

        assert!(matches!(&rejected.error, CoreError::InvalidInput(msg) if msg.contains("bed number")));
        assert_eq!(rejected.form.patient().name, "Devon Lane");
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_requires_staff() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = SessionStore::new(temp_dir.path().join("session.json"));
        let api = FakeApi::default();

        let rejected = filled()
            .submit(&api, &store, now())
            .await
            .expect_err("no session");
        assert!(rejected.is_not_authenticated());
    }
}
