//! Diagnosis detail view and inline vitals editing.
//!
//! [`DiagnosisView::from_record`] is the one place that turns a backend record into display
//! strings; every field gets a fallback so a sparse record still renders completely.

use crate::api::MedbotApi;
use crate::constants::{
    NOT_AVAILABLE, NO_ALLERGIES, NO_FAMILY_HISTORY, NO_MEDICAL_HISTORY, NO_NOTES, NO_TESTS,
};
use crate::session::SessionStore;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use medbot_wire::{DiagnosisRecord, Prescription, Vitals, VitalsPatch};

const DISPLAY_DATETIME: &str = "%B %-d, %Y, %I:%M %p";
const DISPLAY_DATE: &str = "%B %-d, %Y";

fn or_default(value: Option<&str>, fallback: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_owned()
}

fn or_na(value: Option<&str>) -> String {
    or_default(value, NOT_AVAILABLE)
}

fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(DISPLAY_DATETIME).to_string()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VitalsDisplay {
    pub blood_pressure: String,
    pub spo2: String,
    pub heart_rate: String,
    pub blood_sugar: String,
}

impl VitalsDisplay {
    pub fn from_vitals(vitals: &Vitals) -> Self {
        Self {
            blood_pressure: or_na(Some(&vitals.blood_pressure)),
            spo2: or_na(Some(&vitals.spo2)),
            heart_rate: or_na(Some(&vitals.heart_rate)),
            blood_sugar: or_na(Some(&vitals.blood_sugar)),
        }
    }
}

/// Display model of one diagnosis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosisView {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub age: String,
    pub gender: String,
    pub doctor_name: String,
    pub department: String,
    pub recorded_on: String,
    pub last_updated: String,
    pub status: String,
    pub vitals: VitalsDisplay,
    pub summary: String,
    pub tests_taken: Vec<String>,
    /// `tests_taken` joined, or a placeholder when none were ordered.
    pub tests_summary: String,
    pub test_results: Vec<String>,
    pub analysis: String,
    pub prescriptions: Vec<Prescription>,
    pub notes: String,
    pub medical_history: String,
    pub allergies: String,
    pub family_history: String,
}

impl DiagnosisView {
    pub fn from_record(record: &DiagnosisRecord) -> Self {
        let recorded_on = match (record.date, record.time) {
            (Some(date), Some(time)) => format_timestamp(date.and_time(time)),
            (Some(date), None) => date.format(DISPLAY_DATE).to_string(),
            (None, _) => NOT_AVAILABLE.to_owned(),
        };
        let last_updated = record
            .updated_at
            .or(record.created_at)
            .map(|dt| format_timestamp(dt.naive_utc()))
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned());
        let tests_summary = if record.tests.is_empty() {
            NO_TESTS.to_owned()
        } else {
            record.tests.join(", ")
        };
        let allergies = if record.allergies.is_empty() {
            NO_ALLERGIES.to_owned()
        } else {
            record.allergies.join(", ")
        };

        Self {
            id: record.id.clone(),
            patient_id: or_na(record.patient_id.as_deref()),
            patient_name: or_na(record.patient_name.as_deref()),
            age: record
                .patient_age
                .map(|age| age.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
            gender: or_na(record.patient_gender.as_deref()),
            doctor_name: or_na(record.doctor_name.as_deref()),
            department: or_na(record.department.as_deref()),
            recorded_on,
            last_updated,
            status: record
                .status
                .map_or(NOT_AVAILABLE, |status| status.label())
                .to_owned(),
            vitals: VitalsDisplay::from_vitals(&record.vitals),
            summary: or_na(record.summary.as_deref()),
            tests_taken: record.tests.clone(),
            tests_summary,
            test_results: record.test_results.clone(),
            analysis: or_na(record.analysis.as_deref()),
            prescriptions: record.prescriptions.clone(),
            notes: or_default(record.notes.as_deref(), NO_NOTES),
            medical_history: or_default(record.medical_history.as_deref(), NO_MEDICAL_HISTORY),
            allergies,
            family_history: or_default(record.family_history.as_deref(), NO_FAMILY_HISTORY),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VitalField {
    BloodPressure,
    Spo2,
    HeartRate,
    BloodSugar,
}

/// A loaded diagnosis with its vitals editor.
///
/// While editing, changes go to a scratch copy; the displayed vitals only change after a
/// successful save.
#[derive(Clone, Debug)]
pub struct DiagnosisDetail {
    view: DiagnosisView,
    vitals: Vitals,
    scratch: Option<Vitals>,
}

impl DiagnosisDetail {
    pub fn from_record(record: &DiagnosisRecord) -> Self {
        Self {
            view: DiagnosisView::from_record(record),
            vitals: record.vitals.clone(),
            scratch: None,
        }
    }

    /// `GET /diagnosis-details/{id}/` for the current session (any role).
    pub async fn load<A: MedbotApi>(
        api: &A,
        store: &SessionStore,
        diagnosis_id: &str,
    ) -> CoreResult<Self> {
        let session = store.current()?;
        let record = store.check(api.diagnosis_detail(session.token(), diagnosis_id).await)?;
        Ok(Self::from_record(&record))
    }

    pub fn view(&self) -> &DiagnosisView {
        &self.view
    }

    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    pub fn is_editing(&self) -> bool {
        self.scratch.is_some()
    }

    pub fn scratch(&self) -> Option<&Vitals> {
        self.scratch.as_ref()
    }

    /// Copy the current vitals into the scratch object. A second call keeps the existing edits.
    pub fn begin_edit(&mut self) {
        if self.scratch.is_none() {
            self.scratch = Some(self.vitals.clone());
        }
    }

    pub fn set_vital(&mut self, field: VitalField, value: impl Into<String>) -> CoreResult<()> {
        let scratch = self
            .scratch
            .as_mut()
            .ok_or_else(|| CoreError::InvalidInput("vitals are not being edited".into()))?;
        let value = value.into();
        match field {
            VitalField::BloodPressure => scratch.blood_pressure = value,
            VitalField::Spo2 => scratch.spo2 = value,
            VitalField::HeartRate => scratch.heart_rate = value,
            VitalField::BloodSugar => scratch.blood_sugar = value,
        }
        Ok(())
    }

    /// Discard the scratch object; displayed vitals are unchanged.
    pub fn cancel_edit(&mut self) {
        self.scratch = None;
    }

    /// `PATCH /update-diagnosis-vitals/{id}/` with the scratch vitals.
    ///
    /// On success the displayed vitals and "last updated" stamp are replaced and edit mode ends.
    /// On failure edit mode and the scratch values are kept.
    pub async fn save_edit<A: MedbotApi>(
        &mut self,
        api: &A,
        store: &SessionStore,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let scratch = self
            .scratch
            .clone()
            .ok_or_else(|| CoreError::InvalidInput("vitals are not being edited".into()))?;
        let session = store.current()?;
        let patch = VitalsPatch::from_vitals(&scratch);

        if let Err(err) = store.check(api.update_vitals(session.token(), &self.view.id, &patch).await) {
            tracing::error!(diagnosis_id = %self.view.id, "failed to update vitals: {err}");
            return Err(err);
        }

        // Show what the backend stored, not the raw input.
        self.vitals = Vitals {
            blood_pressure: patch.blood_pressure.clone(),
            spo2: patch.spo2.to_string(),
            heart_rate: patch.heart_rate.to_string(),
            blood_sugar: patch.blood_sugar.clone(),
        };
        self.view.vitals = VitalsDisplay::from_vitals(&self.vitals);
        self.view.last_updated = format_timestamp(now.naive_utc());
        self.scratch = None;
        tracing::info!(diagnosis_id = %self.view.id, "vitals updated");
        Ok(())
    }
}
