//! Patient dashboard: the logged-in patient's medical records.

use super::{distinct_values, finish, matches_choice, DashboardView, DateRange, SortOrder};
use crate::api::MedbotApi;
use crate::constants::NO_MEDICAL_RECORDS_MESSAGE;
use crate::session::SessionStore;
use crate::CoreResult;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use medbot_types::Role;
use medbot_wire::{DiagnosisRecord, DiagnosisStatus};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MedicalRecordRow {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub doctor: Option<String>,
    pub department: Option<String>,
    pub diagnosis: Option<String>,
    pub status: Option<DiagnosisStatus>,
    recorded_at: Option<NaiveDateTime>,
}

impl MedicalRecordRow {
    pub fn from_record(record: &DiagnosisRecord) -> Self {
        Self {
            id: record.id.clone(),
            date: record.date,
            time: record.time,
            doctor: record.doctor_name.clone(),
            department: record.department.clone(),
            diagnosis: record.summary.clone(),
            status: record.status,
            recorded_at: record.recorded_at(),
        }
    }

    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        self.recorded_at
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientHistoryQuery {
    pub doctor: Option<String>,
    pub department: Option<String>,
    pub range: DateRange,
    pub sort: SortOrder,
}

impl PatientHistoryQuery {
    pub fn matches(&self, row: &MedicalRecordRow, today: NaiveDate) -> bool {
        matches_choice(self.doctor.as_deref(), row.doctor.as_deref())
            && matches_choice(self.department.as_deref(), row.department.as_deref())
            && self.range.contains(row.date, today)
    }

    pub fn apply(
        &self,
        rows: &[MedicalRecordRow],
        today: NaiveDate,
    ) -> DashboardView<MedicalRecordRow> {
        let filtered = rows
            .iter()
            .filter(|row| self.matches(row, today))
            .cloned()
            .collect();
        finish(
            filtered,
            self.sort,
            MedicalRecordRow::recorded_at,
            NO_MEDICAL_RECORDS_MESSAGE,
        )
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub fn doctor_options(rows: &[MedicalRecordRow]) -> Vec<String> {
    distinct_values(rows.iter().map(|row| row.doctor.as_deref()))
}

pub fn department_options(rows: &[MedicalRecordRow]) -> Vec<String> {
    distinct_values(rows.iter().map(|row| row.department.as_deref()))
}

/// Fetch the logged-in patient's diagnoses.
pub async fn load_patient_history<A: MedbotApi>(
    api: &A,
    store: &SessionStore,
) -> CoreResult<Vec<MedicalRecordRow>> {
    let session = store.current_as(Role::Patient)?;
    let records =
        store.check(api.patient_diagnoses(session.token(), session.user_id()).await)?;
    tracing::info!(count = records.len(), "loaded medical history");
    Ok(records.iter().map(MedicalRecordRow::from_record).collect())
}
