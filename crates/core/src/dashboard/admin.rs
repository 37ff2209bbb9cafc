//! Admin dashboard: every registered patient.

use super::{finish, matches_search, DashboardView, DateRange, SortOrder};
use crate::api::MedbotApi;
use crate::constants::NO_PATIENTS_MESSAGE;
use crate::session::SessionStore;
use crate::CoreResult;
use chrono::{NaiveDate, NaiveDateTime};
use medbot_types::Role;
use medbot_wire::{PatientRecord, PatientStatus};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRow {
    pub id: String,
    pub name: String,
    pub aadhar: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub status: Option<PatientStatus>,
    /// Day the patient was registered/admitted.
    pub date: Option<NaiveDate>,
    registered_at: Option<NaiveDateTime>,
}

impl PatientRow {
    pub fn from_record(record: &PatientRecord) -> Self {
        let registered_at = record.registered_at.map(|dt| dt.naive_utc());
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            aadhar: record.aadhar.clone(),
            gender: record.gender.clone(),
            age: record.age,
            status: record.status,
            date: registered_at.map(|dt| dt.date()),
            registered_at,
        }
    }

    pub fn registered_at(&self) -> Option<NaiveDateTime> {
        self.registered_at
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdminQuery {
    /// Matched against name and aadhar.
    pub search: String,
    pub status: Option<PatientStatus>,
    pub range: DateRange,
    pub sort: SortOrder,
}

impl AdminQuery {
    pub fn matches(&self, row: &PatientRow, today: NaiveDate) -> bool {
        matches_search(&self.search, &[Some(row.name.as_str()), row.aadhar.as_deref()])
            && self.status.map_or(true, |status| row.status == Some(status))
            && self.range.contains(row.date, today)
    }

    pub fn apply(&self, rows: &[PatientRow], today: NaiveDate) -> DashboardView<PatientRow> {
        let filtered = rows
            .iter()
            .filter(|row| self.matches(row, today))
            .cloned()
            .collect();
        finish(filtered, self.sort, PatientRow::registered_at, NO_PATIENTS_MESSAGE)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Fetch all patients. Requires a staff session.
pub async fn load_patients<A: MedbotApi>(
    api: &A,
    store: &SessionStore,
) -> CoreResult<Vec<PatientRow>> {
    let session = store.current_as(Role::Admin)?;
    let patients = store.check(api.list_patients(session.token()).await)?;
    tracing::info!(count = patients.len(), "loaded patient list");
    Ok(patients.iter().map(PatientRow::from_record).collect())
}
