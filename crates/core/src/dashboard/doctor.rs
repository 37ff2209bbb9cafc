//! Doctor dashboard: the logged-in doctor's diagnoses.

use super::{distinct_values, finish, matches_choice, matches_search, DashboardView, DateRange, SortOrder};
use crate::api::MedbotApi;
use crate::constants::{NO_DIAGNOSES_MESSAGE, UNKNOWN_PATIENT};
use crate::roster::resolve_patient_names;
use crate::session::SessionStore;
use crate::CoreResult;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use medbot_types::Role;
use medbot_wire::{DiagnosisRecord, DiagnosisStatus};
use std::collections::HashSet;

/// One table row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosisRow {
    pub id: String,
    pub patient_id: Option<String>,
    pub patient_name: String,
    pub diagnosis: Option<String>,
    pub status: Option<DiagnosisStatus>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    recorded_at: Option<NaiveDateTime>,
}

impl DiagnosisRow {
    pub fn from_record(record: &DiagnosisRecord) -> Self {
        Self {
            id: record.id.clone(),
            patient_id: record.patient_id.clone(),
            patient_name: record
                .patient_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_PATIENT.to_owned()),
            diagnosis: record.summary.clone(),
            status: record.status,
            date: record.date,
            time: record.time,
            recorded_at: record.recorded_at(),
        }
    }

    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        self.recorded_at
    }
}

/// Search, filters and sort order of the doctor dashboard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DoctorQuery {
    /// Matched against patient name, patient id and record id.
    pub search: String,
    pub diagnosis: Option<String>,
    pub status: Option<DiagnosisStatus>,
    pub range: DateRange,
    pub sort: SortOrder,
}

impl DoctorQuery {
    pub fn matches(&self, row: &DiagnosisRow, today: NaiveDate) -> bool {
        matches_search(
            &self.search,
            &[
                Some(row.patient_name.as_str()),
                row.patient_id.as_deref(),
                Some(row.id.as_str()),
            ],
        ) && matches_choice(self.diagnosis.as_deref(), row.diagnosis.as_deref())
            && self.status.map_or(true, |status| row.status == Some(status))
            && self.range.contains(row.date, today)
    }

    pub fn apply(&self, rows: &[DiagnosisRow], today: NaiveDate) -> DashboardView<DiagnosisRow> {
        let filtered = rows
            .iter()
            .filter(|row| self.matches(row, today))
            .cloned()
            .collect();
        finish(filtered, self.sort, DiagnosisRow::recorded_at, NO_DIAGNOSES_MESSAGE)
    }

    /// "All Records": latest first, every filter cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Summary cards shown above the table. Computed over the unfiltered list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DoctorStats {
    pub patients: usize,
    pub ongoing: usize,
    pub completed: usize,
}

impl DoctorStats {
    pub fn from_rows(rows: &[DiagnosisRow]) -> Self {
        let patients: HashSet<&str> = rows
            .iter()
            .map(|row| row.patient_id.as_deref().unwrap_or(row.patient_name.as_str()))
            .collect();
        let count = |status: DiagnosisStatus| rows.iter().filter(|row| row.status == Some(status)).count();

        Self {
            patients: patients.len(),
            ongoing: count(DiagnosisStatus::Ongoing),
            completed: count(DiagnosisStatus::Completed),
        }
    }
}

/// Options for the diagnosis filter.
pub fn diagnosis_options(rows: &[DiagnosisRow]) -> Vec<String> {
    distinct_values(rows.iter().map(|row| row.diagnosis.as_deref()))
}

/// Fetch the logged-in doctor's diagnoses and resolve missing patient names.
pub async fn load_doctor_dashboard<A: MedbotApi>(
    api: &A,
    store: &SessionStore,
) -> CoreResult<Vec<DiagnosisRow>> {
    let session = store.current_as(Role::Doctor)?;
    let mut records =
        store.check(api.doctor_diagnoses(session.token(), session.user_id()).await)?;

    let unnamed: Vec<String> = records
        .iter()
        .filter(|r| r.patient_name.is_none())
        .filter_map(|r| r.patient_id.clone())
        .collect();
    if !unnamed.is_empty() {
        let names = resolve_patient_names(api, session.token(), unnamed).await;
        for record in records.iter_mut().filter(|r| r.patient_name.is_none()) {
            record.patient_name = record
                .patient_id
                .as_ref()
                .and_then(|id| names.get(id))
                .cloned();
        }
    }

    tracing::info!(count = records.len(), "loaded doctor dashboard");
    Ok(records.iter().map(DiagnosisRow::from_record).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::testing::{diagnosis, patient, FakeApi, Failure};
    use crate::CoreError;
    use medbot_types::NonEmptyText;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).expect("valid date")
    }

    fn row(id: &str, patient: &str, summary: &str, status: DiagnosisStatus, d: u32) -> DiagnosisRow {
        let mut record = diagnosis(id);
        record.patient_id = Some(format!("P-{patient}"));
        record.patient_name = Some(patient.to_owned());
        record.summary = Some(summary.to_owned());
        record.status = Some(status);
        record.date = Some(day(d));
        record.time = NaiveTime::from_hms_opt(10, 0, 0);
        DiagnosisRow::from_record(&record)
    }

    fn rows() -> Vec<DiagnosisRow> {
        vec![
            row("1", "Devon Lane", "Asthma", DiagnosisStatus::Ongoing, 1),
            row("2", "Jacob Jones", "Influenza", DiagnosisStatus::Completed, 5),
            row("3", "Devon Lane", "Asthma", DiagnosisStatus::Completed, 6),
            row("4", "Kristin Watson", "Asthma", DiagnosisStatus::Cancelled, 7),
        ]
    }

    fn ids(view: &DashboardView<DiagnosisRow>) -> Vec<&str> {
        view.rows().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let today = day(7);
        let query = DoctorQuery {
            diagnosis: Some("asthma".into()),
            status: Some(DiagnosisStatus::Completed),
            ..DoctorQuery::default()
        };
        assert_eq!(ids(&query.apply(&rows(), today)), vec!["3"]);

        let query = DoctorQuery {
            search: "devon".into(),
            range: DateRange::ThisWeek,
            ..DoctorQuery::default()
        };
        assert_eq!(ids(&query.apply(&rows(), today)), vec!["3"]);

        let query = DoctorQuery {
            search: "devon".into(),
            status: Some(DiagnosisStatus::Cancelled),
            ..DoctorQuery::default()
        };
        assert!(query.apply(&rows(), today).is_empty());
    }

    #[test]
    fn test_sort_orders_reverse_each_other() {
        let mut query = DoctorQuery::default();
        let latest = ids(&query.apply(&rows(), day(7))).join(",");
        assert_eq!(latest, "4,3,2,1");

        query.sort = SortOrder::Oldest;
        assert_eq!(ids(&query.apply(&rows(), day(7))), vec!["1", "2", "3", "4"]);

        query.reset();
        assert_eq!(query, DoctorQuery::default());
    }

    #[test]
    fn test_stats_and_options() {
        let stats = DoctorStats::from_rows(&rows());
        assert_eq!(
            stats,
            DoctorStats {
                patients: 3,
                ongoing: 1,
                completed: 2
            }
        );
        assert_eq!(diagnosis_options(&rows()), vec!["Asthma", "Influenza"]);
    }

    #[test]
    fn test_no_records_is_empty_state() {
        let view = DoctorQuery::default().apply(&[], day(7));
        assert_eq!(
            view,
            DashboardView::Empty {
                message: NO_DIAGNOSES_MESSAGE
            }
        );
    }

    fn doctor_store(dir: &TempDir) -> SessionStore {
        let store = SessionStore::new(dir.path().join("session.json"));
        let session = Session::new(
            NonEmptyText::new("tok").unwrap(),
            Role::Doctor,
            NonEmptyText::new("4").unwrap(),
        );
        store.save(&session).expect("save session");
        store
    }

    #[tokio::test]
    async fn test_load_resolves_missing_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = doctor_store(&temp_dir);

        let mut named = diagnosis("10");
        named.patient_id = Some("1".into());
        named.patient_name = Some("Devon Lane".into());
        let mut unnamed = diagnosis("11");
        unnamed.patient_id = Some("2".into());
        let mut missing = diagnosis("12");
        missing.patient_id = Some("3".into());

        let api = FakeApi {
            diagnoses: vec![named, unnamed, missing],
            patients: vec![patient("2", "Jacob Jones")],
            ..FakeApi::default()
        };

        let rows = load_doctor_dashboard(&api, &store).await.expect("load");
        let names: Vec<_> = rows.iter().map(|r| r.patient_name.as_str()).collect();
        assert_eq!(names, vec!["Devon Lane", "Jacob Jones", UNKNOWN_PATIENT]);
        assert!(api.calls().contains(&"doctor_diagnoses 4".to_string()));
    }

    #[tokio::test]
    async fn test_load_clears_session_on_401() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = doctor_store(&temp_dir);
        let api = FakeApi {
            fail: Some(Failure::Unauthorized),
            ..FakeApi::default()
        };

        let err = load_doctor_dashboard(&api, &store)
            .await
            .expect_err("401 should fail the load");
        assert!(matches!(err, CoreError::SessionExpired));
        assert!(store.load().expect("load").is_none());
    }
}
