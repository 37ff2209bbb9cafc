//! Diagnosis records, vitals patches and the composite create payload.
//!
//! Responsibilities:
//! - Define the domain-level diagnosis types (`DiagnosisRecord`, `Vitals`, `Prescription`)
//! - Decode list and detail responses, accepting the field spellings the backend has used
//!   over time (`uploadedTests` / `test_results`, nested or flat patient references)
//! - Encode the `PATCH /update-diagnosis-vitals/{id}/` and `POST /create-full-diagnosis/`
//!   bodies with the backend's field names and numeric expectations

use crate::lenient::{
    id_string, opt_date, opt_id_string, opt_int, opt_text, opt_time, opt_timestamp, text_list,
};
use crate::{decode_json, WireResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Clinical status of a diagnosis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisStatus {
    Ongoing,
    Completed,
    Cancelled,
}

impl DiagnosisStatus {
    fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ongoing" => Some(DiagnosisStatus::Ongoing),
            "completed" => Some(DiagnosisStatus::Completed),
            "cancelled" | "canceled" => Some(DiagnosisStatus::Cancelled),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DiagnosisStatus::Ongoing => "Ongoing",
            DiagnosisStatus::Completed => "Completed",
            DiagnosisStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::str::FromStr for DiagnosisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| format!("unknown diagnosis status: {s}"))
    }
}

/// Vital signs as entered or displayed. An empty string means "not recorded".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vitals {
    pub blood_pressure: String,
    pub spo2: String,
    pub heart_rate: String,
    pub blood_sugar: String,
}

/// One prescription line. Identified only by its position in the diagnosis.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    #[serde(default)]
    pub drug: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub method: String,
}

impl Prescription {
    pub fn is_blank(&self) -> bool {
        self.drug.trim().is_empty()
            && self.dosage.trim().is_empty()
            && self.duration.trim().is_empty()
            && self.method.trim().is_empty()
    }
}

/// A single clinical encounter as returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosisRecord {
    pub id: String,
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub patient_age: Option<i64>,
    pub patient_gender: Option<String>,
    pub doctor_id: Option<String>,
    pub doctor_name: Option<String>,
    pub department: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub vitals: Vitals,
    pub summary: Option<String>,
    pub tests: Vec<String>,
    pub test_results: Vec<String>,
    pub analysis: Option<String>,
    pub notes: Option<String>,
    pub prescriptions: Vec<Prescription>,
    pub status: Option<DiagnosisStatus>,
    pub medical_history: Option<String>,
    pub allergies: Vec<String>,
    pub family_history: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DiagnosisRecord {
    /// Combined date and time used to order records. Missing time counts as midnight.
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        self.date
            .map(|date| date.and_time(self.time.unwrap_or(NaiveTime::MIN)))
            .or_else(|| self.created_at.map(|dt| dt.naive_utc()))
    }

    /// Parse `GET /diagnosis-details/{id}/`.
    pub fn parse(bytes: &[u8]) -> WireResult<Self> {
        decode_json::<DiagnosisWire>("diagnosis record", bytes).map(diagnosis_from_wire)
    }

    /// Parse `GET /doctors/{id}/diagnoses/` and `GET /patients/{id}/diagnoses/`.
    pub fn parse_list(bytes: &[u8]) -> WireResult<Vec<Self>> {
        let wires: Vec<DiagnosisWire> = decode_json("diagnosis list", bytes)?;
        Ok(wires.into_iter().map(diagnosis_from_wire).collect())
    }
}

/// Body of `PATCH /update-diagnosis-vitals/{id}/`.
///
/// SPo2 and heart rate are integer columns on the backend; blood pressure and sugar are text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VitalsPatch {
    pub blood_pressure: String,
    #[serde(rename = "SPo2")]
    pub spo2: i64,
    pub heart_rate: i64,
    pub blood_sugar: String,
}

impl VitalsPatch {
    /// Coerce edited vitals into the backend's types. Unparseable integers become `0`.
    pub fn from_vitals(vitals: &Vitals) -> Self {
        Self {
            blood_pressure: vitals.blood_pressure.trim().to_owned(),
            spo2: parse_int_prefix(&vitals.spo2).unwrap_or(0),
            heart_rate: parse_int_prefix(&vitals.heart_rate).unwrap_or(0),
            blood_sugar: vitals.blood_sugar.trim().to_owned(),
        }
    }
}

/// Composite body of `POST /create-full-diagnosis/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewDiagnosis {
    pub patient_id: String,
    pub visiting_doctor_id: String,
    pub blood_pressure: String,
    #[serde(rename = "SPo2")]
    pub spo2: String,
    pub heart_rate: String,
    pub blood_sugar: String,
    pub diagnosis_summary: String,
    pub tests: Vec<String>,
    #[serde(rename = "uploadedTests")]
    pub uploaded_tests: Vec<String>,
    pub additional_notes: String,
    pub prescriptions: Vec<Prescription>,
    /// `YYYY-MM-DD`
    pub diagnosis_date: String,
    /// `HH:MM:SS`, 24-hour
    pub diagnosis_time: String,
}

/// Integer prefix of a string after trimming: `"98%"` is 98, `"abc"` is `None`.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

// ============================================================================
// Wire model
// ============================================================================

#[derive(Deserialize)]
struct DiagnosisWire {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default, alias = "patient", deserialize_with = "opt_id_string")]
    patient_id: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    patient_name: Option<String>,
    #[serde(default, deserialize_with = "opt_int")]
    age: Option<i64>,
    #[serde(default, deserialize_with = "opt_text")]
    gender: Option<String>,
    #[serde(default, alias = "doctor_id", deserialize_with = "opt_id_string")]
    visiting_doctor_id: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    doctor_name: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    department: Option<String>,
    #[serde(default, deserialize_with = "opt_date")]
    diagnosis_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "opt_time")]
    diagnosis_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "opt_text")]
    blood_pressure: Option<String>,
    #[serde(default, rename = "SPo2", alias = "spo2", deserialize_with = "opt_text")]
    spo2: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    heart_rate: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    blood_sugar: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    diagnosis_summary: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    tests: Vec<String>,
    #[serde(
        default,
        rename = "uploadedTests",
        alias = "test_results",
        alias = "uploaded_tests",
        deserialize_with = "text_list"
    )]
    uploaded_tests: Vec<String>,
    #[serde(default, deserialize_with = "opt_text")]
    analysis: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    additional_notes: Option<String>,
    #[serde(default, deserialize_with = "prescription_list")]
    prescriptions: Vec<Prescription>,
    #[serde(default, deserialize_with = "opt_text")]
    status: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    medical_history: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    allergies: Vec<String>,
    #[serde(default, deserialize_with = "opt_text")]
    family_history: Option<String>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    updated_at: Option<DateTime<Utc>>,
}

fn prescription_list<'de, D>(deserializer: D) -> Result<Vec<Prescription>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Prescription>>::deserialize(deserializer)?.unwrap_or_default())
}

fn diagnosis_from_wire(wire: DiagnosisWire) -> DiagnosisRecord {
    DiagnosisRecord {
        id: wire.id,
        patient_id: wire.patient_id,
        patient_name: wire.patient_name,
        patient_age: wire.age,
        patient_gender: wire.gender,
        doctor_id: wire.visiting_doctor_id,
        doctor_name: wire.doctor_name,
        department: wire.department,
        date: wire.diagnosis_date,
        time: wire.diagnosis_time,
        vitals: Vitals {
            blood_pressure: wire.blood_pressure.unwrap_or_default(),
            spo2: wire.spo2.unwrap_or_default(),
            heart_rate: wire.heart_rate.unwrap_or_default(),
            blood_sugar: wire.blood_sugar.unwrap_or_default(),
        },
        summary: wire.diagnosis_summary,
        tests: wire.tests,
        test_results: wire.uploaded_tests,
        analysis: wire.analysis,
        notes: wire.additional_notes,
        prescriptions: wire.prescriptions,
        status: wire.status.as_deref().and_then(DiagnosisStatus::from_wire),
        medical_history: wire.medical_history,
        allergies: wire.allergies,
        family_history: wire.family_history,
        created_at: wire.created_at,
        updated_at: wire.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &[u8] = br#"{
        "id": 165,
        "patient_id": 6,
        "patient_name": "Suresh Ramakrishnan",
        "visiting_doctor_id": 4,
        "diagnosis_date": "2025-04-28",
        "diagnosis_time": "17:36:00",
        "blood_pressure": "130/85",
        "SPo2": 98,
        "heart_rate": 76,
        "blood_sugar": "",
        "diagnosis_summary": "Acute Asthma Episode",
        "tests": ["CBC Test", "Influenza Test"],
        "uploadedTests": ["cbc98425.pdf"],
        "prescriptions": [
            {"drug": "Paracetamol", "dosage": "650mg", "duration": "5 days", "method": "Twice a day after food"}
        ],
        "status": "ongoing",
        "updated_at": "2025-04-28T17:40:00Z"
    }"#;

    #[test]
    fn test_parse_detail_normalises_backend_names() {
        let record = DiagnosisRecord::parse(DETAIL).expect("detail should parse");

        assert_eq!(record.id, "165");
        assert_eq!(record.patient_id.as_deref(), Some("6"));
        assert_eq!(record.doctor_id.as_deref(), Some("4"));
        assert_eq!(record.vitals.spo2, "98");
        assert_eq!(record.vitals.heart_rate, "76");
        assert_eq!(record.vitals.blood_sugar, "");
        assert_eq!(record.test_results, vec!["cbc98425.pdf"]);
        assert_eq!(record.prescriptions.len(), 1);
        assert_eq!(record.status, Some(DiagnosisStatus::Ongoing));
        assert_eq!(
            record.recorded_at(),
            NaiveDate::from_ymd_opt(2025, 4, 28).and_then(|d| d.and_hms_opt(17, 36, 0))
        );
    }

    #[test]
    fn test_parse_list_accepts_nested_patient_and_null_lists() {
        let records = DiagnosisRecord::parse_list(
            br#"[{"id": "DGN-1", "patient": {"id": 9, "name": "X"}, "tests": null, "prescriptions": null}]"#,
        )
        .expect("list should parse");
        assert_eq!(records[0].patient_id.as_deref(), Some("9"));
        assert!(records[0].tests.is_empty());
        assert!(records[0].prescriptions.is_empty());
        assert_eq!(records[0].recorded_at(), None);
    }

    #[test]
    fn test_vitals_patch_coerces_integers() {
        let patch = VitalsPatch::from_vitals(&Vitals {
            blood_pressure: " 120/80 ".into(),
            spo2: "97%".into(),
            heart_rate: "fast".into(),
            blood_sugar: "110".into(),
        });
        assert_eq!(patch.blood_pressure, "120/80");
        assert_eq!(patch.spo2, 97);
        assert_eq!(patch.heart_rate, 0);

        let json = serde_json::to_value(&patch).expect("patch should serialise");
        assert_eq!(json["SPo2"], 97);
        assert_eq!(json["heart_rate"], 0);
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("72"), Some(72));
        assert_eq!(parse_int_prefix(" 72 bpm"), Some(72));
        assert_eq!(parse_int_prefix("-3"), Some(-3));
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("bpm 72"), None);
    }

    #[test]
    fn test_new_diagnosis_uses_backend_field_names() {
        let body = NewDiagnosis {
            patient_id: "6".into(),
            visiting_doctor_id: "4".into(),
            blood_pressure: "130".into(),
            spo2: "98".into(),
            heart_rate: "76".into(),
            blood_sugar: String::new(),
            diagnosis_summary: "Asthma".into(),
            tests: vec!["CBC Test".into()],
            uploaded_tests: vec!["cbc.pdf".into()],
            additional_notes: String::new(),
            prescriptions: vec![],
            diagnosis_date: "2025-05-02".into(),
            diagnosis_time: "10:15:00".into(),
        };
        let json = serde_json::to_value(&body).expect("body should serialise");
        assert_eq!(json["SPo2"], "98");
        assert_eq!(json["uploadedTests"][0], "cbc.pdf");
        assert_eq!(json["visiting_doctor_id"], "4");
    }
}
