//! Doctor and patient profiles.
//!
//! Responsibilities:
//! - Define the domain-level profile types cached in the session and shown on dashboards
//! - Decode the backend's `DoctorSerializer` / `PatientSerializer` output into them
//!
//! Unknown backend fields are ignored; the serializers expose `__all__` model fields and
//! grow over time.

use crate::lenient::{id_string, opt_date, opt_id_string, opt_int, opt_text, opt_timestamp, text_list};
use crate::{decode_json, WireResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Profile of a doctor, cached in the session after login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: String,
    pub name: String,
    pub department: Option<String>,
    pub qualifications: Vec<String>,
    pub specializations: Vec<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub years_of_experience: Option<i64>,
}

/// Lifecycle status of a patient as reported by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    /// Currently admitted (`active` on the wire).
    Active,
    Discharged,
    Deceased,
    Inactive,
}

impl PatientStatus {
    fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" | "admitted" => Some(PatientStatus::Active),
            "discharged" => Some(PatientStatus::Discharged),
            "deceased" => Some(PatientStatus::Deceased),
            "inactive" => Some(PatientStatus::Inactive),
            _ => None,
        }
    }

    /// Label shown on the admin dashboard.
    pub fn label(self) -> &'static str {
        match self {
            PatientStatus::Active => "Admitted",
            PatientStatus::Discharged => "Discharged",
            PatientStatus::Deceased => "Deceased",
            PatientStatus::Inactive => "Inactive",
        }
    }
}

impl std::str::FromStr for PatientStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| format!("unknown patient status: {s}"))
    }
}

/// Patient demographics and history. Display-only on the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: String,
    pub name: String,
    /// National identifier (aadhar), used for search and patient login.
    pub aadhar: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: Option<String>,
    pub contact_number: Option<String>,
    pub allergies: Vec<String>,
    pub medical_history: Option<String>,
    pub status: Option<PatientStatus>,
    pub department: Option<String>,
    pub registered_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Wire models
// ============================================================================

#[derive(Deserialize)]
struct DoctorWire {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default, deserialize_with = "opt_text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    department: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    department_id: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    qualifications: Vec<String>,
    #[serde(default, deserialize_with = "text_list")]
    specializations: Vec<String>,
    #[serde(default, deserialize_with = "opt_text")]
    email_id: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    contact_number: Option<String>,
    #[serde(default, deserialize_with = "opt_int")]
    years_of_experience: Option<i64>,
}

#[derive(Deserialize)]
struct PatientWire {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default, deserialize_with = "opt_text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    aadhar: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    gender: Option<String>,
    #[serde(default, deserialize_with = "opt_int")]
    age: Option<i64>,
    #[serde(default, deserialize_with = "opt_date")]
    dob: Option<NaiveDate>,
    #[serde(default, deserialize_with = "opt_text")]
    blood_group: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    contact_number: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    allergies: Vec<String>,
    #[serde(default, deserialize_with = "opt_text")]
    medical_history: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    status: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    department: Option<String>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    created_at: Option<DateTime<Utc>>,
}

fn doctor_from_wire(wire: DoctorWire) -> DoctorProfile {
    DoctorProfile {
        id: wire.id,
        name: wire.name.unwrap_or_default(),
        department: wire.department.or(wire.department_id),
        qualifications: wire.qualifications,
        specializations: wire.specializations,
        email: wire.email_id,
        contact_number: wire.contact_number,
        years_of_experience: wire.years_of_experience,
    }
}

fn patient_from_wire(wire: PatientWire) -> PatientRecord {
    PatientRecord {
        id: wire.id,
        name: wire.name.unwrap_or_default(),
        aadhar: wire.aadhar,
        gender: wire.gender,
        age: wire.age,
        date_of_birth: wire.dob,
        blood_group: wire.blood_group,
        contact_number: wire.contact_number,
        allergies: wire.allergies,
        medical_history: wire.medical_history,
        status: wire.status.as_deref().and_then(PatientStatus::from_wire),
        department: wire.department,
        registered_at: wire.created_at,
    }
}

impl DoctorProfile {
    /// Parse `GET /doctors/{id}/`.
    pub fn parse(bytes: &[u8]) -> WireResult<Self> {
        decode_json::<DoctorWire>("doctor profile", bytes).map(doctor_from_wire)
    }
}

impl PatientRecord {
    /// Parse `GET /patients/{id}/`.
    pub fn parse(bytes: &[u8]) -> WireResult<Self> {
        decode_json::<PatientWire>("patient profile", bytes).map(patient_from_wire)
    }

    /// Parse `GET /patients/`.
    pub fn parse_list(bytes: &[u8]) -> WireResult<Vec<Self>> {
        let wires: Vec<PatientWire> = decode_json("patient list", bytes)?;
        Ok(wires.into_iter().map(patient_from_wire).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_doctor_profile() {
        let profile = DoctorProfile::parse(
            br#"{
                "id": 4,
                "name": "Arjun Sharma",
                "department_id": 2,
                "qualifications": ["MD", "MBBS"],
                "specializations": ["ENT"],
                "email_id": "arjun@medbot.in",
                "years_of_experience": 12,
                "profile_photo": null
            }"#,
        )
        .expect("doctor profile should parse");

        assert_eq!(profile.id, "4");
        assert_eq!(profile.name, "Arjun Sharma");
        assert_eq!(profile.department.as_deref(), Some("2"));
        assert_eq!(profile.qualifications, vec!["MD", "MBBS"]);
        assert_eq!(profile.email.as_deref(), Some("arjun@medbot.in"));
        assert_eq!(profile.years_of_experience, Some(12));
    }

    #[test]
    fn test_parse_patient_list_maps_status_and_dates() {
        let patients = PatientRecord::parse_list(
            br#"[
                {"id": 1, "name": "Devon Lane", "aadhar": "214598706321", "gender": "male",
                 "age": 32, "dob": "1993-01-02", "allergies": ["Dust", null],
                 "status": "active", "created_at": "2025-04-28T09:00:00Z"},
                {"id": 2, "name": "Jacob Jones", "status": "discharged"}
            ]"#,
        )
        .expect("patient list should parse");

        assert_eq!(patients.len(), 2);
        assert_eq!(patients[0].status, Some(PatientStatus::Active));
        assert_eq!(patients[0].allergies, vec!["Dust"]);
        assert_eq!(
            patients[0].date_of_birth,
            NaiveDate::from_ymd_opt(1993, 1, 2)
        );
        assert!(patients[0].registered_at.is_some());
        assert_eq!(patients[1].status, Some(PatientStatus::Discharged));
        assert_eq!(patients[1].aadhar, None);
    }

    #[test]
    fn test_patient_status_label() {
        assert_eq!(PatientStatus::Active.label(), "Admitted");
        assert_eq!("Admitted".parse::<PatientStatus>(), Ok(PatientStatus::Active));
    }
}
