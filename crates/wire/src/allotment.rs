//! Admission (allotment) payloads.
//!
//! Field names follow the backend `Patient` and `Rooms` models so the allotment endpoint can
//! create or match both rows from one request.

use serde::{Deserialize, Serialize};

/// First step of the admission wizard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default, rename = "aadhar", alias = "aadhar_number")]
    pub aadhar_number: String,
    #[serde(default)]
    pub gender: String,
    /// Date of birth as entered (`YYYY-MM-DD`).
    #[serde(default)]
    pub dob: String,
}

/// Second step of the admission wizard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationDetails {
    #[serde(default, rename = "ward_type", alias = "ward")]
    pub ward: String,
    #[serde(default, rename = "floor_number", alias = "floor")]
    pub floor: String,
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub bed_number: String,
}

/// Body of `POST /allotments/create/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdmissionRequest {
    pub patient: PatientDetails,
    pub allocation: AllocationDetails,
    /// `YYYY-MM-DD`
    pub admission_date: String,
    /// `HH:MM:SS`, 24-hour
    pub admission_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_request_field_names() {
        let request = AdmissionRequest {
            patient: PatientDetails {
                name: "Devon Lane".into(),
                aadhar_number: "214598706321".into(),
                ..PatientDetails::default()
            },
            allocation: AllocationDetails {
                ward: "general".into(),
                floor: "2".into(),
                room_number: "204".into(),
                bed_number: "1".into(),
            },
            admission_date: "2025-04-28".into(),
            admission_time: "09:30:00".into(),
        };

        let json = serde_json::to_value(&request).expect("request should serialise");
        assert_eq!(json["patient"]["aadhar"], "214598706321");
        assert_eq!(json["allocation"]["ward_type"], "general");
        assert_eq!(json["allocation"]["floor_number"], "2");
    }

    #[test]
    fn test_allocation_accepts_short_names() {
        let allocation: AllocationDetails =
            serde_json::from_str(r#"{"ward": "private", "floor": "3", "room_number": "301"}"#)
                .expect("short names should deserialize");
        assert_eq!(allocation.ward, "private");
        assert_eq!(allocation.floor, "3");
        assert_eq!(allocation.bed_number, "");
    }
}
