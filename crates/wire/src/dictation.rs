//! Wire models for the dictation collaborators.
//!
//! The transcription service answers `{ "transcript": "..." }`. The analysis service answers
//! `{ "result": "<JSON-encoded string>" }`; the inner document is the structured extraction
//! merged into the diagnosis form.

use crate::diagnosis::Prescription;
use crate::lenient::{opt_text, text_list};
use crate::{decode_json, WireResult};
use serde::{Deserialize, Serialize};

/// Response of the transcription endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TranscriptionResponse {
    #[serde(default, deserialize_with = "opt_text")]
    pub transcript: Option<String>,
}

impl TranscriptionResponse {
    pub fn parse(bytes: &[u8]) -> WireResult<Self> {
        decode_json("transcription response", bytes)
    }
}

/// Body posted to the analysis endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest<'a> {
    pub transcript: &'a str,
}

#[derive(Deserialize)]
struct AnalysisEnvelope {
    #[serde(default, deserialize_with = "opt_text")]
    result: Option<String>,
}

/// Structured extraction from a dictated transcript.
///
/// Every field is optional; absent or blank fields leave the form untouched when merged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "opt_text")]
    pub blood_pressure: Option<String>,
    #[serde(
        default,
        rename = "SPo2",
        alias = "spo2",
        alias = "SpO2",
        deserialize_with = "opt_text"
    )]
    pub spo2: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub heart_rate: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub blood_sugar: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub diagnosis_summary: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub additional_notes: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub tests: Vec<String>,
    #[serde(default, deserialize_with = "optional_prescriptions")]
    pub prescriptions: Vec<Prescription>,
}

fn optional_prescriptions<'de, D>(deserializer: D) -> Result<Vec<Prescription>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Prescription>>::deserialize(deserializer)?.unwrap_or_default())
}

impl AnalysisResult {
    /// Decode the analysis envelope and the JSON string it carries.
    ///
    /// Returns `Ok(None)` when the envelope has no `result`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WireError`] if either the envelope or the embedded document is
    /// malformed.
    pub fn from_response(bytes: &[u8]) -> WireResult<Option<Self>> {
        let envelope: AnalysisEnvelope = decode_json("analysis response", bytes)?;
        match envelope.result {
            Some(inner) => decode_json("analysis result", inner.as_bytes()).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WireError;

    #[test]
    fn test_transcription_response_blank_is_none() {
        let parsed = TranscriptionResponse::parse(br#"{"transcript": "   "}"#).unwrap();
        assert_eq!(parsed.transcript, None);
        let parsed = TranscriptionResponse::parse(br#"{}"#).unwrap();
        assert_eq!(parsed.transcript, None);
    }

    #[test]
    fn test_analysis_result_decodes_embedded_string() {
        let body = serde_json::json!({
            "result": serde_json::json!({
                "blood_pressure": "120/80",
                "SPo2": 97,
                "heart_rate": "72",
                "tests": ["cbc test", "X-Ray"],
                "prescriptions": [{"drug": "Salbutamol", "dosage": "200mcg"}]
            }).to_string()
        });
        let bytes = serde_json::to_vec(&body).unwrap();

        let result = AnalysisResult::from_response(&bytes)
            .expect("analysis should decode")
            .expect("result should be present");

        assert_eq!(result.blood_pressure.as_deref(), Some("120/80"));
        assert_eq!(result.spo2.as_deref(), Some("97"));
        assert_eq!(result.heart_rate.as_deref(), Some("72"));
        assert_eq!(result.blood_sugar, None);
        assert_eq!(result.tests, vec!["cbc test", "X-Ray"]);
        assert_eq!(result.prescriptions[0].drug, "Salbutamol");
        assert_eq!(result.prescriptions[0].method, "");
    }

    #[test]
    fn test_analysis_without_result_is_none() {
        let result = AnalysisResult::from_response(br#"{"error": "quota"}"#).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_analysis_with_malformed_result_errors() {
        let err = AnalysisResult::from_response(br#"{"result": "not json"}"#)
            .expect_err("malformed inner JSON should fail");
        assert!(matches!(err, WireError::Translation(_)));
    }
}
