//! Merging dictation analysis into a diagnosis draft.
//!
//! Scalars overwrite only when the analysis supplies a non-blank value. Test names are matched
//! case-insensitively against [`AVAILABLE_TESTS`] and unioned with the current selection.
//! Prescriptions are replaced wholesale when the analysis has any. Merging the same result twice
//! leaves the draft as merging it once.

use crate::constants::AVAILABLE_TESTS;
use crate::forms::diagnosis::DiagnosisDraft;
use medbot_wire::AnalysisResult;

/// Canonical spelling of a lab test, if it is in the vocabulary.
pub fn canonical_test_name(name: &str) -> Option<&'static str> {
    let name = name.trim();
    AVAILABLE_TESTS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(name))
}

fn overwrite(field: &mut String, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        *field = value.to_owned();
    }
}

pub fn merge_analysis(draft: &mut DiagnosisDraft, analysis: &AnalysisResult) {
    overwrite(&mut draft.vitals.blood_pressure, analysis.blood_pressure.as_deref());
    overwrite(&mut draft.vitals.spo2, analysis.spo2.as_deref());
    overwrite(&mut draft.vitals.heart_rate, analysis.heart_rate.as_deref());
    overwrite(&mut draft.vitals.blood_sugar, analysis.blood_sugar.as_deref());
    overwrite(&mut draft.diagnosis_summary, analysis.diagnosis_summary.as_deref());
    overwrite(&mut draft.additional_notes, analysis.additional_notes.as_deref());

    for name in &analysis.tests {
        match canonical_test_name(name) {
            Some(canonical) if !draft.tests.iter().any(|t| t == canonical) => {
                draft.tests.push(canonical.to_owned());
            }
            Some(_) => {}
            None => tracing::debug!(test = %name, "ignoring unknown test from analysis"),
        }
    }

    if !analysis.prescriptions.is_empty() {
        draft.prescriptions = analysis.prescriptions.clone();
    }
}
