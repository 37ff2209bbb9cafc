//! Concurrent patient-name lookup for dashboards.

use crate::api::MedbotApi;
use crate::constants::{PROFILE_FETCH_CONCURRENCY, UNKNOWN_PATIENT};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;

/// Resolve display names for a set of patient ids.
///
/// Lookups run concurrently, at most [`PROFILE_FETCH_CONCURRENCY`] at a time, and complete in
/// any order. A failed lookup maps its id to [`UNKNOWN_PATIENT`] without affecting the others.
/// Duplicate ids are fetched once.
pub async fn resolve_patient_names<A, I>(api: &A, token: &str, ids: I) -> HashMap<String, String>
where
    A: MedbotApi,
    I: IntoIterator<Item = String>,
{
    let mut unique: Vec<String> = ids.into_iter().collect();
    unique.sort();
    unique.dedup();

    stream::iter(unique)
        .map(|id| async move {
            let name = match api.patient_profile(token, &id).await {
                Ok(profile) if !profile.name.trim().is_empty() => profile.name,
                Ok(_) => UNKNOWN_PATIENT.to_owned(),
                Err(err) => {
                    tracing::warn!(patient_id = %id, "patient lookup failed: {err}");
                    UNKNOWN_PATIENT.to_owned()
                }
            };
            (id, name)
        })
        .buffer_unordered(PROFILE_FETCH_CONCURRENCY)
        .collect()
        .await
}
