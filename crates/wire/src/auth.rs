//! Login grant returned by `POST /login/{role}/`, and the error body of the auth endpoints.

use crate::lenient::{id_string, opt_text};
use crate::{decode_json, WireError, WireResult};
use medbot_types::Role;
use serde::Deserialize;

/// Domain-level result of a successful login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginGrant {
    /// Bearer token for subsequent calls.
    pub access_token: String,
    /// Refresh token, when the backend issues one. Not used for renewal.
    pub refresh_token: Option<String>,
    /// Backend identifier of the logged-in doctor, patient or staff member.
    pub user_id: String,
    /// Role echoed by the backend, if any.
    pub role: Option<Role>,
}

#[derive(Deserialize)]
struct LoginWire {
    #[serde(default, deserialize_with = "opt_text")]
    access: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    refresh: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    role: Option<String>,
    #[serde(deserialize_with = "id_string")]
    id: String,
}

impl LoginGrant {
    /// Parse the login response body.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] if the body does not match the schema or carries no access token.
    pub fn parse(bytes: &[u8]) -> WireResult<Self> {
        let wire: LoginWire = decode_json("login response", bytes)?;
        let access_token = wire
            .access
            .ok_or_else(|| WireError::InvalidInput("login response has no access token".into()))?;

        Ok(Self {
            access_token,
            refresh_token: wire.refresh,
            user_id: wire.id,
            role: wire.role.and_then(|r| r.parse().ok()),
        })
    }
}

#[derive(Deserialize)]
struct ErrorWire {
    #[serde(default, deserialize_with = "opt_text")]
    error: Option<String>,
}

/// The reason in an auth endpoint's `{"error": "..."}` body, if there is one.
pub fn error_message(bytes: &[u8]) -> Option<String> {
    decode_json::<ErrorWire>("error response", bytes)
        .ok()
        .and_then(|wire| wire.error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(br#"{"error": "User already exists"}"#).as_deref(),
            Some("User already exists")
        );
        assert_eq!(error_message(br#"{"detail": "nope"}"#), None);
        assert_eq!(error_message(b"<html>Bad Request</html>"), None);
    }

    #[test]
    fn test_parse_doctor_grant() {
        let grant = LoginGrant::parse(
            br#"{"refresh":"r-1","access":"a-1","role":"doctor","id":4}"#,
        )
        .expect("grant should parse");
        assert_eq!(grant.access_token, "a-1");
        assert_eq!(grant.refresh_token.as_deref(), Some("r-1"));
        assert_eq!(grant.user_id, "4");
        assert_eq!(grant.role, Some(Role::Doctor));
    }

    #[test]
    fn test_parse_grant_maps_staff_to_admin() {
        let grant = LoginGrant::parse(br#"{"access":"a","role":"staff","id":"9"}"#)
            .expect("grant should parse");
        assert_eq!(grant.role, Some(Role::Admin));
    }

    #[test]
    fn test_parse_rejects_missing_access() {
        let err = LoginGrant::parse(br#"{"id":4}"#).expect_err("no token should fail");
        assert!(matches!(err, WireError::InvalidInput(_)));
    }
}
