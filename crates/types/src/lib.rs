//! Validated primitive types shared across the MedBot crates.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input was not a plausible email address
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    /// The input did not name a known login role
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// An email address with a minimal shape check (`local@domain`).
///
/// Only the shape is checked; deliverability is the backend's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses and trims an email address.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidEmail`] when there is not exactly one `@` with text on
    /// both sides, or when the address contains whitespace.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        let mut parts = trimmed.split('@');
        let valid = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !trimmed.chars().any(char::is_whitespace)
            }
            _ => false,
        };
        if !valid {
            return Err(TextError::InvalidEmail(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The actor kinds that can log in to MedBot.
///
/// The backend calls the admin role `staff`; that is the wire spelling used in login
/// paths and persisted sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    #[serde(rename = "staff", alias = "admin")]
    Admin,
    Patient,
}

impl Role {
    /// The role segment used by the backend (`/login/{role}/`).
    pub fn as_wire(self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Admin => "staff",
            Role::Patient => "patient",
        }
    }

    /// The form field carrying the login identifier for this role.
    ///
    /// Patients log in with their aadhaar number, everyone else with an email.
    pub fn identifier_field(self) -> &'static str {
        match self {
            Role::Patient => "aadhaar",
            Role::Doctor | Role::Admin => "email",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Doctor => "doctor",
            Role::Admin => "admin",
            Role::Patient => "patient",
        };
        f.write_str(label)
    }
}

impl FromStr for Role {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(Role::Doctor),
            "admin" | "staff" => Ok(Role::Admin),
            "patient" => Ok(Role::Patient),
            other => Err(TextError::UnknownRole(other.to_owned())),
        }
    }
}
