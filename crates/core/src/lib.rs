//! # MedBot Core
//!
//! Client-side logic for the MedBot clinic application.
//!
//! This crate contains everything the front ends need apart from transport:
//! - Session lifecycle (login, logout, expiry on `401`) backed by a JSON file
//! - Dashboard queries for the admin, doctor and patient views
//! - The diagnosis and admission wizards
//! - The diagnosis detail view with inline vitals editing
//! - The dictation recorder and the merge of its analysis into a diagnosis
//!
//! **No HTTP code**: remote collaborators are reached through the [`MedbotApi`] and
//! [`DictationApi`] traits, implemented in `medbot-client`.

pub mod api;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod detail;
pub mod download;
pub mod error;
pub mod forms;
pub mod merge;
pub mod recorder;
pub mod roster;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiResult, AudioClip, DictationApi, MedbotApi};
pub use config::ClientConfig;
pub use error::{ApiError, CaptureError, CoreError, CoreResult, SubmitError};
pub use session::{Profile, Session, SessionStore};

pub use medbot_types::{EmailAddress, NonEmptyText, Role, TextError};
pub use medbot_wire as wire;
