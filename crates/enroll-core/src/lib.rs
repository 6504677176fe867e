//! Core records and trait definitions for the enrollment client.
//!
//! No HTTP dependencies live here. Every record is a request-scoped copy of
//! something the backend owns; the only checks are presence and range checks
//! before a write.

// Native `async fn` in traits; the returned futures carry explicit `Send`
// bounds where they matter.
#![allow(async_fn_in_trait)]

pub mod assignment;
pub mod class;
pub mod enrollment;
pub mod error;
pub mod feedback;
pub mod identity;
pub mod principal;
pub mod user;

pub use error::{Error, Result};

/// Reject blank values for a required text field.
pub(crate) fn require(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::MissingField(field));
  }
  Ok(())
}
