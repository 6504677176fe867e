//! Error types for `enroll-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not an email address: {0:?}")]
  InvalidEmail(String),

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("rating must be between 1 and 5, got {0}")]
  InvalidRating(u8),

  #[error("price must be a non-negative amount, got {0}")]
  InvalidPrice(f64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
