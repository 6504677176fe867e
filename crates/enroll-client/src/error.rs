//! Error type for `enroll-client`.
//!
//! Variants are kept distinct so each caller can decide its own user-facing
//! message; nothing here is retried.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  /// The backend rejected or required a credential. The session has already
  /// been terminated and the login redirect issued.
  #[error("unauthorized: {path}")]
  Unauthorized { path: String },

  /// The credential was valid but not sufficient. The session is untouched.
  #[error("forbidden: {path}")]
  Forbidden { path: String },

  #[error("{path} → {status}")]
  Status {
    status: StatusCode,
    path:   String,
    body:   String,
  },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("request cancelled")]
  Cancelled,

  #[error("no principal is signed in")]
  NotSignedIn,

  #[error("missing configuration: {0}")]
  MissingConfig(&'static str),

  #[error("invalid base url {0:?}")]
  InvalidBaseUrl(String),

  #[error("class {0} is not open for enrollment")]
  ClassNotOpen(String),

  #[error("already enrolled in class {0}")]
  AlreadyEnrolled(String),

  #[error("a matching write is already in flight: {0}")]
  DuplicateInFlight(String),

  #[error("payment failed: {0}")]
  PaymentFailed(String),

  #[error("identity provider error: {0}")]
  Identity(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("config error: {0}")]
  Config(#[from] config::ConfigError),

  #[error(transparent)]
  Core(#[from] enroll_core::Error),
}

impl ClientError {
  /// `true` for 401 and 403 responses.
  pub fn is_auth_failure(&self) -> bool {
    matches!(self, Self::Unauthorized { .. } | Self::Forbidden { .. })
  }

  /// The HTTP status behind this error, when there was a response.
  pub fn status(&self) -> Option<StatusCode> {
    match self {
      Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
      Self::Forbidden { .. } => Some(StatusCode::FORBIDDEN),
      Self::Status { status, .. } => Some(*status),
      Self::Http(e) => e.status(),
      _ => None,
    }
  }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
