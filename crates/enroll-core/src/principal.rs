//! The signed-in principal and its bearer credential.
//!
//! A principal is owned by the identity provider. The client only holds a
//! copy for the lifetime of a session; the role it plays on the backend is
//! derived separately by role lookups and never stored here.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

// ─── Bearer token ────────────────────────────────────────────────────────────

/// A credential string proving the principal's identity.
///
/// When the raw value is a JWT the expiry is read from its `exp` claim;
/// opaque tokens have no known expiry and are treated as valid until the
/// backend says otherwise.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BearerToken {
  value:      String,
  expires_at: Option<DateTime<Utc>>,
}

impl BearerToken {
  pub fn new(value: impl Into<String>) -> Self {
    let value = value.into();
    let expires_at = jwt_expiry(&value);
    Self { value, expires_at }
  }

  pub fn with_expiry(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
    Self { value: value.into(), expires_at: Some(expires_at) }
  }

  pub fn as_str(&self) -> &str { &self.value }

  pub fn expires_at(&self) -> Option<DateTime<Utc>> { self.expires_at }

  /// `true` only when the expiry is known and not after `now`.
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    self.expires_at.is_some_and(|at| at <= now)
  }

  pub fn is_expired(&self) -> bool { self.is_expired_at(Utc::now()) }

  /// Value for an `Authorization` header.
  pub fn authorization(&self) -> String { format!("Bearer {}", self.value) }

  /// The `sub` claim of a JWT, which identity providers set to the user id.
  pub fn subject(&self) -> Option<String> { jwt_claims(&self.value)?.sub }
}

impl fmt::Debug for BearerToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BearerToken")
      .field("value", &"<redacted>")
      .field("expires_at", &self.expires_at)
      .finish()
  }
}

#[derive(Deserialize)]
struct Claims {
  exp: Option<i64>,
  sub: Option<String>,
}

fn jwt_claims(raw: &str) -> Option<Claims> {
  let mut parts = raw.split('.');
  let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
  if parts.next().is_some() {
    return None;
  }
  let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
  serde_json::from_slice(&bytes).ok()
}

fn jwt_expiry(raw: &str) -> Option<DateTime<Utc>> {
  DateTime::from_timestamp(jwt_claims(raw)?.exp?, 0)
}

// ─── Principal ───────────────────────────────────────────────────────────────

/// The currently authenticated end user, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
  pub uid:          String,
  pub email:        String,
  pub display_name: Option<String>,
  pub photo_url:    Option<String>,
  pub token:        BearerToken,
}

impl Principal {
  pub fn new(uid: impl Into<String>, email: impl Into<String>, token: BearerToken) -> Self {
    Self {
      uid: uid.into(),
      email: email.into(),
      display_name: None,
      photo_url: None,
      token,
    }
  }

  /// Whether `other` is the same end user, ignoring token and profile changes.
  pub fn same_identity(&self, other: &Principal) -> bool {
    self.email.eq_ignore_ascii_case(&other.email)
  }
}

// ─── Roles ───────────────────────────────────────────────────────────────────

/// The role stored on a backend user record.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  Student,
  Teacher,
  Admin,
}

/// A privilege checked by a role gate.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Privilege {
  Admin,
  Teacher,
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Check that `value` is email-shaped and return it trimmed.
pub fn validate_email(value: &str) -> Result<&str> {
  let trimmed = value.trim();
  let valid = match trimmed.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !trimmed.chars().any(char::is_whitespace)
    }
    None => false,
  };
  if valid { Ok(trimmed) } else { Err(Error::InvalidEmail(value.to_string())) }
}
