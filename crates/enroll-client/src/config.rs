//! Client configuration.
//!
//! Values come from an optional TOML file overlaid with `ENROLL_*` environment
//! variables, e.g. `ENROLL_BASE_URL=https://api.example.com`.

use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::{ClientError, Result};

pub const ENV_PREFIX: &str = "ENROLL";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  pub base_url:            String,
  /// Keep and replay cookies on every call, including cross-origin ones.
  pub with_credentials:    bool,
  pub timeout_secs:        u64,
  pub role_cache_ttl_secs: u64,
  pub role_cache_capacity: u64,
  /// Where a `401` sends the user.
  pub login_path:          String,
  /// Where a failed role gate sends the user.
  pub root_path:           String,
  pub payment_public_key:  Option<String>,
  /// Keys for the image host and chat assistant, passed through untouched.
  pub image_host_key:      Option<String>,
  pub assistant_key:       Option<String>,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url:            "http://localhost:3000".to_string(),
      with_credentials:    true,
      timeout_secs:        30,
      role_cache_ttl_secs: 300,
      role_cache_capacity: 1024,
      login_path:          "/login".to_string(),
      root_path:           "/".to_string(),
      payment_public_key:  None,
      image_host_key:      None,
      assistant_key:       None,
    }
  }
}

impl ClientConfig {
  /// Defaults pointed at `base_url`.
  pub fn for_base_url(base_url: impl Into<String>) -> Self {
    Self { base_url: base_url.into(), ..Self::default() }
  }

  /// Load from `path` (if it exists) and the environment. Environment wins.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
      builder = builder.add_source(config::File::from(path).required(false));
    }
    let settings = builder
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  pub fn role_cache_ttl(&self) -> Duration {
    Duration::from_secs(self.role_cache_ttl_secs)
  }

  /// The payment processor's public key; checkout cannot start without it.
  pub fn require_payment_key(&self) -> Result<&str> {
    non_blank(self.payment_public_key.as_deref())
      .ok_or(ClientError::MissingConfig("payment_public_key"))
  }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
  value.filter(|v| !v.trim().is_empty())
}
