//! Cached admin and teacher lookups.
//!
//! Roles are not carried in the bearer token; each privilege is a separate
//! round trip. Answers are cached per `(email, privilege)` for a bounded
//! time, within the session generation they were fetched in: signing out or
//! switching identity makes every earlier answer unreachable at once.
//! Failures answer `false` and are never cached.

use enroll_core::principal::{Privilege, validate_email};
use moka::future::Cache;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{AuthClient, Result};

#[derive(Deserialize)]
struct AdminFlag {
  #[serde(default)]
  admin: bool,
}

#[derive(Deserialize)]
struct TeacherFlag {
  #[serde(default)]
  teacher: bool,
}

/// `(session generation, lowercased email, privilege)`
type Key = (u64, String, Privilege);

#[derive(Clone)]
pub struct RoleDirectory {
  client: AuthClient,
  cache:  Cache<Key, bool>,
}

impl RoleDirectory {
  /// Build a directory bound to the client's session.
  pub fn new(client: AuthClient) -> Self {
    let config = client.config();
    let cache = Cache::builder()
      .max_capacity(config.role_cache_capacity)
      .time_to_live(config.role_cache_ttl())
      .build();
    Self { client, cache }
  }

  fn key(&self, email: &str, privilege: Privilege) -> Key {
    (self.client.session().generation(), email.trim().to_lowercase(), privilege)
  }

  pub fn client(&self) -> &AuthClient { &self.client }

  pub async fn is_admin(&self, email: &str, cancel: &CancellationToken) -> bool {
    self.check(email, Privilege::Admin, cancel).await
  }

  pub async fn is_teacher(&self, email: &str, cancel: &CancellationToken) -> bool {
    self.check(email, Privilege::Teacher, cancel).await
  }

  /// Look `privilege` up for `email`, from cache when possible.
  ///
  /// Concurrent lookups for one key share a single request.
  pub async fn check(&self, email: &str, privilege: Privilege, cancel: &CancellationToken) -> bool {
    let Ok(email) = validate_email(email) else {
      debug!(email, %privilege, "not an email, denying without lookup");
      return false;
    };
    let key = self.key(email, privilege);

    match self.cache.try_get_with(key, self.fetch(email, privilege, cancel)).await {
      Ok(granted) => granted,
      Err(e) => {
        warn!(email, %privilege, error = %e, "role lookup failed, denying");
        false
      }
    }
  }

  /// The cached answer, if any. Never touches the network.
  pub async fn cached(&self, email: &str, privilege: Privilege) -> Option<bool> {
    let email = validate_email(email).ok()?;
    self.cache.get(&self.key(email, privilege)).await
  }

  /// Forget everything known about `email`.
  pub async fn invalidate(&self, email: &str) {
    debug!(email, "dropping cached roles");
    for privilege in [Privilege::Admin, Privilege::Teacher] {
      self.cache.invalidate(&self.key(email, privilege)).await;
    }
  }

  async fn fetch(&self, email: &str, privilege: Privilege, cancel: &CancellationToken) -> Result<bool> {
    match privilege {
      Privilege::Admin => {
        let flag: AdminFlag = self
          .client
          .get_json(&["api", "users", "admin", email], &[], cancel)
          .await?;
        Ok(flag.admin)
      }
      Privilege::Teacher => {
        let flag: TeacherFlag = self
          .client
          .get_json(&["api", "users", "teacher", email], &[], cancel)
          .await?;
        Ok(flag.teacher)
      }
    }
  }
}
