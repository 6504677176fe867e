//! Typed calls against the enrollment backend.
//!
//! Each submodule adds methods to [`EnrollApi`] for one area of the backend.
//! Every method goes through [`AuthClient`], so the bearer token, the 401
//! handling and cancellation apply uniformly.

mod assignments;
mod classes;
mod enrollments;
mod feedback;
mod teachers;
mod users;

pub use enrollments::{Billing, PaymentOutcome, PaymentProcessor};

use serde::Deserialize;

use crate::{AuthClient, Session, inflight::InFlight, roles::RoleDirectory};

#[derive(Clone)]
pub struct EnrollApi {
  client: AuthClient,
  writes: InFlight,
  roles:  Option<RoleDirectory>,
}

impl EnrollApi {
  pub fn new(client: AuthClient) -> Self {
    Self { client, writes: InFlight::new(), roles: None }
  }

  /// Drop `roles`' cached answers for a user whenever a call here changes
  /// that user's role.
  pub fn with_roles(mut self, roles: RoleDirectory) -> Self {
    self.roles = Some(roles);
    self
  }

  pub fn client(&self) -> &AuthClient { &self.client }

  pub fn session(&self) -> &Session { self.client.session() }

  /// Writes currently in flight, keyed by what they write.
  pub fn writes(&self) -> &InFlight { &self.writes }

  async fn roles_changed(&self, email: &str) {
    if let Some(roles) = &self.roles {
      roles.invalidate(email).await;
    }
  }
}

/// `{ "count": n }`
#[derive(Deserialize)]
struct Count {
  #[serde(default)]
  count: u64,
}
