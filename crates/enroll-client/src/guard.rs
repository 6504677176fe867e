//! Access gates for protected views.
//!
//! [`AuthGate`] and [`RoleGate`] are pure decisions over state the caller
//! already has. [`RouteGuard`] composes them against the live session and
//! role directory, and is what a view asks before it renders.

use std::sync::Arc;

use enroll_core::principal::Privilege;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
  navigator::{Navigator, Redirect},
  roles::RoleDirectory,
  session::{Session, SessionState},
};

// ─── Decisions ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
  /// Show a placeholder; the answer is not known yet.
  Loading,
  Render,
  Redirect(Redirect),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleStatus {
  Loading,
  Authorized,
  Unauthorized,
}

impl From<Option<bool>> for RoleStatus {
  fn from(value: Option<bool>) -> Self {
    match value {
      None => Self::Loading,
      Some(true) => Self::Authorized,
      Some(false) => Self::Unauthorized,
    }
  }
}

impl From<bool> for RoleStatus {
  fn from(value: bool) -> Self { Some(value).into() }
}

/// What a protected view demands of the current principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
  Authenticated,
  Privileged(Privilege),
}

// ─── Gates ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AuthGate {
  pub login_path: String,
}

impl AuthGate {
  pub fn decide(&self, state: &SessionState, location: &str) -> GateDecision {
    match state {
      SessionState::Loading => GateDecision::Loading,
      SessionState::Anonymous => GateDecision::Redirect(Redirect::replace(
        self.login_path.clone(),
        Some(location.to_string()),
      )),
      SessionState::Authenticated(_) => GateDecision::Render,
    }
  }
}

#[derive(Debug, Clone)]
pub struct RoleGate {
  pub root_path: String,
}

impl RoleGate {
  pub fn decide(&self, status: RoleStatus) -> GateDecision {
    match status {
      RoleStatus::Loading => GateDecision::Loading,
      RoleStatus::Authorized => GateDecision::Render,
      RoleStatus::Unauthorized => {
        GateDecision::Redirect(Redirect::replace(self.root_path.clone(), None))
      }
    }
  }
}

// ─── Route guard ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RouteGuard {
  roles:     RoleDirectory,
  session:   Session,
  navigator: Arc<dyn Navigator>,
  auth:      AuthGate,
  role:      RoleGate,
}

impl RouteGuard {
  pub fn new(roles: RoleDirectory) -> Self {
    let client = roles.client();
    let auth = AuthGate { login_path: client.config().login_path.clone() };
    let role = RoleGate { root_path: client.config().root_path.clone() };
    let session = client.session().clone();
    let navigator = client.navigator().clone();
    Self { roles, session, navigator, auth, role }
  }

  /// Decide from what is already known: the current session and cached roles.
  /// Never issues a request or navigates.
  pub async fn evaluate(&self, location: &str, requirement: Requirement) -> GateDecision {
    let state = self.session.state();
    match (self.auth.decide(&state, location), requirement, state.principal()) {
      (GateDecision::Render, Requirement::Privileged(privilege), Some(principal)) => {
        let status = self.roles.cached(&principal.email, privilege).await.into();
        self.role.decide(status)
      }
      (decision, ..) => decision,
    }
  }

  /// Resolve the session and any role lookup, then navigate on a redirect.
  ///
  /// A cancelled entry answers [`GateDecision::Loading`] and navigates nowhere.
  /// If the session changes while a role lookup is in flight, the lookup is
  /// repeated for whoever holds the session now.
  pub async fn enter(
    &self,
    location: &str,
    requirement: Requirement,
    cancel: &CancellationToken,
  ) -> GateDecision {
    tokio::select! {
      biased;
      _ = cancel.cancelled() => return GateDecision::Loading,
      _ = self.session.resolved() => {}
    }

    let decision = loop {
      let (state, epoch) = self.session.state_at();
      let (privilege, principal) = match (self.auth.decide(&state, location), requirement, state.principal()) {
        (GateDecision::Render, Requirement::Privileged(privilege), Some(principal)) => {
          (privilege, principal)
        }
        (decision, ..) => break decision,
      };

      let granted = self.roles.check(&principal.email, privilege, cancel).await;
      if cancel.is_cancelled() {
        return GateDecision::Loading;
      }
      if self.session.epoch() == epoch {
        break self.role.decide(granted.into());
      }

      let now = self.session.state();
      if !now.is_authenticated() {
        // Ended during the lookup; whoever ended it has navigated.
        debug!(location, "session ended during role lookup");
        return self.auth.decide(&now, location);
      }
      debug!(location, "session changed during role lookup, checking again");
    };

    if let GateDecision::Redirect(redirect) = &decision {
      debug!(location, to = %redirect.to, "guard redirect");
      self.navigator.navigate(redirect.clone());
    }
    decision
  }
}
