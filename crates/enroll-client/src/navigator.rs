//! Where the client sends the user when access ends or is refused.

use std::sync::{Mutex, MutexGuard};

/// A navigation request issued by the 401 path or a route guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
  pub to:      String,
  /// The location the user was trying to reach, for a post-login return.
  pub from:    Option<String>,
  /// Replace the current history entry instead of pushing a new one.
  pub replace: bool,
}

impl Redirect {
  pub fn replace(to: impl Into<String>, from: Option<String>) -> Self {
    Self { to: to.into(), from, replace: true }
  }
}

/// Receives redirects. Implemented by whatever owns the user's location.
pub trait Navigator: Send + Sync {
  fn navigate(&self, redirect: Redirect);
}

/// A [`Navigator`] that records every redirect in order.
#[derive(Debug, Default)]
pub struct NavigationLog {
  entries: Mutex<Vec<Redirect>>,
}

impl NavigationLog {
  pub fn new() -> Self { Self::default() }

  pub fn entries(&self) -> Vec<Redirect> { self.lock().clone() }

  pub fn last(&self) -> Option<Redirect> { self.lock().last().cloned() }

  pub fn len(&self) -> usize { self.lock().len() }

  pub fn is_empty(&self) -> bool { self.lock().is_empty() }

  /// Drain everything recorded so far.
  pub fn take(&self) -> Vec<Redirect> { std::mem::take(&mut *self.lock()) }

  fn lock(&self) -> MutexGuard<'_, Vec<Redirect>> {
    self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl Navigator for NavigationLog {
  fn navigate(&self, redirect: Redirect) {
    tracing::info!(to = %redirect.to, from = ?redirect.from, "navigating");
    self.lock().push(redirect);
  }
}
