//! The shared session: who is signed in, observable by every consumer.
//!
//! A [`Session`] is a cheap, cloneable handle passed explicitly to whatever
//! issues requests or makes access decisions. Consumers read it at the moment
//! they need it instead of capturing a principal once, so a sign-in as a
//! different user is picked up by the very next request.
//!
//! Every change of principal moves the session to a new *epoch*. Requests
//! remember the epoch they were sent under; a `401` can only terminate the
//! epoch it was issued in, which makes termination happen once no matter how
//! many in-flight requests fail together, and keeps a late failure from an old
//! token from ending a newer session.
//!
//! A coarser *generation* advances only when the signed-in identity changes or
//! the session ends; token refreshes and profile edits keep it. Caches of
//! per-identity answers key on it.

use std::{
  future::Future,
  pin::Pin,
  sync::{Arc, Mutex, MutexGuard},
};

use enroll_core::principal::{BearerToken, Principal};
use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

// ─── State ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
  /// The identity provider has not reported yet.
  Loading,
  Anonymous,
  Authenticated(Principal),
}

impl SessionState {
  pub fn principal(&self) -> Option<&Principal> {
    match self {
      Self::Authenticated(p) => Some(p),
      _ => None,
    }
  }

  pub fn is_loading(&self) -> bool { matches!(self, Self::Loading) }

  pub fn is_authenticated(&self) -> bool { matches!(self, Self::Authenticated(_)) }
}

#[derive(Debug)]
struct Snapshot {
  state:      SessionState,
  epoch:      u64,
  generation: u64,
}

impl Snapshot {
  /// Install `next`, advancing the generation unless it is the same identity.
  fn replace(&mut self, next: SessionState) {
    let same_identity = match (self.state.principal(), next.principal()) {
      (Some(a), Some(b)) => a.same_identity(b),
      _ => false,
    };
    if !same_identity {
      self.generation += 1;
    }
    self.state = next;
    self.epoch += 1;
  }
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Work to run after a rejected credential has ended the session, before the
/// login redirect is issued.
pub trait TerminationHook: Send + Sync {
  fn terminated(&self) -> BoxFuture<'_, ()>;
}

type HookList = Vec<Arc<dyn TerminationHook>>;
type Hooks = Arc<Mutex<HookList>>;

// ─── Session ──────────────────────────────────────────────────────────────────

/// Shared handle over the current [`SessionState`].
#[derive(Clone)]
pub struct Session {
  tx:    Arc<watch::Sender<Snapshot>>,
  hooks: Hooks,
}

impl Default for Session {
  fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for Session {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let snap = self.tx.borrow();
    f.debug_struct("Session")
      .field("state", &snap.state)
      .field("epoch", &snap.epoch)
      .field("generation", &snap.generation)
      .finish()
  }
}

impl Session {
  /// A session still waiting for the identity provider.
  pub fn new() -> Self { Self::with_state(SessionState::Loading) }

  pub fn anonymous() -> Self { Self::with_state(SessionState::Anonymous) }

  /// Resume a principal whose token was persisted elsewhere.
  pub fn signed_in(principal: Principal) -> Self {
    Self::with_state(SessionState::Authenticated(principal))
  }

  fn with_state(state: SessionState) -> Self {
    let (tx, _rx) = watch::channel(Snapshot { state, epoch: 0, generation: 0 });
    Self { tx: Arc::new(tx), hooks: Hooks::default() }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn state(&self) -> SessionState { self.tx.borrow().state.clone() }

  pub fn principal(&self) -> Option<Principal> {
    self.tx.borrow().state.principal().cloned()
  }

  pub fn token(&self) -> Option<BearerToken> {
    self.tx.borrow().state.principal().map(|p| p.token.clone())
  }

  pub fn epoch(&self) -> u64 { self.tx.borrow().epoch }

  pub fn generation(&self) -> u64 { self.tx.borrow().generation }

  /// Principal and epoch read together.
  pub(crate) fn snapshot(&self) -> (Option<Principal>, u64) {
    let snap = self.tx.borrow();
    (snap.state.principal().cloned(), snap.epoch)
  }

  /// State and epoch read together.
  pub(crate) fn state_at(&self) -> (SessionState, u64) {
    let snap = self.tx.borrow();
    (snap.state.clone(), snap.epoch)
  }

  /// Wait until the session has left [`SessionState::Loading`].
  pub async fn resolved(&self) -> SessionState {
    let mut rx = self.tx.subscribe();
    match rx.wait_for(|snap| !snap.state.is_loading()).await {
      Ok(snap) => snap.state.clone(),
      Err(_) => self.state(),
    }
  }

  // ── Subscriptions ─────────────────────────────────────────────────────────

  /// Observe principal changes. Dropping the watch unsubscribes.
  pub fn subscribe(&self) -> SessionWatch {
    SessionWatch { rx: self.tx.subscribe() }
  }

  /// Run `f` on every principal change until the returned [`Subscription`]
  /// is dropped or cancelled. Must be called inside a tokio runtime.
  pub fn on_change<F>(&self, mut f: F) -> Subscription
  where
    F: FnMut(&SessionState) + Send + 'static,
  {
    let mut watch = self.subscribe();
    let handle = tokio::spawn(async move {
      while let Some(state) = watch.changed().await {
        f(&state);
      }
    });
    Subscription { handle }
  }

  // ── Mutation (identity holder and 401 path only) ──────────────────────────

  pub(crate) fn establish(&self, principal: Principal) {
    self.tx.send_if_modified(|snap| {
      if snap.state.principal() == Some(&principal) {
        return false;
      }
      snap.replace(SessionState::Authenticated(principal));
      true
    });
  }

  /// Replace the principal only if the session is still at `epoch`.
  pub(crate) fn establish_at(&self, epoch: u64, principal: Principal) -> bool {
    let mut applied = false;
    self.tx.send_if_modified(|snap| {
      if snap.epoch != epoch || snap.state.principal() == Some(&principal) {
        return false;
      }
      applied = true;
      snap.replace(SessionState::Authenticated(principal));
      true
    });
    applied
  }

  /// Leave `Loading` for `Anonymous`; a no-op once resolved.
  pub(crate) fn resolve_anonymous(&self) {
    self.tx.send_if_modified(|snap| {
      if !snap.state.is_loading() {
        return false;
      }
      snap.replace(SessionState::Anonymous);
      true
    });
  }

  /// Explicit sign-out.
  pub(crate) fn clear(&self) {
    self.tx.send_if_modified(|snap| {
      if snap.state == SessionState::Anonymous {
        return false;
      }
      snap.replace(SessionState::Anonymous);
      true
    });
  }

  /// End the session that was current at `epoch`.
  ///
  /// Returns `true` exactly once per epoch: for the first caller that still
  /// sees `epoch` as current. The epoch advances even when the session was
  /// already anonymous, but watchers are only woken if the principal changed.
  pub(crate) fn terminate(&self, epoch: u64) -> bool {
    let mut fired = false;
    self.tx.send_if_modified(|snap| {
      if snap.epoch != epoch {
        return false;
      }
      fired = true;
      let changed = snap.state != SessionState::Anonymous;
      snap.replace(SessionState::Anonymous);
      changed
    });
    fired
  }

  // ── Termination hooks ─────────────────────────────────────────────────────

  /// Run `hook` every time a rejected credential ends this session.
  pub fn on_terminate(&self, hook: Arc<dyn TerminationHook>) {
    lock(&self.hooks).push(hook);
  }

  pub(crate) async fn run_termination_hooks(&self) {
    let hooks = lock(&self.hooks).clone();
    debug!(hooks = hooks.len(), "running termination hooks");
    for hook in hooks {
      hook.terminated().await;
    }
  }
}

fn lock(hooks: &Mutex<HookList>) -> MutexGuard<'_, HookList> {
  hooks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─── Observers ────────────────────────────────────────────────────────────────

/// A receiver of session changes.
pub struct SessionWatch {
  rx: watch::Receiver<Snapshot>,
}

impl SessionWatch {
  /// Wait for the next principal change. `None` once every [`Session`]
  /// handle has been dropped.
  pub async fn changed(&mut self) -> Option<SessionState> {
    self.rx.changed().await.ok()?;
    Some(self.rx.borrow_and_update().state.clone())
  }

  pub fn current(&self) -> SessionState { self.rx.borrow().state.clone() }
}

/// A spawned change listener, aborted on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
  handle: JoinHandle<()>,
}

impl Subscription {
  pub fn cancel(self) {}

  pub fn is_active(&self) -> bool { !self.handle.is_finished() }
}

impl Drop for Subscription {
  fn drop(&mut self) { self.handle.abort(); }
}
