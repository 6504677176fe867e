//! Guard against the same write being issued twice at once.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex, MutexGuard},
};

use crate::{ClientError, Result};

#[derive(Debug, Clone, Default)]
pub struct InFlight {
  keys: Arc<Mutex<HashSet<String>>>,
}

/// Holds a key for as long as the write runs.
#[derive(Debug)]
pub struct InFlightTicket {
  key:  String,
  keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
  pub fn new() -> Self { Self::default() }

  /// Claim `key`, or fail with [`ClientError::DuplicateInFlight`] if another
  /// write holds it.
  pub fn begin(&self, key: impl Into<String>) -> Result<InFlightTicket> {
    let key = key.into();
    if !lock(&self.keys).insert(key.clone()) {
      tracing::warn!(%key, "duplicate write rejected");
      return Err(ClientError::DuplicateInFlight(key));
    }
    Ok(InFlightTicket { key, keys: self.keys.clone() })
  }

  pub fn is_busy(&self, key: &str) -> bool { lock(&self.keys).contains(key) }
}

impl Drop for InFlightTicket {
  fn drop(&mut self) { lock(&self.keys).remove(&self.key); }
}

fn lock(keys: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
  keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
