//! The `IdentityProvider` trait, the seam to the external auth service.
//!
//! Implementations wrap a hosted identity service. The client crate wraps a
//! provider in a session holder that mirrors the signed-in principal into a
//! shared session; nothing else talks to the provider directly.

use std::future::Future;

use crate::principal::{BearerToken, Principal};

/// A third-party account used for federated sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FederatedProvider {
  Google,
}

/// Profile fields the user may change after sign-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
  pub display_name: Option<String>,
  pub photo_url:    Option<String>,
}

/// Abstraction over a hosted identity provider.
///
/// All methods return `Send` futures so a provider can be shared across a
/// multi-threaded runtime.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The principal the provider already considers signed in, if any.
  fn current_user(
    &self,
  ) -> impl Future<Output = Result<Option<Principal>, Self::Error>> + Send + '_;

  /// Create an account with email and password; the new user is signed in.
  fn sign_up<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Principal, Self::Error>> + Send + 'a;

  fn sign_in<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Principal, Self::Error>> + Send + 'a;

  fn sign_in_federated(
    &self,
    provider: FederatedProvider,
  ) -> impl Future<Output = Result<Principal, Self::Error>> + Send + '_;

  fn sign_out(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Apply `profile` and return the updated principal.
  fn update_profile<'a>(
    &'a self,
    principal: &'a Principal,
    profile: &'a Profile,
  ) -> impl Future<Output = Result<Principal, Self::Error>> + Send + 'a;

  fn send_password_reset<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Return a current token for `principal`, refreshing it if the provider
  /// considers the held one stale.
  fn fresh_token<'a>(
    &'a self,
    principal: &'a Principal,
  ) -> impl Future<Output = Result<BearerToken, Self::Error>> + Send + 'a;
}
