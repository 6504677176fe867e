//! The identity session holder.
//!
//! Wraps an [`IdentityProvider`] and mirrors whatever it reports into the
//! shared [`Session`]. This and the 401 path are the only writers. When a
//! `401` ends the session the provider is signed out too, so a later
//! [`IdentitySession::resume`] cannot bring the rejected principal back.

use std::sync::Arc;

use enroll_core::{
  identity::{FederatedProvider, IdentityProvider, Profile},
  principal::{BearerToken, Principal, validate_email},
};
use tracing::{debug, info, warn};

use crate::{
  ClientError, Result,
  session::{BoxFuture, Session, SessionState, TerminationHook},
};

pub struct IdentitySession<P> {
  provider: Arc<P>,
  session:  Session,
}

/// Signs the provider out when a rejected credential ends the session.
struct ProviderSignOut<P>(Arc<P>);

impl<P: IdentityProvider> TerminationHook for ProviderSignOut<P> {
  fn terminated(&self) -> BoxFuture<'_, ()> {
    Box::pin(async move {
      match self.0.sign_out().await {
        Ok(()) => info!("identity provider signed out after rejected credential"),
        Err(e) => warn!(error = %e, "identity provider sign-out failed"),
      }
    })
  }
}

fn identity_err<E>(err: E) -> ClientError
where
  E: std::error::Error + Send + Sync + 'static,
{
  ClientError::Identity(Box::new(err))
}

impl<P: IdentityProvider + 'static> IdentitySession<P> {
  pub fn new(provider: P, session: Session) -> Self {
    let provider = Arc::new(provider);
    session.on_terminate(Arc::new(ProviderSignOut(provider.clone())));
    Self { provider, session }
  }

  pub fn session(&self) -> &Session { &self.session }

  pub fn provider(&self) -> &P { &self.provider }

  /// Settle the initial `Loading` state from the provider's own record.
  /// A provider failure leaves the session anonymous.
  pub async fn resume(&self) -> Result<SessionState> {
    match self.provider.current_user().await {
      Ok(Some(principal)) => {
        info!(email = %principal.email, "session resumed");
        self.session.establish(principal);
      }
      Ok(None) => {
        debug!("no resumable session");
        self.session.resolve_anonymous();
      }
      Err(e) => {
        self.session.resolve_anonymous();
        return Err(identity_err(e));
      }
    }
    Ok(self.session.state())
  }

  pub async fn sign_up(&self, email: &str, password: &str) -> Result<Principal> {
    let email = validate_email(email)?;
    let principal = self.provider.sign_up(email, password).await.map_err(identity_err)?;
    info!(email = %principal.email, "signed up");
    self.session.establish(principal.clone());
    Ok(principal)
  }

  pub async fn sign_in(&self, email: &str, password: &str) -> Result<Principal> {
    let email = validate_email(email)?;
    let principal = self.provider.sign_in(email, password).await.map_err(identity_err)?;
    info!(email = %principal.email, "signed in");
    self.session.establish(principal.clone());
    Ok(principal)
  }

  pub async fn sign_in_federated(&self, provider: FederatedProvider) -> Result<Principal> {
    let principal = self
      .provider
      .sign_in_federated(provider)
      .await
      .map_err(identity_err)?;
    info!(email = %principal.email, ?provider, "signed in");
    self.session.establish(principal.clone());
    Ok(principal)
  }

  /// Clear the local session first, then tell the provider. A provider
  /// failure is reported but the local session stays cleared.
  pub async fn sign_out(&self) -> Result<()> {
    self.session.clear();
    info!("signed out");
    self.provider.sign_out().await.map_err(identity_err)
  }

  pub async fn update_profile(&self, profile: &Profile) -> Result<Principal> {
    let (principal, epoch) = self.session.snapshot();
    let principal = principal.ok_or(ClientError::NotSignedIn)?;
    let updated = self
      .provider
      .update_profile(&principal, profile)
      .await
      .map_err(identity_err)?;
    if self.session.establish_at(epoch, updated.clone()) {
      info!(email = %updated.email, "profile updated");
    }
    Ok(updated)
  }

  pub async fn send_password_reset(&self, email: &str) -> Result<()> {
    let email = validate_email(email)?;
    self.provider.send_password_reset(email).await.map_err(identity_err)?;
    info!(email, "password reset sent");
    Ok(())
  }

  /// Ask the provider for a current token and store it if it changed.
  pub async fn refresh_token(&self) -> Result<BearerToken> {
    let (principal, epoch) = self.session.snapshot();
    let principal = principal.ok_or(ClientError::NotSignedIn)?;
    let token = self
      .provider
      .fresh_token(&principal)
      .await
      .map_err(identity_err)?;
    if token != principal.token {
      let refreshed = Principal { token: token.clone(), ..principal };
      if self.session.establish_at(epoch, refreshed) {
        debug!("token refreshed");
      }
    }
    Ok(token)
  }
}
