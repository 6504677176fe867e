//! Behaviour tests against an in-process backend.

mod backend;

use std::sync::Arc;

use enroll_core::principal::{BearerToken, Principal};

use crate::{
  AuthClient, ClientConfig, EnrollApi, Session,
  navigator::NavigationLog,
  roles::RoleDirectory,
};
use backend::FakeBackend;

pub(crate) struct Harness {
  pub backend: FakeBackend,
  pub session: Session,
  pub nav:     Arc<NavigationLog>,
  pub client:  AuthClient,
}

impl Harness {
  pub async fn new(session: Session) -> Self {
    Self::with_config(session, |_| {}).await
  }

  pub async fn with_config(session: Session, tweak: impl FnOnce(&mut ClientConfig)) -> Self {
    let backend = FakeBackend::start().await;
    let mut config = ClientConfig::for_base_url(backend.url());
    config.payment_public_key = Some("pk_test_123".to_string());
    tweak(&mut config);

    let nav = Arc::new(NavigationLog::new());
    let client = AuthClient::new(config, session.clone(), nav.clone()).unwrap();
    Self { backend, session, nav, client }
  }

  /// A harness whose session holds `email` with a token the backend knows.
  pub async fn signed_in(email: &str, token: &str) -> Self {
    let h = Self::new(Session::signed_in(principal(email, token))).await;
    h.backend.account(token, email);
    h
  }

  pub fn api(&self) -> EnrollApi { EnrollApi::new(self.client.clone()) }

  pub fn roles(&self) -> RoleDirectory { RoleDirectory::new(self.client.clone()) }
}

pub(crate) fn principal(email: &str, token: &str) -> Principal {
  Principal::new(format!("uid-{email}"), email, BearerToken::new(token))
}

pub(crate) fn bearer(token: &str) -> Option<String> { Some(format!("Bearer {token}")) }
