//! The authenticated HTTP client.
//!
//! Every request reads the shared [`Session`] at send time and attaches the
//! current principal's bearer token. Responses are screened centrally: a
//! `401` ends the session, runs its termination hooks and redirects to the
//! login path, a `403` is surfaced as [`ClientError::Forbidden`] with the session left alone.

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  ClientError, Result,
  config::ClientConfig,
  navigator::{Navigator, Redirect},
  session::Session,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Async client for the enrollment backend.
///
/// Cheap to clone; clones share the connection pool, cookie store, session
/// and navigator.
#[derive(Clone)]
pub struct AuthClient {
  client:    Client,
  base:      Url,
  config:    Arc<ClientConfig>,
  session:   Session,
  navigator: Arc<dyn Navigator>,
}

impl AuthClient {
  pub fn new(
    config: ClientConfig,
    session: Session,
    navigator: Arc<dyn Navigator>,
  ) -> Result<Self> {
    let base = Url::parse(&config.base_url)
      .map_err(|_| ClientError::InvalidBaseUrl(config.base_url.clone()))?;
    if base.cannot_be_a_base() {
      return Err(ClientError::InvalidBaseUrl(config.base_url.clone()));
    }

    let client = Client::builder()
      .timeout(config.timeout())
      .cookie_store(config.with_credentials)
      .build()?;

    Ok(Self {
      client,
      base,
      config: Arc::new(config),
      session,
      navigator,
    })
  }

  pub fn session(&self) -> &Session { &self.session }

  pub fn config(&self) -> &ClientConfig { &self.config }

  pub fn navigator(&self) -> &Arc<dyn Navigator> { &self.navigator }

  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  // ── Core exchange ─────────────────────────────────────────────────────────

  /// Issue one request.
  ///
  /// `build` adds the body or query. A `401` or `403` response is turned into
  /// an error here; every other status is handed back to the caller.
  pub async fn send<F>(
    &self,
    method: Method,
    segments: &[&str],
    build: F,
    cancel: &CancellationToken,
  ) -> Result<Response>
  where
    F: FnOnce(RequestBuilder) -> RequestBuilder,
  {
    if cancel.is_cancelled() {
      return Err(ClientError::Cancelled);
    }

    let path = path_of(segments);
    let (principal, epoch) = self.session.snapshot();
    let request_id = Uuid::new_v4();

    let mut req = self
      .client
      .request(method.clone(), self.url(segments))
      .header(REQUEST_ID_HEADER, request_id.to_string());

    let attached = match principal.as_ref().map(|p| &p.token) {
      Some(token) if token.is_expired() => {
        warn!(%path, %request_id, "token expired, sending without credentials");
        false
      }
      Some(token) => {
        req = req.bearer_auth(token.as_str());
        true
      }
      None => false,
    };
    let req = build(req);

    debug!(%method, %path, %request_id, attached, "request");

    let resp = tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        debug!(%path, %request_id, "request cancelled");
        return Err(ClientError::Cancelled);
      }
      resp = req.send() => resp?,
    };

    match resp.status() {
      StatusCode::UNAUTHORIZED => {
        warn!(%path, %request_id, "401 from backend");
        self.on_unauthorized(epoch, &path).await;
        Err(ClientError::Unauthorized { path })
      }
      StatusCode::FORBIDDEN => {
        warn!(%path, %request_id, "403 from backend");
        Err(ClientError::Forbidden { path })
      }
      _ => Ok(resp),
    }
  }

  /// End the session that issued a rejected request, once per epoch. The
  /// session's termination hooks finish before the login redirect.
  async fn on_unauthorized(&self, epoch: u64, path: &str) {
    if !self.session.terminate(epoch) {
      debug!(%path, epoch, "session already terminated for this epoch");
      return;
    }
    info!(%path, epoch, "session terminated");
    self.session.run_termination_hooks().await;
    self.navigator.navigate(Redirect::replace(
      self.config.login_path.clone(),
      Some(path.to_string()),
    ));
  }

  // ── JSON helpers ──────────────────────────────────────────────────────────

  pub async fn get_json<T: DeserializeOwned>(
    &self,
    segments: &[&str],
    query: &[(&str, String)],
    cancel: &CancellationToken,
  ) -> Result<T> {
    let resp = self
      .send(Method::GET, segments, |req| req.query(query), cancel)
      .await?;
    decode(segments, resp, cancel).await
  }

  pub async fn send_json<B, T>(
    &self,
    method: Method,
    segments: &[&str],
    body: &B,
    cancel: &CancellationToken,
  ) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let resp = self
      .send(method, segments, |req| req.json(body), cancel)
      .await?;
    decode(segments, resp, cancel).await
  }

  /// Like [`send_json`](Self::send_json), discarding the response body.
  pub async fn send_unit<B>(
    &self,
    method: Method,
    segments: &[&str],
    body: &B,
    cancel: &CancellationToken,
  ) -> Result<()>
  where
    B: Serialize + ?Sized,
  {
    let resp = self
      .send(method, segments, |req| req.json(body), cancel)
      .await?;
    expect_success(segments, resp).await.map(drop)
  }

  /// A request with neither body nor query.
  pub async fn send_empty(
    &self,
    method: Method,
    segments: &[&str],
    cancel: &CancellationToken,
  ) -> Result<()> {
    let resp = self.send(method, segments, |req| req, cancel).await?;
    expect_success(segments, resp).await.map(drop)
  }
}

fn path_of(segments: &[&str]) -> String { format!("/{}", segments.join("/")) }

async fn expect_success(segments: &[&str], resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(ClientError::Status { status, path: path_of(segments), body })
}

async fn decode<T: DeserializeOwned>(
  segments: &[&str],
  resp: Response,
  cancel: &CancellationToken,
) -> Result<T> {
  let resp = expect_success(segments, resp).await?;
  tokio::select! {
    biased;
    _ = cancel.cancelled() => Err(ClientError::Cancelled),
    body = resp.json::<T>() => Ok(body?),
  }
}
