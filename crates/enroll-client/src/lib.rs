//! Client SDK for the course-enrollment backend.
//!
//! The pieces, in dependency order:
//!
//! - [`session::Session`]: the shared, observable "who is signed in" handle,
//!   mutated only by [`identity::IdentitySession`] and the 401 path of
//!   [`http::AuthClient`].
//! - [`http::AuthClient`]: attaches the current bearer token to every request
//!   and reacts to `401`/`403` centrally.
//! - [`roles::RoleDirectory`]: cached admin/teacher lookups.
//! - [`guard::RouteGuard`]: authenticated and role gates for protected views.
//! - [`api::EnrollApi`]: typed calls for classes, enrollments, assignments,
//!   feedback, users and stats.
//!
//! Every request-issuing call takes a [`CancellationToken`]; a cancelled call
//! never mutates the session or navigates.

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod identity;
pub mod inflight;
pub mod navigator;
pub mod roles;
pub mod session;

pub use api::EnrollApi;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use http::AuthClient;
pub use session::{Session, SessionState};
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests;
