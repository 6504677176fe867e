use enroll_core::{
  principal::{Principal, Role},
  user::{RoleChange, UserRecord},
};
use reqwest::Method;
use tokio_util::sync::CancellationToken;

use super::EnrollApi;
use crate::Result;

impl EnrollApi {
  /// `POST /api/users`
  pub async fn save_user(&self, user: &UserRecord, cancel: &CancellationToken) -> Result<()> {
    self
      .client
      .send_unit(Method::POST, &["api", "users"], user, cancel)
      .await
  }

  /// Mirror a freshly signed-in principal into the backend as a student.
  /// The backend ignores the write if the user already exists.
  pub async fn mirror_principal(&self, principal: &Principal, cancel: &CancellationToken) -> Result<()> {
    self.save_user(&UserRecord::student(principal), cancel).await
  }

  /// `GET /api/users?search=`
  pub async fn list_users(&self, search: Option<&str>, cancel: &CancellationToken) -> Result<Vec<UserRecord>> {
    let query: Vec<(&str, String)> = search
      .filter(|s| !s.trim().is_empty())
      .map(|s| ("search", s.trim().to_string()))
      .into_iter()
      .collect();
    self.client.get_json(&["api", "users"], &query, cancel).await
  }

  /// `GET /api/users/{email}`
  pub async fn user(&self, email: &str, cancel: &CancellationToken) -> Result<UserRecord> {
    self.client.get_json(&["api", "users", email], &[], cancel).await
  }

  // Role changes below also drop any cached answers for `email` held by the
  // directory passed to `with_roles`. Without one, call
  // `RoleDirectory::invalidate` yourself.

  /// `PATCH /api/users/admin/{email}`
  pub async fn make_admin(&self, email: &str, cancel: &CancellationToken) -> Result<()> {
    self
      .client
      .send_empty(Method::PATCH, &["api", "users", "admin", email], cancel)
      .await?;
    self.roles_changed(email).await;
    Ok(())
  }

  /// `PATCH /api/users/remove-admin/{email}`
  pub async fn remove_admin(&self, email: &str, cancel: &CancellationToken) -> Result<()> {
    self
      .client
      .send_empty(Method::PATCH, &["api", "users", "remove-admin", email], cancel)
      .await?;
    self.roles_changed(email).await;
    Ok(())
  }

  /// `PATCH /api/users/role/{email}`
  pub async fn set_role(&self, email: &str, role: Role, cancel: &CancellationToken) -> Result<()> {
    self
      .client
      .send_unit(Method::PATCH, &["api", "users", "role", email], &RoleChange { role }, cancel)
      .await?;
    self.roles_changed(email).await;
    Ok(())
  }

  /// `GET /api/users/teacher-details/{email}`
  pub async fn teacher_details(&self, email: &str, cancel: &CancellationToken) -> Result<UserRecord> {
    self
      .client
      .get_json(&["api", "users", "teacher-details", email], &[], cancel)
      .await
  }
}
