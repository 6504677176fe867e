use enroll_core::class::{Class, ClassPage, ClassStatus, ClassUpdate, NewClass, StatusChange};
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::EnrollApi;
use crate::Result;

impl EnrollApi {
  /// `GET /api/classes/approved?page=&limit=`
  pub async fn approved_classes(&self, page: u32, limit: u32, cancel: &CancellationToken) -> Result<ClassPage> {
    self
      .client
      .get_json(
        &["api", "classes", "approved"],
        &[("page", page.max(1).to_string()), ("limit", limit.max(1).to_string())],
        cancel,
      )
      .await
  }

  /// `GET /api/classes/{id}`
  pub async fn class(&self, id: &str, cancel: &CancellationToken) -> Result<Class> {
    self.client.get_json(&["api", "classes", id], &[], cancel).await
  }

  /// `GET /api/classes?email=`
  pub async fn classes_by_teacher(&self, email: &str, cancel: &CancellationToken) -> Result<Vec<Class>> {
    self
      .client
      .get_json(&["api", "classes"], &[("email", email.to_string())], cancel)
      .await
  }

  /// `GET /api/classes/all`
  pub async fn all_classes(&self, cancel: &CancellationToken) -> Result<Vec<Class>> {
    self.client.get_json(&["api", "classes", "all"], &[], cancel).await
  }

  /// `POST /api/classes`. The class enters review as pending whatever status
  /// the caller set.
  pub async fn create_class(&self, class: &NewClass, cancel: &CancellationToken) -> Result<()> {
    class.validate()?;
    let class = NewClass {
      status: ClassStatus::Pending,
      total_enrolled: 0,
      ..class.clone()
    };
    self
      .client
      .send_unit(Method::POST, &["api", "classes"], &class, cancel)
      .await?;
    info!(title = %class.title, "class submitted for review");
    Ok(())
  }

  /// `PATCH /api/classes/{id}`
  pub async fn update_class(&self, id: &str, update: &ClassUpdate, cancel: &CancellationToken) -> Result<()> {
    update.validate()?;
    self
      .client
      .send_unit(Method::PATCH, &["api", "classes", id], update, cancel)
      .await
  }

  /// Admin review: `PATCH /api/classes/{id}` with `{status}`.
  pub async fn set_class_status(&self, id: &str, status: ClassStatus, cancel: &CancellationToken) -> Result<()> {
    self
      .client
      .send_unit(Method::PATCH, &["api", "classes", id], &StatusChange { status }, cancel)
      .await?;
    info!(id, %status, "class reviewed");
    Ok(())
  }

  /// `DELETE /api/classes/{id}`
  pub async fn delete_class(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
    self
      .client
      .send_empty(Method::DELETE, &["api", "classes", id], cancel)
      .await
  }
}
