use enroll_core::{
  principal::Role,
  user::{ApplicationReview, ApplicationStatus, TeacherApplication},
};
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::EnrollApi;
use crate::Result;

impl EnrollApi {
  /// `POST /api/teachers`. The application is always filed as pending.
  pub async fn apply_as_teacher(
    &self,
    application: &TeacherApplication,
    cancel: &CancellationToken,
  ) -> Result<()> {
    application.validate()?;
    let application = TeacherApplication {
      id: None,
      status: ApplicationStatus::Pending,
      ..application.clone()
    };
    self
      .client
      .send_unit(Method::POST, &["api", "teachers"], &application, cancel)
      .await
  }

  /// `GET /api/teachers`
  pub async fn teacher_requests(&self, cancel: &CancellationToken) -> Result<Vec<TeacherApplication>> {
    self.client.get_json(&["api", "teachers"], &[], cancel).await
  }

  /// Accept an application and promote its author to teacher.
  pub async fn approve_teacher(
    &self,
    application_id: &str,
    email: &str,
    cancel: &CancellationToken,
  ) -> Result<()> {
    self.review_application(application_id, ApplicationStatus::Accepted, cancel).await?;
    self.set_role(email, Role::Teacher, cancel).await?;
    info!(application_id, email, "teacher approved");
    Ok(())
  }

  pub async fn reject_teacher(&self, application_id: &str, cancel: &CancellationToken) -> Result<()> {
    self.review_application(application_id, ApplicationStatus::Rejected, cancel).await
  }

  /// `PATCH /api/teachers/{id}`
  async fn review_application(
    &self,
    application_id: &str,
    status: ApplicationStatus,
    cancel: &CancellationToken,
  ) -> Result<()> {
    self
      .client
      .send_unit(
        Method::PATCH,
        &["api", "teachers", application_id],
        &ApplicationReview { status },
        cancel,
      )
      .await
  }
}
