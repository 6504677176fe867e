use enroll_core::{feedback::Feedback, user::Stats};
use reqwest::Method;
use tokio_util::sync::CancellationToken;

use super::EnrollApi;
use crate::Result;

impl EnrollApi {
  /// `POST /api/feedback`. Fails fast while feedback for the same
  /// (student, class) is in flight.
  pub async fn submit_feedback(&self, feedback: &Feedback, cancel: &CancellationToken) -> Result<()> {
    let _ticket = self.writes.begin(format!(
      "feedback:{}:{}",
      feedback.student_email.to_lowercase(),
      feedback.class_id
    ))?;
    self
      .client
      .send_unit(Method::POST, &["api", "feedback"], feedback, cancel)
      .await
  }

  /// `GET /api/feedbacks`
  pub async fn feedbacks(&self, cancel: &CancellationToken) -> Result<Vec<Feedback>> {
    self.client.get_json(&["api", "feedbacks"], &[], cancel).await
  }

  /// `GET /api/stats`
  pub async fn stats(&self, cancel: &CancellationToken) -> Result<Stats> {
    self.client.get_json(&["api", "stats"], &[], cancel).await
  }
}
