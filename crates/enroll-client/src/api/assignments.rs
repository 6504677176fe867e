use enroll_core::assignment::{Assignment, ClassProgress, NewAssignment, Submission};
use reqwest::Method;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{Count, EnrollApi};
use crate::Result;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionTotal {
  #[serde(default)]
  total_submissions: u64,
}

impl EnrollApi {
  /// `GET /api/assignments?classId=`
  pub async fn assignments(&self, class_id: &str, cancel: &CancellationToken) -> Result<Vec<Assignment>> {
    self
      .client
      .get_json(&["api", "assignments"], &[("classId", class_id.to_string())], cancel)
      .await
  }

  /// `POST /api/assignments`
  pub async fn create_assignment(&self, assignment: &NewAssignment, cancel: &CancellationToken) -> Result<()> {
    assignment.validate()?;
    self
      .client
      .send_unit(Method::POST, &["api", "assignments"], assignment, cancel)
      .await
  }

  /// Record a submission, then bump the assignment's counter.
  ///
  /// Fails fast while a submission for the same (student, assignment) is in
  /// flight. A failed counter bump is logged, not returned: the submission
  /// itself is already stored.
  pub async fn submit_assignment(&self, submission: &Submission, cancel: &CancellationToken) -> Result<()> {
    let _ticket = self.writes.begin(format!(
      "submit:{}:{}",
      submission.student_email.to_lowercase(),
      submission.assignment_id
    ))?;

    self
      .client
      .send_unit(Method::POST, &["api", "submit-assignment"], submission, cancel)
      .await?;
    info!(assignment_id = %submission.assignment_id, "assignment submitted");

    let bump = self
      .client
      .send_empty(
        Method::PATCH,
        &["api", "assignments", "increment-submission", submission.assignment_id.as_str()],
        &CancellationToken::new(),
      )
      .await;
    if let Err(e) = bump {
      warn!(assignment_id = %submission.assignment_id, error = %e, "submission counter not updated");
    }
    Ok(())
  }

  /// `GET /api/assignments/submitted/{classId}`
  pub async fn submitted_assignments(&self, class_id: &str, cancel: &CancellationToken) -> Result<Vec<Submission>> {
    self
      .client
      .get_json(&["api", "assignments", "submitted", class_id], &[], cancel)
      .await
  }

  /// `GET /api/assignments/count/{classId}`
  pub async fn assignment_count(&self, class_id: &str, cancel: &CancellationToken) -> Result<u64> {
    let Count { count } = self
      .client
      .get_json(&["api", "assignments", "count", class_id], &[], cancel)
      .await?;
    Ok(count)
  }

  /// `GET /api/assignments/submissions/count/{classId}`
  pub async fn submission_count(&self, class_id: &str, cancel: &CancellationToken) -> Result<u64> {
    let SubmissionTotal { total_submissions } = self
      .client
      .get_json(&["api", "assignments", "submissions", "count", class_id], &[], cancel)
      .await?;
    Ok(total_submissions)
  }

  /// The owning teacher's counters for one class, fetched concurrently.
  pub async fn class_progress(&self, class_id: &str, cancel: &CancellationToken) -> Result<ClassProgress> {
    let (assignments, enrolled, submissions) = tokio::try_join!(
      self.assignment_count(class_id, cancel),
      self.enrollment_count(class_id, cancel),
      self.submission_count(class_id, cancel),
    )?;
    Ok(ClassProgress { assignments, enrolled, submissions })
  }
}
