//! Assignments and student submissions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, require};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
  #[serde(rename = "_id")]
  pub id:               String,
  pub class_id:         String,
  pub title:            String,
  #[serde(default)]
  pub description:      String,
  pub deadline:         NaiveDate,
  #[serde(default)]
  pub image:            Option<String>,
  #[serde(default)]
  pub submission_count: u64,
}

/// Body of `POST /api/assignments`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignment {
  pub class_id:    String,
  pub title:       String,
  pub description: String,
  pub deadline:    NaiveDate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image:       Option<String>,
}

impl NewAssignment {
  pub fn validate(&self) -> Result<()> {
    require("classId", &self.class_id)?;
    require("title", &self.title)?;
    require("description", &self.description)
  }
}

/// A student's answer to an assignment.
///
/// One submission per (assignment, student) is the intent, but nothing here
/// enforces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
  pub assignment_id:   String,
  pub class_id:        String,
  pub student_email:   String,
  pub submission_text: String,
  pub submitted_at:    DateTime<Utc>,
}

impl Submission {
  pub fn new(
    assignment_id: impl Into<String>,
    class_id: impl Into<String>,
    student_email: impl Into<String>,
    text: &str,
  ) -> Result<Self> {
    require("submissionText", text)?;
    Ok(Self {
      assignment_id:   assignment_id.into(),
      class_id:        class_id.into(),
      student_email:   student_email.into(),
      submission_text: text.to_string(),
      submitted_at:    Utc::now(),
    })
  }
}

/// Per-class counters shown to the owning teacher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassProgress {
  pub assignments: u64,
  pub enrolled:    u64,
  pub submissions: u64,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Error;

  #[test]
  fn blank_answer_is_rejected() {
    let err = Submission::new("a1", "c1", "s@example.com", "   \n").unwrap_err();
    assert!(matches!(err, Error::MissingField("submissionText")));
  }

  #[test]
  fn assignment_reads_backend_shape() {
    let raw = r#"{"_id":"a1","classId":"c1","title":"Borrowck","deadline":"2025-06-01"}"#;
    let a: Assignment = serde_json::from_str(raw).unwrap();
    assert_eq!(a.deadline, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    assert_eq!(a.submission_count, 0);
  }
}
