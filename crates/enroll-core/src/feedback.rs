//! Teaching-evaluation feedback left by students.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, require};

/// A 1–5 star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<u8> for Rating {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self> {
    if (1..=5).contains(&value) {
      Ok(Self(value))
    } else {
      Err(Error::InvalidRating(value))
    }
  }
}

impl From<Rating> for u8 {
  fn from(r: Rating) -> u8 { r.0 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
  pub student_email: String,
  pub class_id:      String,
  pub description:   String,
  pub rating:        Rating,
  pub created_at:    DateTime<Utc>,
  /// Display fields joined in by the backend on `GET /api/feedbacks`.
  #[serde(default, skip_serializing)]
  pub student_name:  Option<String>,
  #[serde(default, skip_serializing)]
  pub class_title:   Option<String>,
}

impl Feedback {
  pub fn new(
    student_email: impl Into<String>,
    class_id: impl Into<String>,
    description: &str,
    rating: u8,
  ) -> Result<Self> {
    require("description", description)?;
    Ok(Self {
      student_email: student_email.into(),
      class_id:      class_id.into(),
      description:   description.trim().to_string(),
      rating:        Rating::try_from(rating)?,
      created_at:    Utc::now(),
      student_name:  None,
      class_title:   None,
    })
  }
}
