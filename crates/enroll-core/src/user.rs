//! Backend user records, teacher applications and site statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Result, principal::{Principal, Role, validate_email}, require};

/// Avatar used when the identity provider has no photo for the user.
pub const DEFAULT_AVATAR: &str = "https://i.ibb.co/4pDNDk1/avatar.png";

// ─── Users ───────────────────────────────────────────────────────────────────

/// The backend's mirror of an identity-provider user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
  #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
  pub id:         Option<String>,
  pub name:       String,
  pub email:      String,
  #[serde(default, alias = "image")]
  pub photo_url:  Option<String>,
  #[serde(default)]
  pub role:       Role,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

impl UserRecord {
  /// The record written the first time `principal` signs in.
  pub fn student(principal: &Principal) -> Self {
    Self {
      id:         None,
      name:       principal
        .display_name
        .clone()
        .unwrap_or_else(|| "Unknown".to_string()),
      email:      principal.email.clone(),
      photo_url:  Some(
        principal
          .photo_url
          .clone()
          .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
      ),
      role:       Role::Student,
      created_at: Some(Utc::now()),
    }
  }
}

/// Body of `PATCH /api/users/role/{email}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RoleChange {
  pub role: Role,
}

// ─── Teacher applications ────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApplicationStatus {
  #[default]
  Pending,
  Accepted,
  Rejected,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Experience {
  #[default]
  Beginner,
  MidLevel,
  Experienced,
}

/// A request to teach on the platform, reviewed by an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherApplication {
  #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
  pub id:         Option<String>,
  pub name:       String,
  pub email:      String,
  #[serde(default)]
  pub image:      Option<String>,
  #[serde(default)]
  pub experience: Experience,
  pub title:      String,
  pub category:   String,
  #[serde(default)]
  pub status:     ApplicationStatus,
}

impl TeacherApplication {
  pub fn validate(&self) -> Result<()> {
    require("name", &self.name)?;
    validate_email(&self.email)?;
    require("title", &self.title)?;
    require("category", &self.category)
  }
}

/// Body of `PATCH /api/teachers/{id}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ApplicationReview {
  pub status: ApplicationStatus,
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// Site-wide totals from `GET /api/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
  #[serde(default)]
  pub total_users:       u64,
  #[serde(default)]
  pub total_classes:     u64,
  #[serde(default)]
  pub total_enrollments: u64,
}
