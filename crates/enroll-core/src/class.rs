//! Classes, created by a teacher, moved between lifecycle states by an admin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, require};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Review state of a class. Only `Approved` classes are open for enrollment.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClassStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A class as stored by the backend.
///
/// `name` and `email` identify the owning teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
  #[serde(rename = "_id")]
  pub id:             String,
  pub title:          String,
  #[serde(default)]
  pub description:    String,
  pub price:          f64,
  #[serde(default)]
  pub image:          Option<String>,
  #[serde(default)]
  pub name:           Option<String>,
  pub email:          String,
  #[serde(default)]
  pub category:       Option<String>,
  #[serde(default)]
  pub status:         ClassStatus,
  #[serde(default)]
  pub total_enrolled: u64,
  #[serde(default)]
  pub instructor_id:  Option<String>,
  #[serde(default)]
  pub created_at:     Option<DateTime<Utc>>,
}

impl Class {
  pub fn is_open(&self) -> bool { self.status == ClassStatus::Approved }
}

/// One page of the approved-class catalogue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPage {
  #[serde(default)]
  pub data:        Vec<Class>,
  #[serde(default)]
  pub total_pages: u32,
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Body of `POST /api/classes`. New classes always enter review as `Pending`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
  pub title:          String,
  pub description:    String,
  pub price:          f64,
  pub image:          String,
  pub name:           String,
  pub email:          String,
  pub category:       Option<String>,
  pub instructor_id:  String,
  pub status:         ClassStatus,
  pub total_enrolled: u64,
  pub created_at:     DateTime<Utc>,
}

impl NewClass {
  pub fn validate(&self) -> Result<()> {
    require("title", &self.title)?;
    require("description", &self.description)?;
    require("image", &self.image)?;
    check_price(self.price)
  }
}

/// Body of a teacher's `PATCH /api/classes/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassUpdate {
  pub title:       String,
  pub description: String,
  pub price:       f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category:    Option<String>,
}

impl ClassUpdate {
  pub fn validate(&self) -> Result<()> {
    require("title", &self.title)?;
    require("description", &self.description)?;
    check_price(self.price)
  }
}

/// Body of an admin's `PATCH /api/classes/{id}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusChange {
  pub status: ClassStatus,
}

fn check_price(price: f64) -> Result<()> {
  if price.is_finite() && price >= 0.0 {
    Ok(())
  } else {
    Err(Error::InvalidPrice(price))
  }
}
