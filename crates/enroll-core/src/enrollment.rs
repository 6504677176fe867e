//! Enrollments and payments.
//!
//! An enrollment is written once the payment processor reports success. The
//! client does not enforce one enrollment per (student, class) pair; the
//! backend is the authority on duplicates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{class::Class, principal::Principal};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
  Paid,
  Pending,
  Failed,
}

/// The durable record linking a student to a paid class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
  #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
  pub id:             Option<String>,
  #[serde(default)]
  pub student_name:   Option<String>,
  pub student_email:  String,
  pub class_id:       String,
  #[serde(default)]
  pub title:          String,
  #[serde(default)]
  pub price:          f64,
  #[serde(default)]
  pub teacher_name:   Option<String>,
  #[serde(default)]
  pub teacher_email:  Option<String>,
  #[serde(default)]
  pub image:          Option<String>,
  pub transaction_id: String,
  pub payment_status: PaymentStatus,
  pub enrolled_at:    DateTime<Utc>,
}

impl Enrollment {
  /// Build the record written after a successful payment for `class`.
  pub fn paid(student: &Principal, class: &Class, transaction_id: impl Into<String>) -> Self {
    Self {
      id:             None,
      student_name:   student.display_name.clone(),
      student_email:  student.email.clone(),
      class_id:       class.id.clone(),
      title:          class.title.clone(),
      price:          class.price,
      teacher_name:   class.name.clone(),
      teacher_email:  Some(class.email.clone()),
      image:          class.image.clone(),
      transaction_id: transaction_id.into(),
      payment_status: PaymentStatus::Paid,
      enrolled_at:    Utc::now(),
    }
  }

  pub fn is_paid(&self) -> bool { self.payment_status == PaymentStatus::Paid }
}

// ─── Payment intents ─────────────────────────────────────────────────────────

/// Body of `POST /api/create-payment-intent`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PaymentIntentRequest {
  pub price: f64,
}

/// A server-issued payment intent, confirmed client-side by the processor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
  pub client_secret: String,
}

// ─── Revenue overview ────────────────────────────────────────────────────────

/// Paid revenue for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
  pub date:   NaiveDate,
  pub amount: f64,
}

/// Sum paid enrollments per day, keeping days in first-seen order.
pub fn revenue_by_day(enrollments: &[Enrollment]) -> Vec<DailyRevenue> {
  let mut days: Vec<DailyRevenue> = Vec::new();
  for e in enrollments.iter().filter(|e| e.is_paid()) {
    let date = e.enrolled_at.date_naive();
    match days.iter_mut().find(|d| d.date == date) {
      Some(day) => day.amount += e.price,
      None => days.push(DailyRevenue { date, amount: e.price }),
    }
  }
  days
}
