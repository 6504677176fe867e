//! Enrollments, payments and the checkout flow.

use std::future::Future;

use enroll_core::enrollment::{
  DailyRevenue, Enrollment, PaymentIntent, PaymentIntentRequest, revenue_by_day,
};
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{Count, EnrollApi};
use crate::{ClientError, Result};

// ─── Payment processor seam ───────────────────────────────────────────────────

/// Who is paying, as handed to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Billing {
  pub name:  Option<String>,
  pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
  Succeeded { transaction_id: String },
  Failed { message: String },
}

/// Confirms a server-issued payment intent with the card processor.
pub trait PaymentProcessor: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn confirm<'a>(
    &'a self,
    public_key: &'a str,
    client_secret: &'a str,
    billing: &'a Billing,
  ) -> impl Future<Output = Result<PaymentOutcome, Self::Error>> + Send + 'a;
}

fn enroll_key(student: &str, class_id: &str) -> String {
  format!("enroll:{}:{class_id}", student.to_lowercase())
}

// ─── Calls ────────────────────────────────────────────────────────────────────

impl EnrollApi {
  /// `GET /api/enrollments?studentEmail=&classId=`
  pub async fn enrollments_for(
    &self,
    student: &str,
    class_id: &str,
    cancel: &CancellationToken,
  ) -> Result<Vec<Enrollment>> {
    self
      .client
      .get_json(
        &["api", "enrollments"],
        &[("studentEmail", student.to_string()), ("classId", class_id.to_string())],
        cancel,
      )
      .await
  }

  /// Whether `student` already holds a paid enrollment in `class_id`.
  pub async fn is_paid(&self, student: &str, class_id: &str, cancel: &CancellationToken) -> Result<bool> {
    let enrollments = self.enrollments_for(student, class_id, cancel).await?;
    Ok(enrollments.iter().any(Enrollment::is_paid))
  }

  /// `POST /api/create-payment-intent`
  pub async fn create_payment_intent(&self, price: f64, cancel: &CancellationToken) -> Result<PaymentIntent> {
    self
      .client
      .send_json(
        Method::POST,
        &["api", "create-payment-intent"],
        &PaymentIntentRequest { price },
        cancel,
      )
      .await
  }

  /// `POST /api/enroll`. Fails fast while the same (student, class) write is
  /// still in flight.
  pub async fn record_enrollment(&self, enrollment: &Enrollment, cancel: &CancellationToken) -> Result<()> {
    let _ticket = self
      .writes
      .begin(enroll_key(&enrollment.student_email, &enrollment.class_id))?;
    self.write_enrollment(enrollment, cancel).await
  }

  async fn write_enrollment(&self, enrollment: &Enrollment, cancel: &CancellationToken) -> Result<()> {
    self
      .client
      .send_unit(Method::POST, &["api", "enroll"], enrollment, cancel)
      .await?;
    info!(
      student = %enrollment.student_email,
      class_id = %enrollment.class_id,
      "enrollment recorded"
    );
    Ok(())
  }

  /// Pay for `class_id` as the signed-in principal and record the enrollment.
  ///
  /// Once the processor reports success the enrollment is written even if
  /// `cancel` fires afterwards, since the charge has already happened.
  pub async fn checkout<P: PaymentProcessor>(
    &self,
    class_id: &str,
    processor: &P,
    cancel: &CancellationToken,
  ) -> Result<Enrollment> {
    let public_key = self.client.config().require_payment_key()?.to_string();
    let principal = self.session().principal().ok_or(ClientError::NotSignedIn)?;

    let class = self.class(class_id, cancel).await?;
    if !class.is_open() {
      return Err(ClientError::ClassNotOpen(class.id));
    }

    let _ticket = self.writes.begin(enroll_key(&principal.email, &class.id))?;
    if self.is_paid(&principal.email, &class.id, cancel).await? {
      return Err(ClientError::AlreadyEnrolled(class.id));
    }

    let intent = self.create_payment_intent(class.price, cancel).await?;
    let billing = Billing {
      name:  principal.display_name.clone(),
      email: principal.email.clone(),
    };

    let outcome = tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(ClientError::Cancelled),
      outcome = processor.confirm(&public_key, &intent.client_secret, &billing) => {
        outcome.map_err(|e| ClientError::PaymentFailed(e.to_string()))?
      }
    };

    match outcome {
      PaymentOutcome::Failed { message } => {
        warn!(class_id = %class.id, %message, "payment declined");
        Err(ClientError::PaymentFailed(message))
      }
      PaymentOutcome::Succeeded { transaction_id } => {
        let enrollment = Enrollment::paid(&principal, &class, transaction_id);
        self.write_enrollment(&enrollment, &CancellationToken::new()).await?;
        Ok(enrollment)
      }
    }
  }

  /// `GET /api/my-enrollments?studentEmail=`
  pub async fn my_enrollments(&self, email: &str, cancel: &CancellationToken) -> Result<Vec<Enrollment>> {
    self
      .client
      .get_json(&["api", "my-enrollments"], &[("studentEmail", email.to_string())], cancel)
      .await
  }

  /// `GET /api/enrollments/history/{email}`
  pub async fn payment_history(&self, email: &str, cancel: &CancellationToken) -> Result<Vec<Enrollment>> {
    self
      .client
      .get_json(&["api", "enrollments", "history", email], &[], cancel)
      .await
  }

  /// `GET /api/enrollments/history`
  pub async fn all_payments(&self, cancel: &CancellationToken) -> Result<Vec<Enrollment>> {
    self
      .client
      .get_json(&["api", "enrollments", "history"], &[], cancel)
      .await
  }

  /// Paid revenue per day across every enrollment.
  pub async fn revenue_overview(&self, cancel: &CancellationToken) -> Result<Vec<DailyRevenue>> {
    Ok(revenue_by_day(&self.all_payments(cancel).await?))
  }

  /// `GET /api/enrollments/count/{id}`
  pub async fn enrollment_count(&self, class_id: &str, cancel: &CancellationToken) -> Result<u64> {
    let Count { count } = self
      .client
      .get_json(&["api", "enrollments", "count", class_id], &[], cancel)
      .await?;
    Ok(count)
  }
}
