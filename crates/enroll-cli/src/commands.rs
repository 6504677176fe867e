//! Subcommands and their execution.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::{Subcommand, ValueEnum};
use enroll_client::{
  AuthClient, CancellationToken, EnrollApi, Session, roles::RoleDirectory,
};
use enroll_core::{
  assignment::Submission,
  class::ClassStatus,
  feedback::Feedback,
  principal::{BearerToken, Principal, validate_email},
};
use serde::Serialize;

use crate::{forget_session, save_session};

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Store a principal and its identity token for later commands.
  Login {
    #[arg(long)]
    email: String,
    /// Identity token issued by the identity provider.
    #[arg(long, env = "ENROLL_TOKEN")]
    token: String,
    /// User id at the identity provider; read from the token's `sub` claim
    /// when omitted.
    #[arg(long)]
    uid:   Option<String>,
    #[arg(long)]
    name:  Option<String>,
  },
  /// Forget the stored principal.
  Logout,
  /// Show the stored principal and its roles.
  Whoami,
  /// List approved classes.
  Classes {
    #[arg(long, default_value_t = 1)]
    page:  u32,
    #[arg(long, default_value_t = 10)]
    limit: u32,
  },
  /// Show one class.
  Class { id: String },
  /// Classes you teach.
  MyClasses,
  /// Classes you are enrolled in.
  Enrollments,
  /// Your payment history.
  Payments,
  /// Assignments for a class.
  Assignments { class: String },
  /// Submit an answer to an assignment.
  Submit {
    assignment: String,
    #[arg(long)]
    class:      String,
    #[arg(long)]
    text:       String,
  },
  /// Rate a class you took.
  Feedback {
    class:  String,
    #[arg(long)]
    rating: u8,
    #[arg(long)]
    text:   String,
  },
  /// Assignment, enrollment and submission counts for a class you teach.
  Progress { class: String },
  /// Site-wide totals.
  Stats,
  /// List users (admin).
  Users {
    #[arg(long)]
    search: Option<String>,
  },
  /// Approve or reject a pending class (admin).
  Review { class: String, decision: Decision },
  /// Pending teacher applications (admin).
  TeacherRequests,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Decision {
  Approve,
  Reject,
}

impl From<Decision> for ClassStatus {
  fn from(d: Decision) -> Self {
    match d {
      Decision::Approve => ClassStatus::Approved,
      Decision::Reject => ClassStatus::Rejected,
    }
  }
}

pub async fn run(
  command: Command,
  client: &AuthClient,
  session_path: &Path,
  cancel: &CancellationToken,
) -> Result<()> {
  let api = EnrollApi::new(client.clone());

  match command {
    Command::Login { email, token, uid, name } => {
      let email = validate_email(&email)?.to_string();
      let token = BearerToken::new(token);
      let Some(uid) = uid.or_else(|| token.subject()) else {
        bail!("the token carries no `sub` claim; pass --uid");
      };
      let mut principal = Principal::new(uid, email, token);
      principal.display_name = name;

      let session = Session::signed_in(principal.clone());
      let client = AuthClient::new(client.config().clone(), session, client.navigator().clone())?;
      EnrollApi::new(client)
        .mirror_principal(&principal, cancel)
        .await
        .context("registering with the backend")?;

      save_session(session_path, &principal)?;
      println!("Signed in as {}", principal.email);
    }
    Command::Logout => {
      forget_session(session_path)?;
      println!("Signed out");
    }
    Command::Whoami => {
      let me = signed_in(client)?;
      let roles = RoleDirectory::new(client.clone());
      let (admin, teacher) = tokio::join!(
        roles.is_admin(&me.email, cancel),
        roles.is_teacher(&me.email, cancel),
      );
      print(&serde_json::json!({
        "email": me.email,
        "name": me.display_name,
        "admin": admin,
        "teacher": teacher,
      }))?;
    }
    Command::Classes { page, limit } => print(&api.approved_classes(page, limit, cancel).await?)?,
    Command::Class { id } => print(&api.class(&id, cancel).await?)?,
    Command::MyClasses => {
      let me = signed_in(client)?;
      print(&api.classes_by_teacher(&me.email, cancel).await?)?;
    }
    Command::Enrollments => {
      let me = signed_in(client)?;
      print(&api.my_enrollments(&me.email, cancel).await?)?;
    }
    Command::Payments => {
      let me = signed_in(client)?;
      print(&api.payment_history(&me.email, cancel).await?)?;
    }
    Command::Assignments { class } => print(&api.assignments(&class, cancel).await?)?,
    Command::Submit { assignment, class, text } => {
      let me = signed_in(client)?;
      let submission = Submission::new(assignment, class, me.email, &text)?;
      api.submit_assignment(&submission, cancel).await?;
      println!("Submitted");
    }
    Command::Feedback { class, rating, text } => {
      let me = signed_in(client)?;
      let feedback = Feedback::new(me.email, class, &text, rating)?;
      api.submit_feedback(&feedback, cancel).await?;
      println!("Thanks for the feedback");
    }
    Command::Progress { class } => print(&api.class_progress(&class, cancel).await?)?,
    Command::Stats => print(&api.stats(cancel).await?)?,
    Command::Users { search } => print(&api.list_users(search.as_deref(), cancel).await?)?,
    Command::Review { class, decision } => {
      api.set_class_status(&class, decision.into(), cancel).await?;
      println!("Class {class} {}", ClassStatus::from(decision));
    }
    Command::TeacherRequests => print(&api.teacher_requests(cancel).await?)?,
  }
  Ok(())
}

fn signed_in(client: &AuthClient) -> Result<Principal> {
  match client.session().principal() {
    Some(p) => Ok(p),
    None => bail!("not signed in; run `enroll login` first"),
  }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
