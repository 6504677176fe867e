//! An in-process stand-in for the enrollment backend.
//!
//! Tokens map to accounts; a request with an unknown or missing token gets a
//! `401`, an authenticated non-admin on an admin route gets a `403`. Every
//! request's `Authorization` and `x-request-id` headers are recorded in
//! arrival order.

use std::{
  collections::{HashMap, HashSet},
  net::SocketAddr,
  sync::{Arc, Mutex, MutexGuard},
  time::Duration,
};

use axum::{
  Json, Router,
  extract::{Path, Query, Request, State},
  http::{HeaderMap, StatusCode, header::AUTHORIZATION},
  middleware::{self, Next},
  response::{IntoResponse, Response},
  routing::{get, patch, post},
};
use enroll_core::{
  assignment::{Assignment, Submission},
  class::{Class, ClassPage, ClassStatus},
  enrollment::Enrollment,
  feedback::Feedback,
  principal::{Privilege, Role},
  user::{ApplicationStatus, Stats, TeacherApplication, UserRecord},
};
use serde_json::{Value, json};

type Reply<T> = Result<Json<T>, StatusCode>;
type Params = Query<HashMap<String, String>>;

#[derive(Debug, Clone)]
pub struct Seen {
  pub path:       String,
  pub auth:       Option<String>,
  pub request_id: Option<String>,
}

#[derive(Default)]
struct Db {
  accounts:        HashMap<String, String>,
  admins:          HashSet<String>,
  teachers:        HashSet<String>,
  users:           Vec<UserRecord>,
  applications:    Vec<TeacherApplication>,
  classes:         Vec<Class>,
  enrollments:     Vec<Enrollment>,
  assignments:     Vec<Assignment>,
  submissions:     Vec<Submission>,
  feedback:        Vec<Feedback>,
  seen:            Vec<Seen>,
  delay:           Duration,
  malformed_roles: bool,
  next_id:         u64,
}

impl Db {
  fn caller(&self, headers: &HeaderMap) -> Result<String, StatusCode> {
    headers
      .get(AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "))
      .and_then(|token| self.accounts.get(token))
      .cloned()
      .ok_or(StatusCode::UNAUTHORIZED)
  }

  fn admin(&self, headers: &HeaderMap) -> Result<String, StatusCode> {
    let email = self.caller(headers)?;
    if self.admins.contains(&email) { Ok(email) } else { Err(StatusCode::FORBIDDEN) }
  }

  fn id(&mut self, prefix: &str) -> String {
    self.next_id += 1;
    format!("{prefix}{}", self.next_id)
  }
}

#[derive(Clone)]
pub struct FakeBackend {
  db:       Arc<Mutex<Db>>,
  pub addr: SocketAddr,
}

impl FakeBackend {
  pub async fn start() -> Self {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = Self {
      db:   Arc::new(Mutex::new(Db::default())),
      addr: listener.local_addr().unwrap(),
    };
    let app = router(backend.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    backend
  }

  pub fn url(&self) -> String { format!("http://{}", self.addr) }

  fn lock(&self) -> MutexGuard<'_, Db> { self.db.lock().unwrap() }

  // ── Seeding ───────────────────────────────────────────────────────────────

  pub fn account(&self, token: &str, email: &str) {
    self.lock().accounts.insert(token.to_string(), email.to_string());
  }

  /// Expire `token` on the server side only.
  pub fn revoke(&self, token: &str) { self.lock().accounts.remove(token); }

  pub fn grant(&self, email: &str, privilege: Privilege) {
    let mut db = self.lock();
    match privilege {
      Privilege::Admin => db.admins.insert(email.to_string()),
      Privilege::Teacher => db.teachers.insert(email.to_string()),
    };
  }

  pub fn revoke_privilege(&self, email: &str, privilege: Privilege) {
    let mut db = self.lock();
    match privilege {
      Privilege::Admin => db.admins.remove(email),
      Privilege::Teacher => db.teachers.remove(email),
    };
  }

  pub fn add_class(&self, id: &str, title: &str, price: f64, status: ClassStatus) {
    self.lock().classes.push(Class {
      id: id.to_string(),
      title: title.to_string(),
      description: format!("{title} from scratch"),
      price,
      image: None,
      name: Some("Tess Teacher".to_string()),
      email: "teacher@example.com".to_string(),
      category: None,
      status,
      total_enrolled: 0,
      instructor_id: None,
      created_at: None,
    });
  }

  pub fn add_assignment(&self, id: &str, class_id: &str) {
    self.lock().assignments.push(Assignment {
      id: id.to_string(),
      class_id: class_id.to_string(),
      title: format!("Assignment {id}"),
      description: String::new(),
      deadline: chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
      image: None,
      submission_count: 0,
    });
  }

  /// Hold every role lookup and write for `delay` before answering.
  pub fn set_delay(&self, delay: Duration) { self.lock().delay = delay; }

  pub fn set_malformed_roles(&self, on: bool) { self.lock().malformed_roles = on; }

  // ── Inspection ────────────────────────────────────────────────────────────

  pub fn seen(&self) -> Vec<Seen> { self.lock().seen.clone() }

  pub fn seen_at(&self, path: &str) -> Vec<Seen> {
    self.seen().into_iter().filter(|s| s.path == path).collect()
  }

  pub fn hits(&self, path: &str) -> usize { self.seen_at(path).len() }

  pub fn last_auth(&self) -> Option<String> {
    self.lock().seen.last().and_then(|s| s.auth.clone())
  }

  pub fn enrollments(&self) -> Vec<Enrollment> { self.lock().enrollments.clone() }

  pub fn submissions(&self) -> Vec<Submission> { self.lock().submissions.clone() }

  pub fn feedback(&self) -> Vec<Feedback> { self.lock().feedback.clone() }

  pub fn users(&self) -> Vec<UserRecord> { self.lock().users.clone() }

  pub fn classes(&self) -> Vec<Class> { self.lock().classes.clone() }

  pub fn assignment(&self, id: &str) -> Option<Assignment> {
    self.lock().assignments.iter().find(|a| a.id == id).cloned()
  }

  pub fn applications(&self) -> Vec<TeacherApplication> { self.lock().applications.clone() }

  async fn pause(&self) {
    let delay = self.lock().delay;
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
  }
}

fn router(backend: FakeBackend) -> Router {
  Router::new()
    .route("/api/whoami", get(whoami))
    .route("/api/admin/report", get(admin_report))
    .route("/api/slow", get(slow_unauthorized))
    .route("/api/teapot", get(teapot))
    // Users
    .route("/api/users", get(list_users).post(save_user))
    .route("/api/users/{email}", get(one_user))
    .route("/api/users/admin/{email}", get(admin_flag).patch(make_admin))
    .route("/api/users/remove-admin/{email}", patch(remove_admin))
    .route("/api/users/teacher/{email}", get(teacher_flag))
    .route("/api/users/teacher-details/{email}", get(teacher_details))
    .route("/api/users/role/{email}", patch(set_role))
    // Teachers
    .route("/api/teachers", get(list_applications).post(apply))
    .route("/api/teachers/{id}", patch(review_application))
    // Classes
    .route("/api/classes", get(classes_by_teacher).post(create_class))
    .route("/api/classes/approved", get(approved_classes))
    .route("/api/classes/all", get(all_classes))
    .route("/api/classes/{id}", get(one_class).patch(patch_class).delete(delete_class))
    // Enrollments
    .route("/api/enrollments", get(enrollments_for))
    .route("/api/enrollments/history", get(all_payments))
    .route("/api/enrollments/history/{email}", get(payment_history))
    .route("/api/enrollments/count/{id}", get(enrollment_count))
    .route("/api/create-payment-intent", post(payment_intent))
    .route("/api/enroll", post(enroll))
    .route("/api/my-enrollments", get(my_enrollments))
    // Assignments
    .route("/api/assignments", get(assignments).post(create_assignment))
    .route("/api/assignments/count/{id}", get(assignment_count))
    .route("/api/assignments/submitted/{id}", get(submitted_assignments))
    .route("/api/assignments/submissions/count/{id}", get(submission_count))
    .route("/api/assignments/increment-submission/{id}", patch(increment_submission))
    .route("/api/submit-assignment", post(submit_assignment))
    // Feedback & stats
    .route("/api/feedback", post(submit_feedback))
    .route("/api/feedbacks", get(feedbacks))
    .route("/api/stats", get(stats))
    .layer(middleware::from_fn_with_state(backend.clone(), record))
    .with_state(backend)
}

async fn record(State(b): State<FakeBackend>, req: Request, next: Next) -> Response {
  let seen = {
    let headers = req.headers();
    let header = |name: &str| {
      headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    };
    Seen {
      path:       req.uri().path().to_string(),
      auth:       header(AUTHORIZATION.as_str()),
      request_id: header("x-request-id"),
    }
  };
  b.lock().seen.push(seen);
  next.run(req).await
}

// ─── Diagnostics ──────────────────────────────────────────────────────────────

async fn whoami(State(b): State<FakeBackend>, headers: HeaderMap) -> Reply<Value> {
  let email = b.lock().caller(&headers)?;
  Ok(Json(json!({ "email": email })))
}

async fn admin_report(State(b): State<FakeBackend>, headers: HeaderMap) -> Reply<Value> {
  b.lock().admin(&headers)?;
  Ok(Json(json!({ "revenue": 42 })))
}

async fn slow_unauthorized() -> StatusCode {
  tokio::time::sleep(Duration::from_secs(2)).await;
  StatusCode::UNAUTHORIZED
}

async fn teapot() -> (StatusCode, &'static str) { (StatusCode::IM_A_TEAPOT, "short and stout") }

// ─── Users ────────────────────────────────────────────────────────────────────

async fn list_users(State(b): State<FakeBackend>, headers: HeaderMap, Query(q): Params) -> Reply<Vec<UserRecord>> {
  let db = b.lock();
  db.admin(&headers)?;
  let search = q.get("search").map(|s| s.to_lowercase()).unwrap_or_default();
  Ok(Json(
    db.users
      .iter()
      .filter(|u| u.name.to_lowercase().contains(&search) || u.email.contains(&search))
      .cloned()
      .collect(),
  ))
}

async fn save_user(State(b): State<FakeBackend>, headers: HeaderMap, Json(user): Json<UserRecord>) -> Reply<Value> {
  let mut db = b.lock();
  db.caller(&headers)?;
  if db.users.iter().any(|u| u.email == user.email) {
    return Ok(Json(json!({ "message": "user already exists" })));
  }
  db.users.push(user);
  Ok(Json(json!({ "acknowledged": true })))
}

async fn admin_flag(State(b): State<FakeBackend>, headers: HeaderMap, Path(email): Path<String>) -> Response {
  role_flag(b, headers, email, Privilege::Admin).await
}

async fn teacher_flag(State(b): State<FakeBackend>, headers: HeaderMap, Path(email): Path<String>) -> Response {
  role_flag(b, headers, email, Privilege::Teacher).await
}

async fn role_flag(b: FakeBackend, headers: HeaderMap, email: String, privilege: Privilege) -> Response {
  b.pause().await;
  let db = b.lock();
  if let Err(status) = db.caller(&headers) {
    return status.into_response();
  }
  if db.malformed_roles {
    return "definitely not json".into_response();
  }
  match privilege {
    Privilege::Admin => Json(json!({ "admin": db.admins.contains(&email) })).into_response(),
    Privilege::Teacher => Json(json!({ "teacher": db.teachers.contains(&email) })).into_response(),
  }
}

async fn one_user(State(b): State<FakeBackend>, headers: HeaderMap, Path(email): Path<String>) -> Reply<UserRecord> {
  let db = b.lock();
  db.caller(&headers)?;
  db.users.iter().find(|u| u.email == email).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn make_admin(State(b): State<FakeBackend>, headers: HeaderMap, Path(email): Path<String>) -> Reply<Value> {
  let mut db = b.lock();
  db.admin(&headers)?;
  if let Some(user) = db.users.iter_mut().find(|u| u.email == email) {
    user.role = Role::Admin;
  }
  db.admins.insert(email);
  Ok(Json(json!({ "modifiedCount": 1 })))
}

async fn remove_admin(State(b): State<FakeBackend>, headers: HeaderMap, Path(email): Path<String>) -> Reply<Value> {
  let mut db = b.lock();
  db.admin(&headers)?;
  if let Some(user) = db.users.iter_mut().find(|u| u.email == email) {
    user.role = Role::Student;
  }
  db.admins.remove(&email);
  Ok(Json(json!({ "modifiedCount": 1 })))
}

async fn teacher_details(State(b): State<FakeBackend>, headers: HeaderMap, Path(email): Path<String>) -> Reply<UserRecord> {
  let db = b.lock();
  db.caller(&headers)?;
  db.users
    .iter()
    .find(|u| u.email == email && u.role == Role::Teacher)
    .cloned()
    .map(Json)
    .ok_or(StatusCode::NOT_FOUND)
}

async fn set_role(
  State(b): State<FakeBackend>,
  headers: HeaderMap,
  Path(email): Path<String>,
  Json(body): Json<Value>,
) -> Reply<Value> {
  let mut db = b.lock();
  db.admin(&headers)?;
  let role: Role = serde_json::from_value(body["role"].clone()).map_err(|_| StatusCode::BAD_REQUEST)?;
  if let Some(user) = db.users.iter_mut().find(|u| u.email == email) {
    user.role = role;
  }
  match role {
    Role::Teacher => db.teachers.insert(email),
    Role::Admin => db.admins.insert(email),
    Role::Student => false,
  };
  Ok(Json(json!({ "modifiedCount": 1 })))
}

// ─── Teachers ─────────────────────────────────────────────────────────────────

async fn list_applications(State(b): State<FakeBackend>, headers: HeaderMap) -> Reply<Vec<TeacherApplication>> {
  let db = b.lock();
  db.admin(&headers)?;
  Ok(Json(db.applications.clone()))
}

async fn apply(
  State(b): State<FakeBackend>,
  headers: HeaderMap,
  Json(mut application): Json<TeacherApplication>,
) -> Reply<Value> {
  let mut db = b.lock();
  db.caller(&headers)?;
  application.id = Some(db.id("app"));
  db.applications.push(application);
  Ok(Json(json!({ "acknowledged": true })))
}

async fn review_application(
  State(b): State<FakeBackend>,
  headers: HeaderMap,
  Path(id): Path<String>,
  Json(body): Json<Value>,
) -> Reply<Value> {
  let mut db = b.lock();
  db.admin(&headers)?;
  let status: ApplicationStatus =
    serde_json::from_value(body["status"].clone()).map_err(|_| StatusCode::BAD_REQUEST)?;
  let app = db
    .applications
    .iter_mut()
    .find(|a| a.id.as_deref() == Some(id.as_str()))
    .ok_or(StatusCode::NOT_FOUND)?;
  app.status = status;
  Ok(Json(json!({ "modifiedCount": 1 })))
}

// ─── Classes ──────────────────────────────────────────────────────────────────

async fn approved_classes(State(b): State<FakeBackend>, Query(q): Params) -> Json<ClassPage> {
  let page: usize = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
  let limit: usize = q.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10).max(1);
  let db = b.lock();
  let open: Vec<Class> = db.classes.iter().filter(|c| c.is_open()).cloned().collect();
  let total_pages = open.len().div_ceil(limit) as u32;
  let data = open.into_iter().skip((page - 1) * limit).take(limit).collect();
  Json(ClassPage { data, total_pages })
}

async fn classes_by_teacher(State(b): State<FakeBackend>, headers: HeaderMap, Query(q): Params) -> Reply<Vec<Class>> {
  let db = b.lock();
  db.caller(&headers)?;
  let email = q.get("email").cloned().unwrap_or_default();
  Ok(Json(db.classes.iter().filter(|c| c.email == email).cloned().collect()))
}

async fn all_classes(State(b): State<FakeBackend>, headers: HeaderMap) -> Reply<Vec<Class>> {
  let db = b.lock();
  db.admin(&headers)?;
  Ok(Json(db.classes.clone()))
}

async fn one_class(State(b): State<FakeBackend>, Path(id): Path<String>) -> Reply<Class> {
  let db = b.lock();
  db.classes
    .iter()
    .find(|c| c.id == id)
    .cloned()
    .map(Json)
    .ok_or(StatusCode::NOT_FOUND)
}

async fn create_class(State(b): State<FakeBackend>, headers: HeaderMap, Json(mut body): Json<Value>) -> Reply<Value> {
  let mut db = b.lock();
  db.caller(&headers)?;
  let id = db.id("class");
  body["_id"] = json!(id);
  let class: Class = serde_json::from_value(body).map_err(|_| StatusCode::BAD_REQUEST)?;
  db.classes.push(class);
  Ok(Json(json!({ "insertedId": id })))
}

async fn patch_class(
  State(b): State<FakeBackend>,
  headers: HeaderMap,
  Path(id): Path<String>,
  Json(body): Json<Value>,
) -> Reply<Value> {
  let mut db = b.lock();
  let status_only = body.as_object().is_some_and(|o| o.len() == 1 && o.contains_key("status"));
  if status_only {
    db.admin(&headers)?;
  } else {
    db.caller(&headers)?;
  }
  let class = db.classes.iter_mut().find(|c| c.id == id).ok_or(StatusCode::NOT_FOUND)?;
  if status_only {
    class.status = serde_json::from_value(body["status"].clone()).map_err(|_| StatusCode::BAD_REQUEST)?;
  } else {
    if let Some(title) = body["title"].as_str() {
      class.title = title.to_string();
    }
    if let Some(price) = body["price"].as_f64() {
      class.price = price;
    }
  }
  Ok(Json(json!({ "modifiedCount": 1 })))
}

async fn delete_class(State(b): State<FakeBackend>, headers: HeaderMap, Path(id): Path<String>) -> Reply<Value> {
  let mut db = b.lock();
  db.caller(&headers)?;
  db.classes.retain(|c| c.id != id);
  Ok(Json(json!({ "deletedCount": 1 })))
}

// ─── Enrollments ──────────────────────────────────────────────────────────────

async fn enrollments_for(State(b): State<FakeBackend>, headers: HeaderMap, Query(q): Params) -> Reply<Vec<Enrollment>> {
  let db = b.lock();
  db.caller(&headers)?;
  let student = q.get("studentEmail").cloned().unwrap_or_default();
  let class_id = q.get("classId").cloned().unwrap_or_default();
  Ok(Json(
    db.enrollments
      .iter()
      .filter(|e| e.student_email == student && e.class_id == class_id)
      .cloned()
      .collect(),
  ))
}

async fn all_payments(State(b): State<FakeBackend>, headers: HeaderMap) -> Reply<Vec<Enrollment>> {
  let db = b.lock();
  db.admin(&headers)?;
  Ok(Json(db.enrollments.clone()))
}

async fn payment_history(State(b): State<FakeBackend>, headers: HeaderMap, Path(email): Path<String>) -> Reply<Vec<Enrollment>> {
  let db = b.lock();
  db.caller(&headers)?;
  Ok(Json(db.enrollments.iter().filter(|e| e.student_email == email).cloned().collect()))
}

async fn enrollment_count(State(b): State<FakeBackend>, headers: HeaderMap, Path(id): Path<String>) -> Reply<Value> {
  let db = b.lock();
  db.caller(&headers)?;
  let count = db.enrollments.iter().filter(|e| e.class_id == id).count();
  Ok(Json(json!({ "count": count })))
}

async fn payment_intent(State(b): State<FakeBackend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply<Value> {
  b.lock().caller(&headers)?;
  let price = body["price"].as_f64().ok_or(StatusCode::BAD_REQUEST)?;
  Ok(Json(json!({ "clientSecret": format!("cs_{}", (price * 100.0) as u64) })))
}

async fn enroll(State(b): State<FakeBackend>, headers: HeaderMap, Json(enrollment): Json<Enrollment>) -> Reply<Value> {
  b.lock().caller(&headers)?;
  b.pause().await;
  let mut db = b.lock();
  if let Some(class) = db.classes.iter_mut().find(|c| c.id == enrollment.class_id) {
    class.total_enrolled += 1;
  }
  db.enrollments.push(enrollment);
  Ok(Json(json!({ "acknowledged": true })))
}

async fn my_enrollments(State(b): State<FakeBackend>, headers: HeaderMap, Query(q): Params) -> Reply<Vec<Enrollment>> {
  let db = b.lock();
  db.caller(&headers)?;
  let student = q.get("studentEmail").cloned().unwrap_or_default();
  Ok(Json(db.enrollments.iter().filter(|e| e.student_email == student).cloned().collect()))
}

// ─── Assignments ──────────────────────────────────────────────────────────────

async fn assignments(State(b): State<FakeBackend>, headers: HeaderMap, Query(q): Params) -> Reply<Vec<Assignment>> {
  let db = b.lock();
  db.caller(&headers)?;
  let class_id = q.get("classId").cloned().unwrap_or_default();
  Ok(Json(db.assignments.iter().filter(|a| a.class_id == class_id).cloned().collect()))
}

async fn create_assignment(State(b): State<FakeBackend>, headers: HeaderMap, Json(mut body): Json<Value>) -> Reply<Value> {
  let mut db = b.lock();
  db.caller(&headers)?;
  let id = db.id("asg");
  body["_id"] = json!(id);
  let assignment: Assignment = serde_json::from_value(body).map_err(|_| StatusCode::BAD_REQUEST)?;
  db.assignments.push(assignment);
  Ok(Json(json!({ "insertedId": id })))
}

async fn assignment_count(State(b): State<FakeBackend>, headers: HeaderMap, Path(id): Path<String>) -> Reply<Value> {
  let db = b.lock();
  db.caller(&headers)?;
  let count = db.assignments.iter().filter(|a| a.class_id == id).count();
  Ok(Json(json!({ "count": count })))
}

async fn submitted_assignments(State(b): State<FakeBackend>, headers: HeaderMap, Path(id): Path<String>) -> Reply<Vec<Submission>> {
  let db = b.lock();
  db.caller(&headers)?;
  Ok(Json(db.submissions.iter().filter(|s| s.class_id == id).cloned().collect()))
}

async fn submission_count(State(b): State<FakeBackend>, headers: HeaderMap, Path(id): Path<String>) -> Reply<Value> {
  let db = b.lock();
  db.caller(&headers)?;
  let total = db.submissions.iter().filter(|s| s.class_id == id).count();
  Ok(Json(json!({ "totalSubmissions": total })))
}

async fn increment_submission(State(b): State<FakeBackend>, headers: HeaderMap, Path(id): Path<String>) -> Reply<Value> {
  let mut db = b.lock();
  db.caller(&headers)?;
  let assignment = db.assignments.iter_mut().find(|a| a.id == id).ok_or(StatusCode::NOT_FOUND)?;
  assignment.submission_count += 1;
  Ok(Json(json!({ "modifiedCount": 1 })))
}

async fn submit_assignment(State(b): State<FakeBackend>, headers: HeaderMap, Json(submission): Json<Submission>) -> Reply<Value> {
  b.lock().caller(&headers)?;
  b.pause().await;
  b.lock().submissions.push(submission);
  Ok(Json(json!({ "acknowledged": true })))
}

// ─── Feedback & stats ─────────────────────────────────────────────────────────

async fn submit_feedback(State(b): State<FakeBackend>, headers: HeaderMap, Json(feedback): Json<Feedback>) -> Reply<Value> {
  b.lock().caller(&headers)?;
  b.pause().await;
  b.lock().feedback.push(feedback);
  Ok(Json(json!({ "acknowledged": true })))
}

async fn feedbacks(State(b): State<FakeBackend>) -> Json<Vec<Feedback>> { Json(b.lock().feedback.clone()) }

async fn stats(State(b): State<FakeBackend>) -> Json<Stats> {
  let db = b.lock();
  Json(Stats {
    total_users:       db.users.len() as u64,
    total_classes:     db.classes.len() as u64,
    total_enrollments: db.enrollments.len() as u64,
  })
}
