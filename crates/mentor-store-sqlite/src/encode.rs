//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with microsecond precision and a
//! `Z` suffix. Enums use their snake_case string form. Structured fields
//! (metadata, tags, quiz options and answers) are stored as compact JSON.
//! UUIDs are stored as hyphenated lowercase strings.
//!
//! Each `Raw*` struct mirrors one table row as read by `rusqlite`; decoding
//! into the domain type happens outside the connection closure.

use chrono::{DateTime, SecondsFormat, Utc};
use mentor_core::{
  Metadata,
  assignment::{Assignment, AssignmentTarget, RoleAssignment},
  catalog::{Course, CourseMaterial, Material},
  certificate::Certificate,
  error::parse_variant,
  notification::Notification,
  progress::Progress,
  quiz::{QuizAttempt, QuizQuestion},
};
use rusqlite::Row;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn encode_opt_uuid(id: Option<Uuid>) -> Option<String> { id.map(encode_uuid) }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn encode_opt_dt(dt: Option<DateTime<Utc>>) -> Option<String> { dt.map(encode_dt) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

// ─── Integers ────────────────────────────────────────────────────────────────

/// Narrow a stored integer into the domain's unsigned width.
fn decode_int<T: TryFrom<i64>>(
  table: &'static str,
  column: &str,
  value: i64,
) -> Result<T> {
  T::try_from(value).map_err(|_| Error::Decode {
    table,
    reason: format!("{column} out of range: {value}"),
  })
}

fn decode_opt_int<T: TryFrom<i64>>(
  table: &'static str,
  column: &str,
  value: Option<i64>,
) -> Result<Option<T>> {
  value.map(|v| decode_int(table, column, v)).transpose()
}

fn decode_target(
  table: &'static str,
  material_id: Option<String>,
  course_id: Option<String>,
) -> Result<AssignmentTarget> {
  AssignmentTarget::from_columns(
    decode_opt_uuid(material_id)?,
    decode_opt_uuid(course_id)?,
  )
  .ok_or_else(|| Error::Decode {
    table,
    reason: "exactly one of material_id and course_id must be set".into(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub struct RawMaterial {
  pub material_id:      String,
  pub tenant_id:        String,
  pub title:            String,
  pub description:      Option<String>,
  pub uri:              String,
  pub delivery:         String,
  pub material_type:    String,
  pub duration_minutes: Option<i64>,
  pub tags:             String,
  pub is_required:      bool,
  pub passing_score:    i64,
  pub attempts_limit:   Option<i64>,
  pub metadata:         String,
  pub created_by:       Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawMaterial {
  pub const COLUMNS: &'static str = "material_id, tenant_id, title, description, \
     uri, delivery, material_type, duration_minutes, tags, is_required, \
     passing_score, attempts_limit, metadata, created_by, created_at, updated_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      material_id:      row.get(0)?,
      tenant_id:        row.get(1)?,
      title:            row.get(2)?,
      description:      row.get(3)?,
      uri:              row.get(4)?,
      delivery:         row.get(5)?,
      material_type:    row.get(6)?,
      duration_minutes: row.get(7)?,
      tags:             row.get(8)?,
      is_required:      row.get(9)?,
      passing_score:    row.get(10)?,
      attempts_limit:   row.get(11)?,
      metadata:         row.get(12)?,
      created_by:       row.get(13)?,
      created_at:       row.get(14)?,
      updated_at:       row.get(15)?,
    })
  }

  pub fn into_material(self) -> Result<Material> {
    const T: &str = "materials";
    Ok(Material {
      material_id:      decode_uuid(&self.material_id)?,
      tenant_id:        decode_uuid(&self.tenant_id)?,
      title:            self.title,
      description:      self.description,
      uri:              self.uri,
      delivery:         parse_variant("delivery type", &self.delivery)?,
      material_type:    parse_variant("material type", &self.material_type)?,
      duration_minutes: decode_opt_int(T, "duration_minutes", self.duration_minutes)?,
      tags:             decode_json(&self.tags)?,
      is_required:      self.is_required,
      passing_score:    decode_int(T, "passing_score", self.passing_score)?,
      attempts_limit:   decode_opt_int(T, "attempts_limit", self.attempts_limit)?,
      metadata:         decode_json::<Metadata>(&self.metadata)?,
      created_by:       decode_opt_uuid(self.created_by)?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawCourse {
  pub course_id:   String,
  pub tenant_id:   String,
  pub title:       String,
  pub description: Option<String>,
  pub is_active:   bool,
  pub created_by:  Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawCourse {
  pub const COLUMNS: &'static str = "course_id, tenant_id, title, description, \
     is_active, created_by, created_at, updated_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:   row.get(0)?,
      tenant_id:   row.get(1)?,
      title:       row.get(2)?,
      description: row.get(3)?,
      is_active:   row.get(4)?,
      created_by:  row.get(5)?,
      created_at:  row.get(6)?,
      updated_at:  row.get(7)?,
    })
  }

  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      course_id:   decode_uuid(&self.course_id)?,
      tenant_id:   decode_uuid(&self.tenant_id)?,
      title:       self.title,
      description: self.description,
      is_active:   self.is_active,
      created_by:  decode_opt_uuid(self.created_by)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawCourseMaterial {
  pub course_id:   String,
  pub material_id: String,
  pub order_index: i32,
  pub is_required: bool,
  pub created_at:  String,
}

impl RawCourseMaterial {
  pub const COLUMNS: &'static str =
    "course_id, material_id, order_index, is_required, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:   row.get(0)?,
      material_id: row.get(1)?,
      order_index: row.get(2)?,
      is_required: row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_course_material(self) -> Result<CourseMaterial> {
    Ok(CourseMaterial {
      course_id:   decode_uuid(&self.course_id)?,
      material_id: decode_uuid(&self.material_id)?,
      order_index: self.order_index,
      is_required: self.is_required,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawAssignment {
  pub assignment_id:       String,
  pub tenant_id:           String,
  pub user_id:             String,
  pub material_id:         Option<String>,
  pub course_id:           Option<String>,
  pub status:              String,
  pub due_at:              Option<String>,
  pub completed_at:        Option<String>,
  pub assigned_by:         Option<String>,
  pub priority:            String,
  pub progress_percentage: i64,
  pub time_spent_minutes:  i64,
  pub last_accessed_at:    Option<String>,
  pub reminder_sent_at:    Option<String>,
  pub metadata:            String,
  pub created_at:          String,
}

impl RawAssignment {
  pub const COLUMNS: &'static str = "assignment_id, tenant_id, user_id, \
     material_id, course_id, status, due_at, completed_at, assigned_by, \
     priority, progress_percentage, time_spent_minutes, last_accessed_at, \
     reminder_sent_at, metadata, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assignment_id:       row.get(0)?,
      tenant_id:           row.get(1)?,
      user_id:             row.get(2)?,
      material_id:         row.get(3)?,
      course_id:           row.get(4)?,
      status:              row.get(5)?,
      due_at:              row.get(6)?,
      completed_at:        row.get(7)?,
      assigned_by:         row.get(8)?,
      priority:            row.get(9)?,
      progress_percentage: row.get(10)?,
      time_spent_minutes:  row.get(11)?,
      last_accessed_at:    row.get(12)?,
      reminder_sent_at:    row.get(13)?,
      metadata:            row.get(14)?,
      created_at:          row.get(15)?,
    })
  }

  pub fn into_assignment(self) -> Result<Assignment> {
    const T: &str = "assignments";
    Ok(Assignment {
      assignment_id:       decode_uuid(&self.assignment_id)?,
      tenant_id:           decode_uuid(&self.tenant_id)?,
      user_id:             decode_uuid(&self.user_id)?,
      target:              decode_target(T, self.material_id, self.course_id)?,
      status:              parse_variant("assignment status", &self.status)?,
      due_at:              decode_opt_dt(self.due_at)?,
      completed_at:        decode_opt_dt(self.completed_at)?,
      assigned_by:         decode_opt_uuid(self.assigned_by)?,
      priority:            self.priority,
      progress_percentage: decode_int(T, "progress_percentage", self.progress_percentage)?,
      time_spent_minutes:  decode_int(T, "time_spent_minutes", self.time_spent_minutes)?,
      last_accessed_at:    decode_opt_dt(self.last_accessed_at)?,
      reminder_sent_at:    decode_opt_dt(self.reminder_sent_at)?,
      metadata:            decode_json(&self.metadata)?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawRoleAssignment {
  pub role_assignment_id: String,
  pub tenant_id:          String,
  pub role_id:            String,
  pub material_id:        Option<String>,
  pub course_id:          Option<String>,
  pub is_required:        bool,
  pub due_days:           Option<i64>,
  pub assigned_by:        Option<String>,
  pub created_at:         String,
}

impl RawRoleAssignment {
  pub const COLUMNS: &'static str = "role_assignment_id, tenant_id, role_id, \
     material_id, course_id, is_required, due_days, assigned_by, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      role_assignment_id: row.get(0)?,
      tenant_id:          row.get(1)?,
      role_id:            row.get(2)?,
      material_id:        row.get(3)?,
      course_id:          row.get(4)?,
      is_required:        row.get(5)?,
      due_days:           row.get(6)?,
      assigned_by:        row.get(7)?,
      created_at:         row.get(8)?,
    })
  }

  pub fn into_role_assignment(self) -> Result<RoleAssignment> {
    const T: &str = "role_assignments";
    Ok(RoleAssignment {
      role_assignment_id: decode_uuid(&self.role_assignment_id)?,
      tenant_id:          decode_uuid(&self.tenant_id)?,
      role_id:            decode_uuid(&self.role_id)?,
      target:             decode_target(T, self.material_id, self.course_id)?,
      is_required:        self.is_required,
      due_days:           decode_opt_int(T, "due_days", self.due_days)?,
      assigned_by:        decode_opt_uuid(self.assigned_by)?,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawProgress {
  pub progress_id:         String,
  pub assignment_id:       String,
  pub material_id:         String,
  pub progress_percentage: i64,
  pub time_spent_minutes:  i64,
  pub last_position:       Option<i64>,
  pub completed_at:        Option<String>,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawProgress {
  pub const COLUMNS: &'static str = "progress_id, assignment_id, material_id, \
     progress_percentage, time_spent_minutes, last_position, completed_at, \
     created_at, updated_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      progress_id:         row.get(0)?,
      assignment_id:       row.get(1)?,
      material_id:         row.get(2)?,
      progress_percentage: row.get(3)?,
      time_spent_minutes:  row.get(4)?,
      last_position:       row.get(5)?,
      completed_at:        row.get(6)?,
      created_at:          row.get(7)?,
      updated_at:          row.get(8)?,
    })
  }

  pub fn into_progress(self) -> Result<Progress> {
    const T: &str = "progress";
    Ok(Progress {
      progress_id:         decode_uuid(&self.progress_id)?,
      assignment_id:       decode_uuid(&self.assignment_id)?,
      material_id:         decode_uuid(&self.material_id)?,
      progress_percentage: decode_int(T, "progress_percentage", self.progress_percentage)?,
      time_spent_minutes:  decode_int(T, "time_spent_minutes", self.time_spent_minutes)?,
      last_position:       self.last_position,
      completed_at:        decode_opt_dt(self.completed_at)?,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawQuestion {
  pub question_id:   String,
  pub material_id:   String,
  pub text:          String,
  pub options:       String,
  pub correct_index: i64,
  pub question_type: String,
  pub points:        i32,
  pub explanation:   Option<String>,
  pub order_index:   i32,
  pub created_at:    String,
}

impl RawQuestion {
  pub const COLUMNS: &'static str = "question_id, material_id, text, options, \
     correct_index, question_type, points, explanation, order_index, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      question_id:   row.get(0)?,
      material_id:   row.get(1)?,
      text:          row.get(2)?,
      options:       row.get(3)?,
      correct_index: row.get(4)?,
      question_type: row.get(5)?,
      points:        row.get(6)?,
      explanation:   row.get(7)?,
      order_index:   row.get(8)?,
      created_at:    row.get(9)?,
    })
  }

  pub fn into_question(self) -> Result<QuizQuestion> {
    Ok(QuizQuestion {
      question_id:   decode_uuid(&self.question_id)?,
      material_id:   decode_uuid(&self.material_id)?,
      text:          self.text,
      options:       decode_json(&self.options)?,
      correct_index: self.correct_index,
      question_type: parse_variant("question type", &self.question_type)?,
      points:        self.points,
      explanation:   self.explanation,
      order_index:   self.order_index,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawAttempt {
  pub attempt_id:         String,
  pub tenant_id:          String,
  pub user_id:            String,
  pub material_id:        String,
  pub assignment_id:      Option<String>,
  pub score:              i64,
  pub max_score:          Option<i64>,
  pub passed:             bool,
  pub answers:            String,
  pub time_spent_minutes: Option<i64>,
  pub attempted_at:       String,
}

impl RawAttempt {
  pub const COLUMNS: &'static str = "attempt_id, tenant_id, user_id, \
     material_id, assignment_id, score, max_score, passed, answers, \
     time_spent_minutes, attempted_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attempt_id:         row.get(0)?,
      tenant_id:          row.get(1)?,
      user_id:            row.get(2)?,
      material_id:        row.get(3)?,
      assignment_id:      row.get(4)?,
      score:              row.get(5)?,
      max_score:          row.get(6)?,
      passed:             row.get(7)?,
      answers:            row.get(8)?,
      time_spent_minutes: row.get(9)?,
      attempted_at:       row.get(10)?,
    })
  }

  pub fn into_attempt(self) -> Result<QuizAttempt> {
    const T: &str = "quiz_attempts";
    Ok(QuizAttempt {
      attempt_id:         decode_uuid(&self.attempt_id)?,
      tenant_id:          decode_uuid(&self.tenant_id)?,
      user_id:            decode_uuid(&self.user_id)?,
      material_id:        decode_uuid(&self.material_id)?,
      assignment_id:      decode_opt_uuid(self.assignment_id)?,
      score:              decode_int(T, "score", self.score)?,
      max_score:          decode_opt_int(T, "max_score", self.max_score)?,
      passed:             self.passed,
      answers:            decode_json(&self.answers)?,
      time_spent_minutes: decode_opt_int(T, "time_spent_minutes", self.time_spent_minutes)?,
      attempted_at:       decode_dt(&self.attempted_at)?,
    })
  }
}

pub struct RawCertificate {
  pub certificate_id:     String,
  pub tenant_id:          String,
  pub assignment_id:      String,
  pub user_id:            String,
  pub material_id:        Option<String>,
  pub course_id:          Option<String>,
  pub certificate_number: String,
  pub issued_at:          String,
  pub expires_at:         Option<String>,
  pub is_valid:           bool,
  pub metadata:           String,
}

impl RawCertificate {
  pub const COLUMNS: &'static str = "certificate_id, tenant_id, assignment_id, \
     user_id, material_id, course_id, certificate_number, issued_at, \
     expires_at, is_valid, metadata";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      certificate_id:     row.get(0)?,
      tenant_id:          row.get(1)?,
      assignment_id:      row.get(2)?,
      user_id:            row.get(3)?,
      material_id:        row.get(4)?,
      course_id:          row.get(5)?,
      certificate_number: row.get(6)?,
      issued_at:          row.get(7)?,
      expires_at:         row.get(8)?,
      is_valid:           row.get(9)?,
      metadata:           row.get(10)?,
    })
  }

  pub fn into_certificate(self) -> Result<Certificate> {
    // A certificate may carry no target at all, so both-null is not an error.
    let target = AssignmentTarget::from_columns(
      decode_opt_uuid(self.material_id)?,
      decode_opt_uuid(self.course_id)?,
    );
    Ok(Certificate {
      certificate_id:     decode_uuid(&self.certificate_id)?,
      tenant_id:          decode_uuid(&self.tenant_id)?,
      assignment_id:      decode_uuid(&self.assignment_id)?,
      user_id:            decode_uuid(&self.user_id)?,
      target,
      certificate_number: self.certificate_number,
      issued_at:          decode_dt(&self.issued_at)?,
      expires_at:         decode_opt_dt(self.expires_at)?,
      is_valid:           self.is_valid,
      metadata:           decode_json(&self.metadata)?,
    })
  }
}

pub struct RawNotification {
  pub notification_id: String,
  pub tenant_id:       String,
  pub assignment_id:   String,
  pub user_id:         String,
  pub kind:            String,
  pub title:           String,
  pub message:         String,
  pub sent_at:         String,
  pub is_read:         bool,
  pub read_at:         Option<String>,
}

impl RawNotification {
  pub const COLUMNS: &'static str = "notification_id, tenant_id, assignment_id, \
     user_id, kind, title, message, sent_at, is_read, read_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(0)?,
      tenant_id:       row.get(1)?,
      assignment_id:   row.get(2)?,
      user_id:         row.get(3)?,
      kind:            row.get(4)?,
      title:           row.get(5)?,
      message:         row.get(6)?,
      sent_at:         row.get(7)?,
      is_read:         row.get(8)?,
      read_at:         row.get(9)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      tenant_id:       decode_uuid(&self.tenant_id)?,
      assignment_id:   decode_uuid(&self.assignment_id)?,
      user_id:         decode_uuid(&self.user_id)?,
      kind:            parse_variant("notification kind", &self.kind)?,
      title:           self.title,
      message:         self.message,
      sent_at:         decode_dt(&self.sent_at)?,
      is_read:         self.is_read,
      read_at:         decode_opt_dt(self.read_at)?,
    })
  }
}
