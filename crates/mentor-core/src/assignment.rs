//! Training assignments: one user's obligation to complete one material or
//! one course.
//!
//! An assignment is mutable: progress updates, quiz submissions, explicit
//! status edits and the reminder sweep all rewrite it through the store. The
//! rules for *how* it changes live in [`crate::lifecycle`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Metadata;

/// Priority label applied when the caller supplies a blank one.
pub const DEFAULT_PRIORITY: &str = "normal";

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where an assignment sits in its lifecycle.
///
/// `Overdue` is an overlay recomputed on every evaluation from the due date;
/// it never sticks once the assignment is completed.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentStatus {
  Assigned,
  InProgress,
  Completed,
  Overdue,
}

impl AssignmentStatus {
  pub fn is_completed(self) -> bool { matches!(self, Self::Completed) }
}

// ─── Target ──────────────────────────────────────────────────────────────────

/// What the assignment asks the user to complete. Exactly one of a material
/// or a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AssignmentTarget {
  Material(Uuid),
  Course(Uuid),
}

impl AssignmentTarget {
  pub fn material_id(&self) -> Option<Uuid> {
    match self {
      Self::Material(id) => Some(*id),
      Self::Course(_) => None,
    }
  }

  pub fn course_id(&self) -> Option<Uuid> {
    match self {
      Self::Course(id) => Some(*id),
      Self::Material(_) => None,
    }
  }

  /// Rebuild a target from the two nullable columns a store keeps.
  /// Returns `None` unless exactly one of them is set.
  pub fn from_columns(
    material_id: Option<Uuid>,
    course_id: Option<Uuid>,
  ) -> Option<Self> {
    match (material_id, course_id) {
      (Some(m), None) => Some(Self::Material(m)),
      (None, Some(c)) => Some(Self::Course(c)),
      _ => None,
    }
  }
}

// ─── Assignment ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id:       Uuid,
  pub tenant_id:           Uuid,
  pub user_id:             Uuid,
  pub target:              AssignmentTarget,
  pub status:              AssignmentStatus,
  pub due_at:              Option<DateTime<Utc>>,
  /// Set if and only if `status` is [`AssignmentStatus::Completed`].
  pub completed_at:        Option<DateTime<Utc>>,
  pub assigned_by:         Option<Uuid>,
  pub priority:            String,
  /// Always within `0..=100`.
  pub progress_percentage: u8,
  /// Cumulative total supplied by callers, not a delta.
  pub time_spent_minutes:  u32,
  pub last_accessed_at:    Option<DateTime<Utc>>,
  pub reminder_sent_at:    Option<DateTime<Utc>>,
  pub metadata:            Metadata,
  pub created_at:          DateTime<Utc>,
}

/// Replace a blank or whitespace-only priority with [`DEFAULT_PRIORITY`].
///
/// Every write path runs the priority through here.
pub fn normalize_priority(value: &str) -> String {
  if value.trim().is_empty() {
    DEFAULT_PRIORITY.to_owned()
  } else {
    value.to_owned()
  }
}

// ─── Role templates ──────────────────────────────────────────────────────────

/// A role → material/course template. Provisioning per-user assignments from
/// it is handled outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
  pub role_assignment_id: Uuid,
  pub tenant_id:          Uuid,
  pub role_id:            Uuid,
  pub target:             AssignmentTarget,
  pub is_required:        bool,
  /// Days after provisioning the generated assignment falls due.
  pub due_days:           Option<u32>,
  pub assigned_by:        Option<Uuid>,
  pub created_at:         DateTime<Utc>,
}
