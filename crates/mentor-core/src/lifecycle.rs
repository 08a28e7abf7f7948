//! Assignment lifecycle rules.
//!
//! Everything here is a pure function of the current assignment, the incoming
//! change, and an explicit `now`. Callers persist the returned assignment
//! unconditionally.
//!
//! ```text
//! assigned ──progress > 0──▶ in_progress ──progress = 100──▶ completed
//!     └──────────────progress = 100 / explicit completion──────▲
//! ```
//!
//! `overdue` is not a separate state: it is an overlay recomputed from the
//! due date on every write, and it never applies to a completed assignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Metadata,
  assignment::{Assignment, AssignmentStatus, normalize_priority},
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// A progress event as reported by a caller.
///
/// Values are signed; out-of-range input is clamped or ignored here rather
/// than rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressUpdate {
  /// Clamped to `0..=100`.
  pub progress_percentage: i64,
  /// The new cumulative total. Negative values leave the stored total alone.
  pub time_spent_minutes:  i64,
  /// Forces completion at this instant when set.
  pub completed_at:        Option<DateTime<Utc>>,
}

/// An explicit edit of an assignment's mutable fields. `None` leaves the
/// field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentPatch {
  pub status:   Option<AssignmentStatus>,
  pub due_at:   Option<DateTime<Utc>>,
  pub priority: Option<String>,
  pub metadata: Option<Metadata>,
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

pub fn clamp_percentage(value: i64) -> u8 {
  // Lossless: the value is within 0..=100 after clamping.
  value.clamp(0, 100) as u8
}

pub fn is_past_due(due_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
  due_at.is_some_and(|due| due < now)
}

/// Status a freshly created assignment starts in.
pub fn initial_status(
  due_at: Option<DateTime<Utc>>,
  now: DateTime<Utc>,
) -> AssignmentStatus {
  if is_past_due(due_at, now) {
    AssignmentStatus::Overdue
  } else {
    AssignmentStatus::Assigned
  }
}

fn complete(assignment: &mut Assignment, at: DateTime<Utc>) {
  assignment.status = AssignmentStatus::Completed;
  assignment.completed_at = Some(at);
  assignment.progress_percentage = 100;
}

/// Re-establish the invariants every write must leave behind: normalized
/// priority, `completed_at` present only on completed assignments, and the
/// overdue overlay matching the due date.
fn settle(assignment: &mut Assignment, now: DateTime<Utc>) {
  assignment.priority = normalize_priority(&assignment.priority);

  if assignment.status.is_completed() {
    return;
  }
  assignment.completed_at = None;

  if is_past_due(assignment.due_at, now) {
    assignment.status = AssignmentStatus::Overdue;
  } else if assignment.status == AssignmentStatus::Overdue {
    assignment.status = if assignment.progress_percentage > 0 {
      AssignmentStatus::InProgress
    } else {
      AssignmentStatus::Assigned
    };
  }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// Apply a progress event to `assignment`.
///
/// - progress is clamped; a negative time total is ignored;
/// - an explicit completion timestamp, or progress reaching 100, completes the
///   assignment (progress forced to 100, `completed_at` set);
/// - otherwise positive progress moves `assigned` to `in_progress`;
/// - a completed assignment stays completed and keeps reporting 100%;
/// - finally the overdue overlay is recomputed against `now`.
pub fn evaluate(
  mut assignment: Assignment,
  update: ProgressUpdate,
  now: DateTime<Utc>,
) -> Assignment {
  let progress = clamp_percentage(update.progress_percentage);

  if update.time_spent_minutes >= 0 {
    assignment.time_spent_minutes =
      u32::try_from(update.time_spent_minutes).unwrap_or(u32::MAX);
  }

  if let Some(at) = update.completed_at {
    complete(&mut assignment, at);
  } else if progress >= 100 {
    complete(&mut assignment, now);
  } else if assignment.status.is_completed() {
    assignment.progress_percentage = 100;
  } else {
    assignment.progress_percentage = progress;
    if progress > 0 && assignment.status == AssignmentStatus::Assigned {
      assignment.status = AssignmentStatus::InProgress;
    }
  }

  settle(&mut assignment, now);
  assignment
}

/// Apply an explicit edit.
///
/// Setting `completed` stamps `completed_at` (keeping an earlier stamp) and
/// forces progress to 100; setting `assigned` resets progress to 0. Any
/// status that contradicts the due date is corrected by the overdue overlay.
pub fn apply_patch(
  mut assignment: Assignment,
  patch: AssignmentPatch,
  now: DateTime<Utc>,
) -> Assignment {
  if let Some(status) = patch.status {
    match status {
      AssignmentStatus::Completed => {
        let at = assignment.completed_at.unwrap_or(now);
        complete(&mut assignment, at);
      }
      AssignmentStatus::Assigned => {
        assignment.status = status;
        assignment.progress_percentage = 0;
      }
      AssignmentStatus::InProgress | AssignmentStatus::Overdue => {
        assignment.status = status;
      }
    }
  }
  if let Some(due_at) = patch.due_at {
    assignment.due_at = Some(due_at);
  }
  if let Some(priority) = patch.priority {
    assignment.priority = priority;
  }
  if let Some(metadata) = patch.metadata {
    assignment.metadata = metadata;
  }

  settle(&mut assignment, now);
  assignment
}

/// Stamp a reminder send on `assignment`. Re-runs the same normalization as
/// every other write.
pub fn mark_reminded(mut assignment: Assignment, now: DateTime<Utc>) -> Assignment {
  assignment.reminder_sent_at = Some(now);
  assignment.priority = normalize_priority(&assignment.priority);
  assignment
}
