//! Deadline reminder sweep.

use std::collections::HashSet;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use mentor_core::{
  assignment::Assignment,
  lifecycle::{self, is_past_due},
  notification::{Notification, NotificationKind},
  store::{AssignmentQuery, TrainingStore},
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Error, Result, TrainingEngine};

/// Assignments due within this many days get a reminder.
pub const REMINDER_WINDOW_DAYS: i64 = 3;
/// Minimum gap between two reminders for the same assignment.
pub const REMINDER_COOLDOWN_HOURS: i64 = 12;
pub const REMINDER_TITLE: &str = "Training deadline reminder";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
  pub sent:    usize,
  pub skipped: usize,
}

/// No reminder was sent within the cooldown.
fn reminder_due(assignment: &Assignment, now: DateTime<Utc>) -> bool {
  assignment
    .reminder_sent_at
    .is_none_or(|sent| now - sent >= Duration::hours(REMINDER_COOLDOWN_HOURS))
}

fn reminder_kind(assignment: &Assignment, now: DateTime<Utc>) -> NotificationKind {
  if is_past_due(assignment.due_at, now) {
    NotificationKind::Deadline
  } else {
    NotificationKind::Reminder
  }
}

fn reminder_message(assignment: &Assignment) -> String {
  let due = assignment.due_at.map_or_else(
    || "soon".to_owned(),
    |at| at.to_rfc3339_opts(SecondsFormat::Secs, true),
  );
  format!("Training assignment {} is due {due}.", assignment.assignment_id)
}

impl<S: TrainingStore> TrainingEngine<S> {
  /// Tenants with at least one non-completed assignment: the ones a
  /// periodic sweep has to visit.
  pub async fn active_tenants(&self) -> Result<Vec<Uuid>> {
    self
      .store
      .list_active_tenants()
      .await
      .map_err(Error::store("failed to list active tenants"))
  }

  /// Notify users about assignments due within [`REMINDER_WINDOW_DAYS`] and
  /// about overdue ones, skipping any reminded in the last
  /// [`REMINDER_COOLDOWN_HOURS`]. Stops at the first store failure;
  /// reminders already sent stay recorded.
  pub async fn send_reminders(&self, tenant_id: Uuid) -> Result<ReminderReport> {
    let now = self.now();

    let upcoming = AssignmentQuery {
      due_after: Some(now),
      due_before: Some(now + Duration::days(REMINDER_WINDOW_DAYS)),
      exclude_completed: true,
      ..AssignmentQuery::tenant(tenant_id)
    };
    let overdue = AssignmentQuery {
      overdue_as_of: Some(now),
      ..AssignmentQuery::tenant(tenant_id)
    };

    let mut candidates = self
      .store
      .list_assignments(&upcoming)
      .await
      .map_err(Error::store("failed to get upcoming deadlines"))?;
    candidates.extend(
      self
        .store
        .list_assignments(&overdue)
        .await
        .map_err(Error::store("failed to get overdue assignments"))?,
    );

    let mut seen = HashSet::new();
    let mut report = ReminderReport::default();
    for assignment in candidates {
      if !seen.insert(assignment.assignment_id) {
        continue;
      }
      if !reminder_due(&assignment, now) {
        debug!(assignment_id = %assignment.assignment_id, "reminder cooldown active");
        report.skipped += 1;
        continue;
      }

      let notification = Notification {
        notification_id: Uuid::new_v4(),
        tenant_id,
        assignment_id: assignment.assignment_id,
        user_id: assignment.user_id,
        kind: reminder_kind(&assignment, now),
        title: REMINDER_TITLE.to_owned(),
        message: reminder_message(&assignment),
        sent_at: now,
        is_read: false,
        read_at: None,
      };
      self
        .store
        .create_notification(notification)
        .await
        .map_err(Error::store("failed to create notification"))?;

      let assignment = lifecycle::mark_reminded(assignment, now);
      self
        .save_assignment(assignment, "failed to update assignment")
        .await?;
      report.sent += 1;
    }

    info!(%tenant_id, sent = report.sent, skipped = report.skipped, "reminder sweep finished");
    Ok(report)
  }
}
