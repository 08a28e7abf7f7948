//! Reminder and alert notifications addressed to a single user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
  Assignment,
  Reminder,
  Deadline,
  Completion,
}

/// Only the read flag and read timestamp change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub tenant_id:       Uuid,
  pub assignment_id:   Uuid,
  pub user_id:         Uuid,
  pub kind:            NotificationKind,
  pub title:           String,
  pub message:         String,
  pub sent_at:         DateTime<Utc>,
  pub is_read:         bool,
  pub read_at:         Option<DateTime<Utc>>,
}
