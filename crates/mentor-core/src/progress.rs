//! Per-(assignment, material) progress checkpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// At most one row exists per (assignment, material); later updates rewrite
/// it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
  pub progress_id:         Uuid,
  pub assignment_id:       Uuid,
  pub material_id:         Uuid,
  pub progress_percentage: u8,
  pub time_spent_minutes:  u32,
  /// Last playback or reading position, in whatever unit the material uses.
  pub last_position:       Option<i64>,
  pub completed_at:        Option<DateTime<Utc>>,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}
