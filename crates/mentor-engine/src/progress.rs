//! Progress reporting and completion.

use chrono::{DateTime, Utc};
use mentor_core::{
  assignment::Assignment,
  lifecycle::{self, ProgressUpdate},
  progress::Progress,
  store::TrainingStore,
};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Error, Result, TrainingEngine};

/// A progress event for one material of an assignment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressReport {
  pub progress_percentage: i64,
  #[serde(default)]
  pub time_spent_minutes:  i64,
  pub last_position:       Option<i64>,
  pub completed_at:        Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkProgressItem {
  pub assignment_id:       Uuid,
  pub material_id:         Uuid,
  pub progress_percentage: i64,
  #[serde(default)]
  pub time_spent_minutes:  i64,
}

fn clamp_minutes(value: i64) -> u32 {
  u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

impl<S: TrainingStore> TrainingEngine<S> {
  /// Record progress on one material and re-evaluate the assignment.
  ///
  /// The per-material row is created on first report and rewritten after
  /// that. Reaching 100% without an explicit completion time completes at
  /// "now".
  pub async fn update_progress(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
    material_id: Uuid,
    report: ProgressReport,
  ) -> Result<Assignment> {
    debug!(%assignment_id, %material_id, progress = report.progress_percentage, "updating progress");
    let assignment = self.require_assignment(tenant_id, assignment_id).await?;
    let now = self.now();

    let completed_at = report
      .completed_at
      .or_else(|| (report.progress_percentage >= 100).then_some(now));

    self
      .upsert_progress(assignment_id, material_id, now, |row| {
        row.progress_percentage = lifecycle::clamp_percentage(report.progress_percentage);
        if report.time_spent_minutes >= 0 {
          row.time_spent_minutes = clamp_minutes(report.time_spent_minutes);
        }
        row.last_position = report.last_position;
        row.completed_at = completed_at;
      })
      .await?;

    let update = ProgressUpdate {
      progress_percentage: report.progress_percentage,
      time_spent_minutes: report.time_spent_minutes,
      completed_at,
    };
    self.evaluate_and_save(assignment, update, now).await
  }

  /// Complete the assignment through one of its materials, keeping the
  /// accumulated time.
  pub async fn mark_as_completed(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
    material_id: Uuid,
  ) -> Result<Assignment> {
    let assignment = self.require_assignment(tenant_id, assignment_id).await?;
    let now = self.now();

    self
      .upsert_progress(assignment_id, material_id, now, |row| {
        row.progress_percentage = 100;
        row.completed_at = Some(now);
      })
      .await?;

    let update = ProgressUpdate {
      progress_percentage: 100,
      time_spent_minutes: i64::from(assignment.time_spent_minutes),
      completed_at: Some(now),
    };
    self.evaluate_and_save(assignment, update, now).await
  }

  /// Apply several progress events in order. Stops at the first failure;
  /// earlier items stay applied.
  pub async fn bulk_update_progress(
    &self,
    tenant_id: Uuid,
    items: Vec<BulkProgressItem>,
  ) -> Result<usize> {
    if items.is_empty() {
      return Err(Error::validation("at least one progress item is required"));
    }

    let count = items.len();
    for item in items {
      let report = ProgressReport {
        progress_percentage: item.progress_percentage,
        time_spent_minutes: item.time_spent_minutes,
        ..Default::default()
      };
      self
        .update_progress(tenant_id, item.assignment_id, item.material_id, report)
        .await?;
    }
    Ok(count)
  }

  pub async fn list_progress(&self, tenant_id: Uuid, assignment_id: Uuid) -> Result<Vec<Progress>> {
    self.require_assignment(tenant_id, assignment_id).await?;
    self
      .store
      .list_progress(assignment_id)
      .await
      .map_err(Error::store("failed to get progress"))
  }

  /// Run [`lifecycle::evaluate`] and persist the result unconditionally.
  pub(crate) async fn evaluate_and_save(
    &self,
    assignment: Assignment,
    update: ProgressUpdate,
    now: DateTime<Utc>,
  ) -> Result<Assignment> {
    let was_completed = assignment.status.is_completed();
    let mut assignment = lifecycle::evaluate(assignment, update, now);
    assignment.last_accessed_at = Some(now);

    let assignment = self
      .save_assignment(assignment, "failed to update assignment")
      .await?;
    if !was_completed && assignment.status.is_completed() {
      info!(assignment_id = %assignment.assignment_id, user_id = %assignment.user_id, "assignment completed");
    }
    Ok(assignment)
  }

  async fn upsert_progress(
    &self,
    assignment_id: Uuid,
    material_id: Uuid,
    now: DateTime<Utc>,
    apply: impl FnOnce(&mut Progress),
  ) -> Result<Progress> {
    let existing = self
      .store
      .get_progress(assignment_id, material_id)
      .await
      .map_err(Error::store("failed to get progress"))?;

    match existing {
      Some(mut row) => {
        apply(&mut row);
        row.updated_at = now;
        self
          .store
          .update_progress(row.clone())
          .await
          .map_err(Error::store("failed to update progress"))?;
        Ok(row)
      }
      None => {
        let mut row = Progress {
          progress_id: Uuid::new_v4(),
          assignment_id,
          material_id,
          progress_percentage: 0,
          time_spent_minutes: 0,
          last_position: None,
          completed_at: None,
          created_at: now,
          updated_at: now,
        };
        apply(&mut row);
        self
          .store
          .create_progress(row)
          .await
          .map_err(Error::store("failed to create progress"))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn minutes_never_go_negative() {
    assert_eq!(clamp_minutes(-10), 0);
    assert_eq!(clamp_minutes(45), 45);
    assert_eq!(clamp_minutes(i64::MAX), u32::MAX);
  }
}
