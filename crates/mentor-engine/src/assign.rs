//! Assignment creation, listing and explicit edits.

use chrono::{DateTime, Duration, Utc};
use mentor_core::{
  Metadata,
  assignment::{
    Assignment, AssignmentStatus, AssignmentTarget, RoleAssignment,
    normalize_priority,
  },
  lifecycle::{self, AssignmentPatch},
  store::{AssignmentQuery, TrainingStore},
};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Error, Result, TrainingEngine};

/// Assign one material or course to a set of users.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignRequest {
  pub target_id: Uuid,
  pub user_ids:  Vec<Uuid>,
  pub due_at:    Option<DateTime<Utc>>,
  #[serde(default)]
  pub priority:  String,
  #[serde(default)]
  pub metadata:  Metadata,
}

/// Attach a material or course to a role. Exactly one target must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleAssignRequest {
  pub role_id:     Uuid,
  pub material_id: Option<Uuid>,
  pub course_id:   Option<Uuid>,
  #[serde(default)]
  pub is_required: bool,
  pub due_days:    Option<u32>,
}

/// Filters for a user's assignment list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentFilter {
  pub status:      Option<AssignmentStatus>,
  pub course_id:   Option<Uuid>,
  pub material_id: Option<Uuid>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

impl<S: TrainingStore> TrainingEngine<S> {
  /// Create one assignment per user for a material. Returns every row
  /// created, in `user_ids` order.
  pub async fn assign_material(
    &self,
    tenant_id: Uuid,
    request: AssignRequest,
    assigned_by: Option<Uuid>,
  ) -> Result<Vec<Assignment>> {
    if request.target_id.is_nil() {
      return Err(Error::validation("material_id is required"));
    }
    validate_users(&request.user_ids)?;
    self.get_material(tenant_id, request.target_id).await?;

    self
      .fan_out(
        tenant_id,
        AssignmentTarget::Material(request.target_id),
        request,
        assigned_by,
      )
      .await
  }

  /// Create one assignment per user for a course.
  pub async fn assign_course(
    &self,
    tenant_id: Uuid,
    request: AssignRequest,
    assigned_by: Option<Uuid>,
  ) -> Result<Vec<Assignment>> {
    if request.target_id.is_nil() {
      return Err(Error::validation("course_id is required"));
    }
    validate_users(&request.user_ids)?;
    self.get_course(tenant_id, request.target_id).await?;

    self
      .fan_out(
        tenant_id,
        AssignmentTarget::Course(request.target_id),
        request,
        assigned_by,
      )
      .await
  }

  /// [`assign_material`](Self::assign_material), reporting only how many
  /// assignments were created.
  pub async fn bulk_assign_material(
    &self,
    tenant_id: Uuid,
    request: AssignRequest,
    assigned_by: Option<Uuid>,
  ) -> Result<usize> {
    Ok(self.assign_material(tenant_id, request, assigned_by).await?.len())
  }

  pub async fn bulk_assign_course(
    &self,
    tenant_id: Uuid,
    request: AssignRequest,
    assigned_by: Option<Uuid>,
  ) -> Result<usize> {
    Ok(self.assign_course(tenant_id, request, assigned_by).await?.len())
  }

  async fn fan_out(
    &self,
    tenant_id: Uuid,
    target: AssignmentTarget,
    request: AssignRequest,
    assigned_by: Option<Uuid>,
  ) -> Result<Vec<Assignment>> {
    let now = self.now();
    let status = lifecycle::initial_status(request.due_at, now);
    let priority = normalize_priority(&request.priority);

    let mut created = Vec::with_capacity(request.user_ids.len());
    for user_id in request.user_ids {
      let assignment = Assignment {
        assignment_id: Uuid::new_v4(),
        tenant_id,
        user_id,
        target,
        status,
        due_at: request.due_at,
        completed_at: None,
        assigned_by,
        priority: priority.clone(),
        progress_percentage: 0,
        time_spent_minutes: 0,
        last_accessed_at: None,
        reminder_sent_at: None,
        metadata: request.metadata.clone(),
        created_at: now,
      };

      let assignment = self
        .store
        .create_assignment(assignment)
        .await
        .map_err(Error::store("failed to create assignment"))?;
      created.push(assignment);
    }

    info!(%tenant_id, ?target, count = created.len(), %status, "assignments created");
    Ok(created)
  }

  /// Record a role → target template. No per-user assignments are created.
  pub async fn assign_to_role(
    &self,
    tenant_id: Uuid,
    request: RoleAssignRequest,
    assigned_by: Option<Uuid>,
  ) -> Result<RoleAssignment> {
    if request.role_id.is_nil() {
      return Err(Error::validation("role_id is required"));
    }
    let target = match (request.material_id, request.course_id) {
      (Some(_), Some(_)) => {
        return Err(Error::validation(
          "only one of material_id or course_id may be provided",
        ));
      }
      (material_id, course_id) => AssignmentTarget::from_columns(material_id, course_id)
        .ok_or_else(|| {
          Error::validation("either material_id or course_id must be provided")
        })?,
    };

    let template = RoleAssignment {
      role_assignment_id: Uuid::new_v4(),
      tenant_id,
      role_id: request.role_id,
      target,
      is_required: request.is_required,
      due_days: request.due_days,
      assigned_by,
      created_at: self.now(),
    };

    let template = self
      .store
      .create_role_assignment(template)
      .await
      .map_err(Error::store("failed to create role assignment"))?;
    info!(%tenant_id, role_id = %template.role_id, ?target, "role assignment created");
    Ok(template)
  }

  pub async fn list_role_assignments(
    &self,
    tenant_id: Uuid,
    role_id: Uuid,
  ) -> Result<Vec<RoleAssignment>> {
    self
      .store
      .list_role_assignments(tenant_id, role_id)
      .await
      .map_err(Error::store("failed to list role assignments"))
  }

  pub async fn get_assignment(&self, tenant_id: Uuid, assignment_id: Uuid) -> Result<Assignment> {
    self.require_assignment(tenant_id, assignment_id).await
  }

  pub async fn list_user_assignments(
    &self,
    tenant_id: Uuid,
    user_id: Uuid,
    filter: AssignmentFilter,
  ) -> Result<Vec<Assignment>> {
    let query = AssignmentQuery {
      user_id: Some(user_id),
      status: filter.status,
      course_id: filter.course_id,
      material_id: filter.material_id,
      limit: filter.limit,
      offset: filter.offset,
      ..AssignmentQuery::tenant(tenant_id)
    };
    self
      .store
      .list_assignments(&query)
      .await
      .map_err(Error::store("failed to get user assignments"))
  }

  /// Apply an explicit edit; see [`lifecycle::apply_patch`].
  pub async fn update_assignment(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
    patch: AssignmentPatch,
  ) -> Result<Assignment> {
    debug!(%assignment_id, status = ?patch.status, "updating assignment");
    let assignment = self.require_assignment(tenant_id, assignment_id).await?;
    let assignment = lifecycle::apply_patch(assignment, patch, self.now());
    self
      .save_assignment(assignment, "failed to update assignment")
      .await
  }

  pub async fn delete_assignment(&self, tenant_id: Uuid, assignment_id: Uuid) -> Result<()> {
    let deleted = self
      .store
      .delete_assignment(tenant_id, assignment_id)
      .await
      .map_err(Error::store("failed to delete assignment"))?;
    if !deleted {
      return Err(Error::not_found("assignment", assignment_id));
    }
    info!(%assignment_id, "assignment deleted");
    Ok(())
  }

  /// Non-completed assignments whose due date has passed.
  pub async fn overdue_assignments(&self, tenant_id: Uuid) -> Result<Vec<Assignment>> {
    let query = AssignmentQuery {
      overdue_as_of: Some(self.now()),
      ..AssignmentQuery::tenant(tenant_id)
    };
    self
      .store
      .list_assignments(&query)
      .await
      .map_err(Error::store("failed to get overdue assignments"))
  }

  /// Non-completed assignments falling due within the next `days` days.
  pub async fn upcoming_deadlines(&self, tenant_id: Uuid, days: u32) -> Result<Vec<Assignment>> {
    let now = self.now();
    let horizon = Duration::try_days(i64::from(days))
      .and_then(|window| now.checked_add_signed(window))
      .ok_or_else(|| Error::validation(format!("days is out of range: {days}")))?;
    let query = AssignmentQuery {
      due_after: Some(now),
      due_before: Some(horizon),
      exclude_completed: true,
      ..AssignmentQuery::tenant(tenant_id)
    };
    self
      .store
      .list_assignments(&query)
      .await
      .map_err(Error::store("failed to get upcoming deadlines"))
  }
}

fn validate_users(user_ids: &[Uuid]) -> Result<()> {
  if user_ids.is_empty() {
    return Err(Error::validation("at least one user_id is required"));
  }
  if user_ids.iter().any(Uuid::is_nil) {
    return Err(Error::validation("user_ids must not contain the nil uuid"));
  }
  Ok(())
}
