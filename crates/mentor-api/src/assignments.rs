//! Handlers for assignments and their progress.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`   | `/assignments/material` | Body: [`AssignRequest`]; returns 201 + created rows |
//! | `POST`   | `/assignments/course` | Same, for a course |
//! | `POST`   | `/assignments/material/bulk` | Returns `{"count": n}` |
//! | `POST`   | `/assignments/course/bulk` | Returns `{"count": n}` |
//! | `POST`   | `/assignments/role` | Body: [`RoleAssignRequest`]; returns 201 |
//! | `GET`    | `/roles/{id}/assignments` | Role templates |
//! | `GET`    | `/users/{id}/assignments` | `?status`, `?course_id`, `?material_id`, `?limit`, `?offset` |
//! | `GET`    | `/assignments/overdue` | |
//! | `GET`    | `/assignments/upcoming` | `?days` (default 7) |
//! | `GET`    | `/assignments/{id}` | |
//! | `PUT`    | `/assignments/{id}` | Body: [`AssignmentPatch`] |
//! | `DELETE` | `/assignments/{id}` | 204 |
//! | `GET`    | `/assignments/{id}/progress` | Per-material rows |
//! | `PUT`    | `/assignments/{id}/progress/{material_id}` | Body: [`ProgressReport`] |
//! | `POST`   | `/assignments/{id}/progress/{material_id}/complete` | |
//! | `POST`   | `/progress/bulk` | Body: `[BulkProgressItem]`; returns `{"count": n}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use mentor_core::{
  assignment::{Assignment, RoleAssignment},
  lifecycle::AssignmentPatch,
  progress::Progress,
  store::TrainingStore,
};
use mentor_engine::{
  AssignRequest, AssignmentFilter, BulkProgressItem, ProgressReport,
  RoleAssignRequest, TrainingEngine,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, identity::Identity};

/// Response body of the bulk endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct CountBody {
  pub count: usize,
}

// ─── Creation ─────────────────────────────────────────────────────────────────

/// `POST /assignments/material`
pub async fn assign_material<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Json(body): Json<AssignRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let created = engine
    .assign_material(identity.tenant_id, body, identity.user_id)
    .await?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /assignments/course`
pub async fn assign_course<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Json(body): Json<AssignRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let created = engine
    .assign_course(identity.tenant_id, body, identity.user_id)
    .await?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /assignments/material/bulk`
pub async fn bulk_assign_material<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Json(body): Json<AssignRequest>,
) -> Result<Json<CountBody>, ApiError> {
  let count = engine
    .bulk_assign_material(identity.tenant_id, body, identity.user_id)
    .await?;
  Ok(Json(CountBody { count }))
}

/// `POST /assignments/course/bulk`
pub async fn bulk_assign_course<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Json(body): Json<AssignRequest>,
) -> Result<Json<CountBody>, ApiError> {
  let count = engine
    .bulk_assign_course(identity.tenant_id, body, identity.user_id)
    .await?;
  Ok(Json(CountBody { count }))
}

/// `POST /assignments/role`
pub async fn assign_to_role<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Json(body): Json<RoleAssignRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let template = engine
    .assign_to_role(identity.tenant_id, body, identity.user_id)
    .await?;
  Ok((StatusCode::CREATED, Json(template)))
}

/// `GET /roles/{id}/assignments`
pub async fn list_role_assignments<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(role_id): Path<Uuid>,
) -> Result<Json<Vec<RoleAssignment>>, ApiError> {
  Ok(Json(
    engine
      .list_role_assignments(identity.tenant_id, role_id)
      .await?,
  ))
}

// ─── Queries ──────────────────────────────────────────────────────────────────

/// `GET /users/{id}/assignments`
pub async fn list_user_assignments<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(user_id): Path<Uuid>,
  Query(filter): Query<AssignmentFilter>,
) -> Result<Json<Vec<Assignment>>, ApiError> {
  Ok(Json(
    engine
      .list_user_assignments(identity.tenant_id, user_id, filter)
      .await?,
  ))
}

/// `GET /assignments/overdue`
pub async fn overdue<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
) -> Result<Json<Vec<Assignment>>, ApiError> {
  Ok(Json(engine.overdue_assignments(identity.tenant_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
  #[serde(default = "default_days")]
  pub days: u32,
}

fn default_days() -> u32 { 7 }

/// `GET /assignments/upcoming[?days=N]`
pub async fn upcoming<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Query(params): Query<UpcomingParams>,
) -> Result<Json<Vec<Assignment>>, ApiError> {
  Ok(Json(
    engine
      .upcoming_deadlines(identity.tenant_id, params.days)
      .await?,
  ))
}

// ─── Single assignment ────────────────────────────────────────────────────────

/// `GET /assignments/{id}`
pub async fn get_one<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Assignment>, ApiError> {
  Ok(Json(engine.get_assignment(identity.tenant_id, id).await?))
}

/// `PUT /assignments/{id}`
pub async fn update_one<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
  Json(patch): Json<AssignmentPatch>,
) -> Result<Json<Assignment>, ApiError> {
  Ok(Json(
    engine
      .update_assignment(identity.tenant_id, id, patch)
      .await?,
  ))
}

/// `DELETE /assignments/{id}`
pub async fn delete_one<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  engine.delete_assignment(identity.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Progress ─────────────────────────────────────────────────────────────────

/// `GET /assignments/{id}/progress`
pub async fn list_progress<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Progress>>, ApiError> {
  Ok(Json(engine.list_progress(identity.tenant_id, id).await?))
}

/// `PUT /assignments/{id}/progress/{material_id}`; returns the re-evaluated
/// assignment.
pub async fn update_progress<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path((id, material_id)): Path<(Uuid, Uuid)>,
  Json(report): Json<ProgressReport>,
) -> Result<Json<Assignment>, ApiError> {
  Ok(Json(
    engine
      .update_progress(identity.tenant_id, id, material_id, report)
      .await?,
  ))
}

/// `POST /assignments/{id}/progress/{material_id}/complete`
pub async fn complete<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path((id, material_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Assignment>, ApiError> {
  Ok(Json(
    engine
      .mark_as_completed(identity.tenant_id, id, material_id)
      .await?,
  ))
}

/// `POST /progress/bulk`
pub async fn bulk_progress<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Json(items): Json<Vec<BulkProgressItem>>,
) -> Result<Json<CountBody>, ApiError> {
  let count = engine
    .bulk_update_progress(identity.tenant_id, items)
    .await?;
  Ok(Json(CountBody { count }))
}
