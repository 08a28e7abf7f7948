//! Analytics and the on-demand reminder sweep.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/{id}/analytics` | |
//! | `GET`  | `/courses/{id}/analytics` | |
//! | `GET`  | `/analytics/organization` | Tenant-wide totals |
//! | `POST` | `/reminders/sweep` | Runs one sweep for the caller's tenant |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use mentor_core::{
  analytics::{CourseAnalytics, OrganizationAnalytics, UserAnalytics},
  store::TrainingStore,
};
use mentor_engine::{ReminderReport, TrainingEngine};
use uuid::Uuid;

use crate::{error::ApiError, identity::Identity};

/// `GET /users/{id}/analytics`
pub async fn user<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(user_id): Path<Uuid>,
) -> Result<Json<UserAnalytics>, ApiError> {
  Ok(Json(engine.user_analytics(identity.tenant_id, user_id).await?))
}

/// `GET /courses/{id}/analytics`
pub async fn course<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(course_id): Path<Uuid>,
) -> Result<Json<CourseAnalytics>, ApiError> {
  Ok(Json(
    engine
      .course_analytics(identity.tenant_id, course_id)
      .await?,
  ))
}

/// `GET /analytics/organization`
pub async fn organization<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
) -> Result<Json<OrganizationAnalytics>, ApiError> {
  Ok(Json(engine.organization_analytics(identity.tenant_id).await?))
}

/// `POST /reminders/sweep`
pub async fn sweep<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
) -> Result<Json<ReminderReport>, ApiError> {
  Ok(Json(engine.send_reminders(identity.tenant_id).await?))
}
