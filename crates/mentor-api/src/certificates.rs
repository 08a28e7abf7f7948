//! Handlers for certificates.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/assignments/{id}/certificates` | Issue; 409 unless the assignment is completed |
//! | `GET`  | `/users/{id}/certificates` | Newest first |
//! | `GET`  | `/certificates/{id}` | |
//! | `POST` | `/certificates/{id}/revoke` | |
//! | `GET`  | `/certificates/validate/{number}` | Public lookup; 409 if revoked |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use mentor_core::{certificate::Certificate, store::TrainingStore};
use mentor_engine::TrainingEngine;
use uuid::Uuid;

use crate::{error::ApiError, identity::Identity};

/// `POST /assignments/{id}/certificates`
pub async fn issue<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(assignment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let certificate = engine
    .issue_certificate(identity.tenant_id, assignment_id, identity.user_id)
    .await?;
  Ok((StatusCode::CREATED, Json(certificate)))
}

/// `GET /users/{id}/certificates`
pub async fn list_for_user<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Certificate>>, ApiError> {
  Ok(Json(
    engine
      .list_certificates(identity.tenant_id, user_id)
      .await?,
  ))
}

/// `GET /certificates/{id}`
pub async fn get_one<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Certificate>, ApiError> {
  Ok(Json(engine.get_certificate(identity.tenant_id, id).await?))
}

/// `POST /certificates/{id}/revoke`
pub async fn revoke<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Certificate>, ApiError> {
  Ok(Json(engine.revoke_certificate(identity.tenant_id, id).await?))
}

/// `GET /certificates/validate/{number}`. Needs no identity headers.
pub async fn validate<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  Path(number): Path<String>,
) -> Result<Json<Certificate>, ApiError> {
  Ok(Json(engine.validate_certificate(&number).await?))
}
