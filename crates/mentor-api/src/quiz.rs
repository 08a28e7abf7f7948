//! Handlers for quiz attempts.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/materials/{id}/quiz/attempts` | Body: [`QuizSubmission`]; requires `x-user-id`; returns 201 |
//! | `GET`  | `/quiz/attempts` | `?assignment_id`, `?material_id` |
//! | `GET`  | `/quiz/attempts/{id}` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use mentor_core::{
  quiz::{AttemptQuery, QuizAttempt},
  store::TrainingStore,
};
use mentor_engine::{QuizSubmission, TrainingEngine};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, identity::Identity};

/// `POST /materials/{id}/quiz/attempts`
pub async fn submit<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(material_id): Path<Uuid>,
  Json(body): Json<QuizSubmission>,
) -> Result<impl IntoResponse, ApiError> {
  let user_id = identity.user()?;
  let attempt = engine
    .submit_quiz_attempt(identity.tenant_id, material_id, body, user_id)
    .await?;
  Ok((StatusCode::CREATED, Json(attempt)))
}

#[derive(Debug, Default, Deserialize)]
pub struct AttemptParams {
  pub assignment_id: Option<Uuid>,
  pub material_id:   Option<Uuid>,
}

/// `GET /quiz/attempts`
pub async fn list<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Query(params): Query<AttemptParams>,
) -> Result<Json<Vec<QuizAttempt>>, ApiError> {
  let query = AttemptQuery {
    assignment_id: params.assignment_id,
    material_id:   params.material_id,
  };
  Ok(Json(engine.list_attempts(identity.tenant_id, &query).await?))
}

/// `GET /quiz/attempts/{id}`
pub async fn get_one<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<QuizAttempt>, ApiError> {
  Ok(Json(engine.get_attempt(identity.tenant_id, id).await?))
}
