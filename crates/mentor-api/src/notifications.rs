//! Handlers for `/notifications`. Listing and marking read act on the
//! caller's own notifications and require `x-user-id`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use mentor_core::{notification::Notification, store::TrainingStore};
use mentor_engine::{NewNotification, TrainingEngine};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, identity::Identity};

/// `POST /notifications`
pub async fn create<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Json(body): Json<NewNotification>,
) -> Result<impl IntoResponse, ApiError> {
  let notification = engine.create_notification(identity.tenant_id, body).await?;
  Ok((StatusCode::CREATED, Json(notification)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub unread_only: bool,
}

/// `GET /notifications[?unread_only=true]`
pub async fn list<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, ApiError> {
  let user_id = identity.user()?;
  Ok(Json(
    engine
      .list_notifications(user_id, params.unread_only)
      .await?,
  ))
}

/// `POST /notifications/{id}/read`
pub async fn mark_read<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user_id = identity.user()?;
  engine.mark_notification_read(user_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
