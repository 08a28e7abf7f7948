//! Handlers for the catalog: `/materials`, `/courses` and `/questions`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/materials` | `?material_type`, `?is_required`, `?search` |
//! | `POST`   | `/materials` | Body: [`NewMaterial`]; returns 201 |
//! | `GET`    | `/materials/{id}` | |
//! | `PUT`    | `/materials/{id}` | Body: [`MaterialPatch`] |
//! | `DELETE` | `/materials/{id}` | 204 |
//! | `GET`    | `/materials/{id}/questions` | Question bank in order |
//! | `POST`   | `/materials/{id}/questions` | Body: [`NewQuestion`]; returns 201 |
//! | `GET`    | `/questions/{id}` | |
//! | `PUT`    | `/questions/{id}` | Body: [`QuestionPatch`] |
//! | `DELETE` | `/questions/{id}` | 204 |
//! | `GET`    | `/courses` | `?is_active`, `?search` |
//! | `POST`   | `/courses` | Body: [`NewCourse`]; returns 201 |
//! | `GET`    | `/courses/{id}` | |
//! | `PUT`    | `/courses/{id}` | Body: [`CoursePatch`] |
//! | `DELETE` | `/courses/{id}` | 204 |
//! | `GET`    | `/courses/{id}/materials` | Members in order |
//! | `PUT`    | `/courses/{id}/materials/{material_id}` | Body: [`CourseMaterialRequest`] |
//! | `DELETE` | `/courses/{id}/materials/{material_id}` | 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use mentor_core::{
  catalog::{Course, CourseMaterial, CourseQuery, Material, MaterialQuery, MaterialType},
  quiz::QuizQuestion,
  store::TrainingStore,
};
use mentor_engine::{
  CourseMaterialRequest, CoursePatch, MaterialPatch, NewCourse, NewMaterial,
  NewQuestion, QuestionPatch, TrainingEngine,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, identity::Identity};

// ─── Materials ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct MaterialParams {
  pub material_type: Option<MaterialType>,
  pub is_required:   Option<bool>,
  pub search:        Option<String>,
}

/// `GET /materials`
pub async fn list_materials<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Query(params): Query<MaterialParams>,
) -> Result<Json<Vec<Material>>, ApiError> {
  let query = MaterialQuery {
    material_type: params.material_type,
    is_required:   params.is_required,
    search:        params.search,
  };
  Ok(Json(engine.list_materials(identity.tenant_id, &query).await?))
}

/// `POST /materials`
pub async fn create_material<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Json(body): Json<NewMaterial>,
) -> Result<impl IntoResponse, ApiError> {
  let material = engine
    .create_material(identity.tenant_id, body, identity.user_id)
    .await?;
  Ok((StatusCode::CREATED, Json(material)))
}

/// `GET /materials/{id}`
pub async fn get_material<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Material>, ApiError> {
  Ok(Json(engine.get_material(identity.tenant_id, id).await?))
}

/// `PUT /materials/{id}`
pub async fn update_material<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
  Json(patch): Json<MaterialPatch>,
) -> Result<Json<Material>, ApiError> {
  Ok(Json(engine.update_material(identity.tenant_id, id, patch).await?))
}

/// `DELETE /materials/{id}`
pub async fn delete_material<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  engine.delete_material(identity.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Questions ────────────────────────────────────────────────────────────────

/// `GET /materials/{id}/questions`
pub async fn list_questions<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(material_id): Path<Uuid>,
) -> Result<Json<Vec<QuizQuestion>>, ApiError> {
  Ok(Json(engine.list_questions(identity.tenant_id, material_id).await?))
}

/// `POST /materials/{id}/questions`
pub async fn create_question<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(material_id): Path<Uuid>,
  Json(body): Json<NewQuestion>,
) -> Result<impl IntoResponse, ApiError> {
  let question = engine
    .create_question(identity.tenant_id, material_id, body)
    .await?;
  Ok((StatusCode::CREATED, Json(question)))
}

/// `GET /questions/{id}`
pub async fn get_question<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<QuizQuestion>, ApiError> {
  Ok(Json(engine.get_question(identity.tenant_id, id).await?))
}

/// `PUT /questions/{id}`
pub async fn update_question<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
  Json(patch): Json<QuestionPatch>,
) -> Result<Json<QuizQuestion>, ApiError> {
  Ok(Json(engine.update_question(identity.tenant_id, id, patch).await?))
}

/// `DELETE /questions/{id}`
pub async fn delete_question<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  engine.delete_question(identity.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Courses ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CourseParams {
  pub is_active: Option<bool>,
  pub search:    Option<String>,
}

/// `GET /courses`
pub async fn list_courses<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Query(params): Query<CourseParams>,
) -> Result<Json<Vec<Course>>, ApiError> {
  let query = CourseQuery {
    is_active: params.is_active,
    search:    params.search,
  };
  Ok(Json(engine.list_courses(identity.tenant_id, &query).await?))
}

/// `POST /courses`
pub async fn create_course<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Json(body): Json<NewCourse>,
) -> Result<impl IntoResponse, ApiError> {
  let course = engine
    .create_course(identity.tenant_id, body, identity.user_id)
    .await?;
  Ok((StatusCode::CREATED, Json(course)))
}

/// `GET /courses/{id}`
pub async fn get_course<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Course>, ApiError> {
  Ok(Json(engine.get_course(identity.tenant_id, id).await?))
}

/// `PUT /courses/{id}`
pub async fn update_course<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
  Json(patch): Json<CoursePatch>,
) -> Result<Json<Course>, ApiError> {
  Ok(Json(engine.update_course(identity.tenant_id, id, patch).await?))
}

/// `DELETE /courses/{id}`
pub async fn delete_course<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  engine.delete_course(identity.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /courses/{id}/materials`
pub async fn list_course_materials<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<CourseMaterial>>, ApiError> {
  Ok(Json(
    engine
      .list_course_materials(identity.tenant_id, course_id)
      .await?,
  ))
}

/// `PUT /courses/{id}/materials/{material_id}`
pub async fn add_course_material<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path((course_id, material_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<CourseMaterialRequest>,
) -> Result<Json<CourseMaterial>, ApiError> {
  Ok(Json(
    engine
      .add_course_material(identity.tenant_id, course_id, material_id, body)
      .await?,
  ))
}

/// `DELETE /courses/{id}/materials/{material_id}`
pub async fn remove_course_material<S: TrainingStore + 'static>(
  State(engine): State<Arc<TrainingEngine<S>>>,
  identity: Identity,
  Path((course_id, material_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  engine
    .remove_course_material(identity.tenant_id, course_id, material_id)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}
