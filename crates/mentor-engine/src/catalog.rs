//! Catalog maintenance: materials, courses, course membership and the quiz
//! question bank.

use chrono::{DateTime, Utc};
use mentor_core::{
  Metadata,
  catalog::{
    Course, CourseMaterial, CourseQuery, DeliveryType, Material, MaterialQuery,
    MaterialType,
  },
  quiz::{MAX_QUESTION_POINTS, QuestionType, QuizQuestion},
  store::TrainingStore,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Error, Result, TrainingEngine};

const MAX_TITLE_LEN: usize = 255;

fn validate_title(title: &str) -> Result<()> {
  let len = title.trim().chars().count();
  if len == 0 {
    return Err(Error::validation("title is required"));
  }
  if len > MAX_TITLE_LEN {
    return Err(Error::validation(format!(
      "title must be at most {MAX_TITLE_LEN} characters"
    )));
  }
  Ok(())
}

fn validate_uri(uri: &str) -> Result<()> {
  if uri.trim().is_empty() {
    return Err(Error::validation("uri is required"));
  }
  Ok(())
}

fn validate_passing_score(score: u8) -> Result<()> {
  if score > 100 {
    return Err(Error::validation("passing_score must be between 0 and 100"));
  }
  Ok(())
}

/// Non-positive points are stored and grade as one point.
fn validate_points(points: i32) -> Result<()> {
  if points > MAX_QUESTION_POINTS {
    return Err(Error::validation(format!(
      "points must be at most {MAX_QUESTION_POINTS}"
    )));
  }
  Ok(())
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NewMaterial {
  pub title:            String,
  pub description:      Option<String>,
  pub uri:              String,
  pub delivery:         DeliveryType,
  pub material_type:    MaterialType,
  pub duration_minutes: Option<u32>,
  #[serde(default)]
  pub tags:             Vec<String>,
  #[serde(default)]
  pub is_required:      bool,
  #[serde(default)]
  pub passing_score:    u8,
  pub attempts_limit:   Option<u32>,
  #[serde(default)]
  pub metadata:         Metadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaterialPatch {
  pub title:            Option<String>,
  pub description:      Option<String>,
  pub uri:              Option<String>,
  pub delivery:         Option<DeliveryType>,
  pub material_type:    Option<MaterialType>,
  pub duration_minutes: Option<u32>,
  pub tags:             Option<Vec<String>>,
  pub is_required:      Option<bool>,
  pub passing_score:    Option<u8>,
  pub attempts_limit:   Option<u32>,
  pub metadata:         Option<Metadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
  pub title:       String,
  pub description: Option<String>,
  #[serde(default)]
  pub is_active:   bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub is_active:   Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseMaterialRequest {
  #[serde(default)]
  pub order_index: i32,
  #[serde(default)]
  pub is_required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
  pub text:          String,
  #[serde(default)]
  pub options:       Value,
  pub correct_index: i64,
  pub question_type: QuestionType,
  /// Defaults to a single point.
  pub points:        Option<i32>,
  pub explanation:   Option<String>,
  #[serde(default)]
  pub order_index:   i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionPatch {
  pub text:          Option<String>,
  pub options:       Option<Value>,
  pub correct_index: Option<i64>,
  pub question_type: Option<QuestionType>,
  pub points:        Option<i32>,
  pub explanation:   Option<String>,
  pub order_index:   Option<i32>,
}

// ─── Patching ────────────────────────────────────────────────────────────────

impl MaterialPatch {
  fn apply(self, mut material: Material, now: DateTime<Utc>) -> Result<Material> {
    if let Some(title) = self.title {
      validate_title(&title)?;
      material.title = title;
    }
    if let Some(uri) = self.uri {
      validate_uri(&uri)?;
      material.uri = uri;
    }
    if let Some(score) = self.passing_score {
      validate_passing_score(score)?;
      material.passing_score = score;
    }
    if self.description.is_some() {
      material.description = self.description;
    }
    if let Some(delivery) = self.delivery {
      material.delivery = delivery;
    }
    if let Some(material_type) = self.material_type {
      material.material_type = material_type;
    }
    if self.duration_minutes.is_some() {
      material.duration_minutes = self.duration_minutes;
    }
    if let Some(tags) = self.tags {
      material.tags = tags;
    }
    if let Some(is_required) = self.is_required {
      material.is_required = is_required;
    }
    if self.attempts_limit.is_some() {
      material.attempts_limit = self.attempts_limit;
    }
    if let Some(metadata) = self.metadata {
      material.metadata = metadata;
    }
    material.updated_at = now;
    Ok(material)
  }
}

impl CoursePatch {
  fn apply(self, mut course: Course, now: DateTime<Utc>) -> Result<Course> {
    if let Some(title) = self.title {
      validate_title(&title)?;
      course.title = title;
    }
    if self.description.is_some() {
      course.description = self.description;
    }
    if let Some(is_active) = self.is_active {
      course.is_active = is_active;
    }
    course.updated_at = now;
    Ok(course)
  }
}

impl QuestionPatch {
  fn apply(self, mut question: QuizQuestion) -> Result<QuizQuestion> {
    if let Some(text) = self.text {
      question.text = text;
    }
    if let Some(options) = self.options {
      question.options = options;
    }
    if let Some(correct_index) = self.correct_index {
      question.correct_index = correct_index;
    }
    if let Some(question_type) = self.question_type {
      question.question_type = question_type;
    }
    if let Some(points) = self.points {
      validate_points(points)?;
      question.points = points;
    }
    if self.explanation.is_some() {
      question.explanation = self.explanation;
    }
    if let Some(order_index) = self.order_index {
      question.order_index = order_index;
    }
    Ok(question)
  }
}

// ─── Operations ──────────────────────────────────────────────────────────────

impl<S: TrainingStore> TrainingEngine<S> {
  // ── Materials ─────────────────────────────────────────────────────────

  pub async fn create_material(
    &self,
    tenant_id: Uuid,
    request: NewMaterial,
    created_by: Option<Uuid>,
  ) -> Result<Material> {
    validate_title(&request.title)?;
    validate_uri(&request.uri)?;
    validate_passing_score(request.passing_score)?;

    let now = self.now();
    let material = Material {
      material_id: Uuid::new_v4(),
      tenant_id,
      title: request.title,
      description: request.description,
      uri: request.uri,
      delivery: request.delivery,
      material_type: request.material_type,
      duration_minutes: request.duration_minutes,
      tags: request.tags,
      is_required: request.is_required,
      passing_score: request.passing_score,
      attempts_limit: request.attempts_limit,
      metadata: request.metadata,
      created_by,
      created_at: now,
      updated_at: now,
    };

    let material = self
      .store
      .create_material(material)
      .await
      .map_err(Error::store("failed to create material"))?;
    info!(material_id = %material.material_id, %tenant_id, "material created");
    Ok(material)
  }

  pub async fn get_material(&self, tenant_id: Uuid, material_id: Uuid) -> Result<Material> {
    self
      .store
      .get_material(tenant_id, material_id)
      .await
      .map_err(Error::store("failed to get material"))?
      .ok_or_else(|| Error::not_found("material", material_id))
  }

  pub async fn list_materials(
    &self,
    tenant_id: Uuid,
    query: &MaterialQuery,
  ) -> Result<Vec<Material>> {
    self
      .store
      .list_materials(tenant_id, query)
      .await
      .map_err(Error::store("failed to list materials"))
  }

  pub async fn update_material(
    &self,
    tenant_id: Uuid,
    material_id: Uuid,
    patch: MaterialPatch,
  ) -> Result<Material> {
    debug!(%material_id, "updating material");
    let material = self.get_material(tenant_id, material_id).await?;
    let material = patch.apply(material, self.now())?;

    let updated = self
      .store
      .update_material(material.clone())
      .await
      .map_err(Error::store("failed to update material"))?;
    if !updated {
      return Err(Error::not_found("material", material_id));
    }
    Ok(material)
  }

  pub async fn delete_material(&self, tenant_id: Uuid, material_id: Uuid) -> Result<()> {
    let deleted = self
      .store
      .delete_material(tenant_id, material_id)
      .await
      .map_err(Error::store("failed to delete material"))?;
    if !deleted {
      return Err(Error::not_found("material", material_id));
    }
    info!(%material_id, "material deleted");
    Ok(())
  }

  // ── Courses ───────────────────────────────────────────────────────────

  pub async fn create_course(
    &self,
    tenant_id: Uuid,
    request: NewCourse,
    created_by: Option<Uuid>,
  ) -> Result<Course> {
    validate_title(&request.title)?;

    let now = self.now();
    let course = Course {
      course_id: Uuid::new_v4(),
      tenant_id,
      title: request.title,
      description: request.description,
      is_active: request.is_active,
      created_by,
      created_at: now,
      updated_at: now,
    };

    let course = self
      .store
      .create_course(course)
      .await
      .map_err(Error::store("failed to create course"))?;
    info!(course_id = %course.course_id, %tenant_id, "course created");
    Ok(course)
  }

  pub async fn get_course(&self, tenant_id: Uuid, course_id: Uuid) -> Result<Course> {
    self
      .store
      .get_course(tenant_id, course_id)
      .await
      .map_err(Error::store("failed to get course"))?
      .ok_or_else(|| Error::not_found("course", course_id))
  }

  pub async fn list_courses(&self, tenant_id: Uuid, query: &CourseQuery) -> Result<Vec<Course>> {
    self
      .store
      .list_courses(tenant_id, query)
      .await
      .map_err(Error::store("failed to list courses"))
  }

  pub async fn update_course(
    &self,
    tenant_id: Uuid,
    course_id: Uuid,
    patch: CoursePatch,
  ) -> Result<Course> {
    debug!(%course_id, "updating course");
    let course = self.get_course(tenant_id, course_id).await?;
    let course = patch.apply(course, self.now())?;

    let updated = self
      .store
      .update_course(course.clone())
      .await
      .map_err(Error::store("failed to update course"))?;
    if !updated {
      return Err(Error::not_found("course", course_id));
    }
    Ok(course)
  }

  pub async fn delete_course(&self, tenant_id: Uuid, course_id: Uuid) -> Result<()> {
    let deleted = self
      .store
      .delete_course(tenant_id, course_id)
      .await
      .map_err(Error::store("failed to delete course"))?;
    if !deleted {
      return Err(Error::not_found("course", course_id));
    }
    info!(%course_id, "course deleted");
    Ok(())
  }

  /// Add a material to a course, or update its position if it is already a
  /// member. Both must belong to the tenant.
  pub async fn add_course_material(
    &self,
    tenant_id: Uuid,
    course_id: Uuid,
    material_id: Uuid,
    request: CourseMaterialRequest,
  ) -> Result<CourseMaterial> {
    self.get_course(tenant_id, course_id).await?;
    self.get_material(tenant_id, material_id).await?;

    self
      .store
      .add_course_material(CourseMaterial {
        course_id,
        material_id,
        order_index: request.order_index,
        is_required: request.is_required,
        created_at: self.now(),
      })
      .await
      .map_err(Error::store("failed to add material to course"))
  }

  pub async fn remove_course_material(
    &self,
    tenant_id: Uuid,
    course_id: Uuid,
    material_id: Uuid,
  ) -> Result<()> {
    self.get_course(tenant_id, course_id).await?;
    let removed = self
      .store
      .remove_course_material(course_id, material_id)
      .await
      .map_err(Error::store("failed to remove material from course"))?;
    if !removed {
      return Err(Error::not_found("course material", material_id));
    }
    Ok(())
  }

  pub async fn list_course_materials(
    &self,
    tenant_id: Uuid,
    course_id: Uuid,
  ) -> Result<Vec<CourseMaterial>> {
    self.get_course(tenant_id, course_id).await?;
    self
      .store
      .list_course_materials(course_id)
      .await
      .map_err(Error::store("failed to get course materials"))
  }

  // ── Quiz questions ────────────────────────────────────────────────────

  pub async fn create_question(
    &self,
    tenant_id: Uuid,
    material_id: Uuid,
    request: NewQuestion,
  ) -> Result<QuizQuestion> {
    if request.text.trim().is_empty() {
      return Err(Error::validation("question text is required"));
    }
    let points = request.points.unwrap_or(1);
    validate_points(points)?;
    self.get_material(tenant_id, material_id).await?;

    let question = QuizQuestion {
      question_id: Uuid::new_v4(),
      material_id,
      text: request.text,
      options: request.options,
      correct_index: request.correct_index,
      question_type: request.question_type,
      points,
      explanation: request.explanation,
      order_index: request.order_index,
      created_at: self.now(),
    };

    self
      .store
      .create_question(question)
      .await
      .map_err(Error::store("failed to create quiz question"))
  }

  pub async fn get_question(&self, tenant_id: Uuid, question_id: Uuid) -> Result<QuizQuestion> {
    self
      .store
      .get_question(tenant_id, question_id)
      .await
      .map_err(Error::store("failed to get quiz question"))?
      .ok_or_else(|| Error::not_found("quiz question", question_id))
  }

  pub async fn list_questions(
    &self,
    tenant_id: Uuid,
    material_id: Uuid,
  ) -> Result<Vec<QuizQuestion>> {
    self.get_material(tenant_id, material_id).await?;
    self
      .store
      .list_questions(material_id)
      .await
      .map_err(Error::store("failed to list quiz questions"))
  }

  pub async fn update_question(
    &self,
    tenant_id: Uuid,
    question_id: Uuid,
    patch: QuestionPatch,
  ) -> Result<QuizQuestion> {
    let question = patch.apply(self.get_question(tenant_id, question_id).await?)?;
    if question.text.trim().is_empty() {
      return Err(Error::validation("question text is required"));
    }

    let updated = self
      .store
      .update_question(tenant_id, question.clone())
      .await
      .map_err(Error::store("failed to update quiz question"))?;
    if !updated {
      return Err(Error::not_found("quiz question", question_id));
    }
    Ok(question)
  }

  pub async fn delete_question(&self, tenant_id: Uuid, question_id: Uuid) -> Result<()> {
    let deleted = self
      .store
      .delete_question(tenant_id, question_id)
      .await
      .map_err(Error::store("failed to delete quiz question"))?;
    if !deleted {
      return Err(Error::not_found("quiz question", question_id));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn titles_must_be_present_and_bounded() {
    assert!(validate_title("Phishing 101").is_ok());
    assert!(validate_title("   ").is_err());
    assert!(validate_title(&"x".repeat(MAX_TITLE_LEN)).is_ok());
    assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
  }

  #[test]
  fn question_patch_leaves_unset_fields_alone() {
    let question = QuizQuestion {
      question_id: Uuid::new_v4(),
      material_id: Uuid::new_v4(),
      text: "Original".into(),
      options: serde_json::json!(["a", "b"]),
      correct_index: 0,
      question_type: QuestionType::SingleChoice,
      points: 2,
      explanation: Some("because".into()),
      order_index: 4,
      created_at: Utc::now(),
    };

    let patched = QuestionPatch {
      correct_index: Some(1),
      ..Default::default()
    }
    .apply(question.clone())
    .unwrap();

    assert_eq!(patched.correct_index, 1);
    assert_eq!(patched.text, question.text);
    assert_eq!(patched.points, 2);
    assert_eq!(patched.explanation, question.explanation);

    let oversized = QuestionPatch {
      points: Some(MAX_QUESTION_POINTS + 1),
      ..Default::default()
    }
    .apply(question);
    assert!(oversized.is_err());
  }

  #[test]
  fn points_are_bounded_above() {
    assert!(validate_points(-3).is_ok());
    assert!(validate_points(MAX_QUESTION_POINTS).is_ok());
    assert!(validate_points(MAX_QUESTION_POINTS + 1).is_err());
    assert!(validate_points(i32::MAX).is_err());
  }
}
