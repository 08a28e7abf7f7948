//! The learning catalog: materials, courses, and course membership.
//!
//! The engine only reads the catalog to validate assignment targets and to
//! look up a material's passing score; the rest is plain CRUD.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Metadata;

/// How the material is delivered.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryType {
  File,
  Link,
  Video,
}

/// What kind of learning unit the material is.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MaterialType {
  Document,
  Video,
  Quiz,
  Simulation,
  Acknowledgment,
}

/// A single learning unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
  pub material_id:      Uuid,
  pub tenant_id:        Uuid,
  pub title:            String,
  pub description:      Option<String>,
  pub uri:              String,
  pub delivery:         DeliveryType,
  pub material_type:    MaterialType,
  pub duration_minutes: Option<u32>,
  pub tags:             Vec<String>,
  pub is_required:      bool,
  /// Percentage (0–100) a quiz attempt must reach to pass.
  pub passing_score:    u8,
  pub attempts_limit:   Option<u32>,
  pub metadata:         Metadata,
  pub created_by:       Option<Uuid>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// Filters for listing materials within a tenant.
#[derive(Debug, Clone, Default)]
pub struct MaterialQuery {
  pub material_type: Option<MaterialType>,
  pub is_required:   Option<bool>,
  /// Case-insensitive substring match over title and description.
  pub search:        Option<String>,
}

/// An ordered collection of materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
  pub course_id:   Uuid,
  pub tenant_id:   Uuid,
  pub title:       String,
  pub description: Option<String>,
  pub is_active:   bool,
  pub created_by:  Option<Uuid>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
  pub is_active: Option<bool>,
  pub search:    Option<String>,
}

/// Membership of a material in a course. One row per (course, material).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseMaterial {
  pub course_id:   Uuid,
  pub material_id: Uuid,
  pub order_index: i32,
  pub is_required: bool,
  pub created_at:  DateTime<Utc>,
}
