//! Quiz questions and graded attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw submitted answers, keyed by question id. Values arrive untyped; see
/// [`crate::grading::AnswerSheet`] for the decode step.
pub type Answers = serde_json::Map<String, serde_json::Value>;

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
pub enum QuestionType {
  MultipleChoice,
  SingleChoice,
  TrueFalse,
  TextInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
  pub question_id:   Uuid,
  pub material_id:   Uuid,
  pub text:          String,
  /// Opaque option payload rendered by the client.
  pub options:       serde_json::Value,
  /// Zero-based index of the correct option.
  pub correct_index: i64,
  pub question_type: QuestionType,
  /// Stored as-is; see [`QuizQuestion::effective_points`].
  pub points:        i32,
  pub explanation:   Option<String>,
  pub order_index:   i32,
  pub created_at:    DateTime<Utc>,
}

/// Upper bound on the points a single question may be worth.
pub const MAX_QUESTION_POINTS: i32 = 1000;

impl QuizQuestion {
  /// Points the question is worth when graded. Non-positive values count as
  /// a single point; values above [`MAX_QUESTION_POINTS`] are capped.
  pub fn effective_points(&self) -> u32 {
    self.points.clamp(1, MAX_QUESTION_POINTS).unsigned_abs()
  }
}

/// One graded submission. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
  pub attempt_id:         Uuid,
  pub tenant_id:          Uuid,
  pub user_id:            Uuid,
  pub material_id:        Uuid,
  pub assignment_id:      Option<Uuid>,
  pub score:              u32,
  /// Only recorded when the question bank was non-empty.
  pub max_score:          Option<u32>,
  pub passed:             bool,
  pub answers:            Answers,
  pub time_spent_minutes: Option<u32>,
  pub attempted_at:       DateTime<Utc>,
}

/// Filters for listing one tenant's attempts. Unset fields do not constrain
/// the result.
#[derive(Debug, Clone, Default)]
pub struct AttemptQuery {
  pub assignment_id: Option<Uuid>,
  pub material_id:   Option<Uuid>,
}
