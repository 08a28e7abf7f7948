//! Quiz submission and grading.

use mentor_core::{
  assignment::{Assignment, AssignmentTarget},
  grading::{self, AnswerSheet},
  lifecycle::ProgressUpdate,
  quiz::{Answers, AttemptQuery, QuizAttempt},
  store::TrainingStore,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{Error, Result, TrainingEngine};

#[derive(Debug, Clone, Deserialize)]
pub struct QuizSubmission {
  /// When set, the attempt also drives this assignment's progress.
  pub assignment_id:      Option<Uuid>,
  #[serde(default)]
  pub answers:            Answers,
  pub time_spent_minutes: Option<u32>,
}

impl<S: TrainingStore> TrainingEngine<S> {
  /// Grade a submission against the material's question bank and record
  /// the attempt.
  ///
  /// The passing threshold comes from the material; if it cannot be loaded
  /// only a perfect score passes. Updating the linked assignment is best
  /// effort: the attempt is returned even if that step fails, including when
  /// the assignment belongs to another user or material.
  pub async fn submit_quiz_attempt(
    &self,
    tenant_id: Uuid,
    material_id: Uuid,
    submission: QuizSubmission,
    submitted_by: Uuid,
  ) -> Result<QuizAttempt> {
    let questions = self
      .store
      .list_questions(material_id)
      .await
      .map_err(Error::store("failed to get quiz questions"))?;

    let sheet = AnswerSheet::decode(&submission.answers);
    let score = grading::grade(&questions, &sheet);

    let passing_score = match self.store.get_material(tenant_id, material_id).await {
      Ok(material) => material.map(|m| m.passing_score),
      Err(error) => {
        warn!(%material_id, %error, "failed to load material for passing score");
        None
      }
    };
    let passed = grading::passed(score, passing_score);

    let attempt = QuizAttempt {
      attempt_id: Uuid::new_v4(),
      tenant_id,
      user_id: submitted_by,
      material_id,
      assignment_id: submission.assignment_id,
      score: score.score,
      max_score: score.is_gradable().then_some(score.max_score),
      passed,
      answers: submission.answers,
      time_spent_minutes: submission.time_spent_minutes,
      attempted_at: self.now(),
    };
    let attempt = self
      .store
      .create_attempt(attempt)
      .await
      .map_err(Error::store("failed to save quiz attempt"))?;

    info!(
      attempt_id = %attempt.attempt_id,
      %material_id,
      score = score.score,
      max_score = score.max_score,
      passed,
      "quiz attempt graded"
    );

    if let Some(assignment_id) = attempt.assignment_id {
      if let Err(error) = self
        .apply_attempt(tenant_id, assignment_id, &attempt, score.percentage())
        .await
      {
        warn!(%assignment_id, %error, "failed to update assignment from quiz attempt");
      }
    }

    Ok(attempt)
  }

  async fn apply_attempt(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
    attempt: &QuizAttempt,
    percentage: u8,
  ) -> Result<()> {
    let assignment = self.require_assignment(tenant_id, assignment_id).await?;
    self.check_attempt_matches(&assignment, attempt).await?;

    let now = self.now();
    let time_spent = i64::from(assignment.time_spent_minutes)
      + i64::from(attempt.time_spent_minutes.unwrap_or(0));

    let update = ProgressUpdate {
      progress_percentage: i64::from(percentage),
      time_spent_minutes: time_spent,
      completed_at: attempt.passed.then_some(now),
    };
    self.evaluate_and_save(assignment, update, now).await?;
    Ok(())
  }

  /// The attempt must be for the assignment's user and for its material, or
  /// for a material of its course.
  async fn check_attempt_matches(
    &self,
    assignment: &Assignment,
    attempt: &QuizAttempt,
  ) -> Result<()> {
    if assignment.user_id != attempt.user_id {
      return Err(Error::Precondition(
        "quiz attempt was not submitted by the assignee".into(),
      ));
    }
    let covered = match assignment.target {
      AssignmentTarget::Material(material_id) => material_id == attempt.material_id,
      AssignmentTarget::Course(course_id) => self
        .store
        .list_course_materials(course_id)
        .await
        .map_err(Error::store("failed to get course materials"))?
        .iter()
        .any(|m| m.material_id == attempt.material_id),
    };
    if !covered {
      return Err(Error::Precondition(
        "quiz material is not part of the assignment".into(),
      ));
    }
    Ok(())
  }

  pub async fn get_attempt(&self, tenant_id: Uuid, attempt_id: Uuid) -> Result<QuizAttempt> {
    self
      .store
      .get_attempt(tenant_id, attempt_id)
      .await
      .map_err(Error::store("failed to get quiz attempt"))?
      .ok_or_else(|| Error::not_found("quiz attempt", attempt_id))
  }

  pub async fn list_attempts(
    &self,
    tenant_id: Uuid,
    query: &AttemptQuery,
  ) -> Result<Vec<QuizAttempt>> {
    self
      .store
      .list_attempts(tenant_id, query)
      .await
      .map_err(Error::store("failed to list quiz attempts"))
  }
}
