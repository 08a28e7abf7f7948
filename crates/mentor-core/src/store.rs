//! The `TrainingStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `mentor-store-sqlite`).
//! The engine depends on this abstraction, not on any concrete backend.
//!
//! Stores are dumb: they persist whatever record they are handed and never
//! apply lifecycle rules themselves. Identifiers and timestamps are assigned
//! by the caller.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  analytics::{CourseAnalytics, OrganizationAnalytics, UserAnalytics},
  assignment::{Assignment, AssignmentStatus, RoleAssignment},
  catalog::{Course, CourseMaterial, CourseQuery, Material, MaterialQuery},
  certificate::Certificate,
  notification::Notification,
  progress::Progress,
  quiz::{AttemptQuery, QuizAttempt, QuizQuestion},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`TrainingStore::list_assignments`].
///
/// Every set field narrows the result; results are ordered by due date
/// (undated last), then creation time.
#[derive(Debug, Clone)]
pub struct AssignmentQuery {
  pub tenant_id:         Uuid,
  pub user_id:           Option<Uuid>,
  pub status:            Option<AssignmentStatus>,
  pub course_id:         Option<Uuid>,
  pub material_id:       Option<Uuid>,
  /// Inclusive upper bound on the due date. Undated rows are excluded.
  pub due_before:        Option<DateTime<Utc>>,
  /// Inclusive lower bound on the due date. Undated rows are excluded.
  pub due_after:         Option<DateTime<Utc>>,
  /// Non-completed assignments whose due date is strictly before this
  /// instant, whatever their stored status.
  pub overdue_as_of:     Option<DateTime<Utc>>,
  pub exclude_completed: bool,
  pub limit:             Option<usize>,
  pub offset:            Option<usize>,
}

impl AssignmentQuery {
  /// An unfiltered query over one tenant.
  pub fn tenant(tenant_id: Uuid) -> Self {
    Self {
      tenant_id,
      user_id: None,
      status: None,
      course_id: None,
      material_id: None,
      due_before: None,
      due_after: None,
      overdue_as_of: None,
      exclude_completed: false,
      limit: None,
      offset: None,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a training data backend.
///
/// `update_*`, `delete_*` and `set_*` methods return `false` when no row
/// matched. All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TrainingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Materials ─────────────────────────────────────────────────────────

  fn create_material(
    &self,
    material: Material,
  ) -> impl Future<Output = Result<Material, Self::Error>> + Send + '_;

  fn get_material(
    &self,
    tenant_id: Uuid,
    material_id: Uuid,
  ) -> impl Future<Output = Result<Option<Material>, Self::Error>> + Send + '_;

  fn list_materials<'a>(
    &'a self,
    tenant_id: Uuid,
    query: &'a MaterialQuery,
  ) -> impl Future<Output = Result<Vec<Material>, Self::Error>> + Send + 'a;

  fn update_material(
    &self,
    material: Material,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_material(
    &self,
    tenant_id: Uuid,
    material_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Courses ───────────────────────────────────────────────────────────

  fn create_course(
    &self,
    course: Course,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  fn get_course(
    &self,
    tenant_id: Uuid,
    course_id: Uuid,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  fn list_courses<'a>(
    &'a self,
    tenant_id: Uuid,
    query: &'a CourseQuery,
  ) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + 'a;

  fn update_course(
    &self,
    course: Course,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_course(
    &self,
    tenant_id: Uuid,
    course_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Insert a membership row, or update order and required flag if the pair
  /// already exists.
  fn add_course_material(
    &self,
    membership: CourseMaterial,
  ) -> impl Future<Output = Result<CourseMaterial, Self::Error>> + Send + '_;

  fn remove_course_material(
    &self,
    course_id: Uuid,
    material_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Memberships ordered by `order_index`.
  fn list_course_materials(
    &self,
    course_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CourseMaterial>, Self::Error>> + Send + '_;

  // ── Assignments ───────────────────────────────────────────────────────

  fn create_assignment(
    &self,
    assignment: Assignment,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  fn get_assignment(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
  ) -> impl Future<Output = Result<Option<Assignment>, Self::Error>> + Send + '_;

  /// Overwrite every mutable column of an existing assignment.
  fn update_assignment(
    &self,
    assignment: Assignment,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_assignment(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn list_assignments<'a>(
    &'a self,
    query: &'a AssignmentQuery,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + 'a;

  /// Distinct tenants that hold at least one non-completed assignment.
  fn list_active_tenants(
    &self,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  // ── Role templates ────────────────────────────────────────────────────

  fn create_role_assignment(
    &self,
    template: RoleAssignment,
  ) -> impl Future<Output = Result<RoleAssignment, Self::Error>> + Send + '_;

  fn list_role_assignments(
    &self,
    tenant_id: Uuid,
    role_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RoleAssignment>, Self::Error>> + Send + '_;

  // ── Progress ──────────────────────────────────────────────────────────

  /// Fails if a row already exists for the (assignment, material) pair.
  fn create_progress(
    &self,
    progress: Progress,
  ) -> impl Future<Output = Result<Progress, Self::Error>> + Send + '_;

  fn update_progress(
    &self,
    progress: Progress,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_progress(
    &self,
    assignment_id: Uuid,
    material_id: Uuid,
  ) -> impl Future<Output = Result<Option<Progress>, Self::Error>> + Send + '_;

  fn list_progress(
    &self,
    assignment_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Progress>, Self::Error>> + Send + '_;

  // ── Quiz ──────────────────────────────────────────────────────────────

  fn create_question(
    &self,
    question: QuizQuestion,
  ) -> impl Future<Output = Result<QuizQuestion, Self::Error>> + Send + '_;

  /// Questions are scoped to a tenant through their material.
  fn get_question(
    &self,
    tenant_id: Uuid,
    question_id: Uuid,
  ) -> impl Future<Output = Result<Option<QuizQuestion>, Self::Error>> + Send + '_;

  /// The material's question bank in display order.
  fn list_questions(
    &self,
    material_id: Uuid,
  ) -> impl Future<Output = Result<Vec<QuizQuestion>, Self::Error>> + Send + '_;

  fn update_question(
    &self,
    tenant_id: Uuid,
    question: QuizQuestion,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_question(
    &self,
    tenant_id: Uuid,
    question_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn create_attempt(
    &self,
    attempt: QuizAttempt,
  ) -> impl Future<Output = Result<QuizAttempt, Self::Error>> + Send + '_;

  fn get_attempt(
    &self,
    tenant_id: Uuid,
    attempt_id: Uuid,
  ) -> impl Future<Output = Result<Option<QuizAttempt>, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_attempts<'a>(
    &'a self,
    tenant_id: Uuid,
    query: &'a AttemptQuery,
  ) -> impl Future<Output = Result<Vec<QuizAttempt>, Self::Error>> + Send + 'a;

  // ── Certificates ──────────────────────────────────────────────────────

  /// Fails if the certificate number is already taken.
  fn create_certificate(
    &self,
    certificate: Certificate,
  ) -> impl Future<Output = Result<Certificate, Self::Error>> + Send + '_;

  fn get_certificate(
    &self,
    certificate_id: Uuid,
  ) -> impl Future<Output = Result<Option<Certificate>, Self::Error>> + Send + '_;

  fn get_certificate_by_number<'a>(
    &'a self,
    number: &'a str,
  ) -> impl Future<Output = Result<Option<Certificate>, Self::Error>> + Send + 'a;

  /// Newest first.
  fn list_certificates(
    &self,
    tenant_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Certificate>, Self::Error>> + Send + '_;

  fn set_certificate_validity(
    &self,
    certificate_id: Uuid,
    is_valid: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  fn create_notification(
    &self,
    notification: Notification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_notifications(
    &self,
    user_id: Uuid,
    unread_only: bool,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  /// Only the recipient may mark a notification read. Returns `false` if the
  /// notification does not exist or belongs to someone else.
  fn mark_notification_read(
    &self,
    notification_id: Uuid,
    user_id: Uuid,
    read_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Analytics ─────────────────────────────────────────────────────────

  fn user_analytics(
    &self,
    tenant_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<UserAnalytics, Self::Error>> + Send + '_;

  fn course_analytics(
    &self,
    tenant_id: Uuid,
    course_id: Uuid,
  ) -> impl Future<Output = Result<CourseAnalytics, Self::Error>> + Send + '_;

  fn organization_analytics(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<OrganizationAnalytics, Self::Error>> + Send + '_;
}
