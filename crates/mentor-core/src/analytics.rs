//! Aggregate read models. These are computed entirely by the store; the
//! engine only passes them through.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnalytics {
  pub user_id:               Uuid,
  pub total_assignments:     u64,
  pub completed_assignments: u64,
  pub overdue_assignments:   u64,
  /// Completed / total, as a percentage. Zero when there are no assignments.
  pub completion_rate:       f64,
  pub average_time_spent:    f64,
  /// Mean of score / max score across the user's attempts, as a percentage.
  pub average_score:         f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAnalytics {
  pub course_id:             Uuid,
  pub total_assignments:     u64,
  pub completed_assignments: u64,
  pub completion_rate:       f64,
  pub average_time_spent:    f64,
  pub average_score:         f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationAnalytics {
  pub tenant_id:             Uuid,
  pub total_materials:       u64,
  pub total_courses:         u64,
  pub total_assignments:     u64,
  pub completed_assignments: u64,
  pub overdue_assignments:   u64,
  pub completion_rate:       f64,
  pub average_time_spent:    f64,
}
