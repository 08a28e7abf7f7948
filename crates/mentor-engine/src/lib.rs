//! Orchestration layer for the Mentor training engine.
//!
//! [`TrainingEngine`] composes the pure rules in `mentor-core` with a
//! [`TrainingStore`](mentor_core::store::TrainingStore) backend. Every
//! operation is a read-compute-write sequence through the store; the engine
//! itself holds no state beyond the store handle and its clock.

mod analytics;
mod assign;
mod catalog;
mod certificate;
mod engine;
mod notification;
mod progress;
mod quiz;
mod reminder;

pub mod error;

pub use assign::{AssignRequest, AssignmentFilter, RoleAssignRequest};
pub use catalog::{
  CourseMaterialRequest, CoursePatch, MaterialPatch, NewCourse, NewMaterial,
  NewQuestion, QuestionPatch,
};
pub use engine::{Clock, TrainingEngine};
pub use error::{Error, ErrorKind, Result};
pub use notification::NewNotification;
pub use progress::{BulkProgressItem, ProgressReport};
pub use quiz::QuizSubmission;
pub use reminder::{
  REMINDER_COOLDOWN_HOURS, REMINDER_TITLE, REMINDER_WINDOW_DAYS, ReminderReport,
};

#[cfg(test)]
mod tests;
