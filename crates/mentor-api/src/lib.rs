//! JSON REST API for Mentor.
//!
//! Exposes an axum [`Router`] backed by a [`TrainingEngine`] over any
//! [`TrainingStore`]. Callers identify themselves with the `x-tenant-id` and
//! `x-user-id` headers (see [`identity`]); authentication, TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", mentor_api::api_router(engine.clone()))
//! ```

pub mod assignments;
pub mod catalog;
pub mod certificates;
pub mod error;
pub mod identity;
pub mod notifications;
pub mod quiz;
pub mod reports;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use mentor_core::store::TrainingStore;
use mentor_engine::TrainingEngine;

pub use error::ApiError;
pub use identity::Identity;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<TrainingEngine<S>>) -> Router<()>
where
  S: TrainingStore + 'static,
{
  Router::new()
    // Catalog
    .route(
      "/materials",
      get(catalog::list_materials::<S>).post(catalog::create_material::<S>),
    )
    .route(
      "/materials/{id}",
      get(catalog::get_material::<S>)
        .put(catalog::update_material::<S>)
        .delete(catalog::delete_material::<S>),
    )
    .route(
      "/materials/{id}/questions",
      get(catalog::list_questions::<S>).post(catalog::create_question::<S>),
    )
    .route(
      "/questions/{id}",
      get(catalog::get_question::<S>)
        .put(catalog::update_question::<S>)
        .delete(catalog::delete_question::<S>),
    )
    .route(
      "/courses",
      get(catalog::list_courses::<S>).post(catalog::create_course::<S>),
    )
    .route(
      "/courses/{id}",
      get(catalog::get_course::<S>)
        .put(catalog::update_course::<S>)
        .delete(catalog::delete_course::<S>),
    )
    .route("/courses/{id}/materials", get(catalog::list_course_materials::<S>))
    .route(
      "/courses/{id}/materials/{material_id}",
      put(catalog::add_course_material::<S>)
        .delete(catalog::remove_course_material::<S>),
    )
    // Assignments
    .route("/assignments/material", post(assignments::assign_material::<S>))
    .route("/assignments/course", post(assignments::assign_course::<S>))
    .route(
      "/assignments/material/bulk",
      post(assignments::bulk_assign_material::<S>),
    )
    .route(
      "/assignments/course/bulk",
      post(assignments::bulk_assign_course::<S>),
    )
    .route("/assignments/role", post(assignments::assign_to_role::<S>))
    .route("/roles/{id}/assignments", get(assignments::list_role_assignments::<S>))
    .route("/users/{id}/assignments", get(assignments::list_user_assignments::<S>))
    .route("/assignments/overdue", get(assignments::overdue::<S>))
    .route("/assignments/upcoming", get(assignments::upcoming::<S>))
    .route(
      "/assignments/{id}",
      get(assignments::get_one::<S>)
        .put(assignments::update_one::<S>)
        .delete(assignments::delete_one::<S>),
    )
    // Progress
    .route("/assignments/{id}/progress", get(assignments::list_progress::<S>))
    .route(
      "/assignments/{id}/progress/{material_id}",
      put(assignments::update_progress::<S>),
    )
    .route(
      "/assignments/{id}/progress/{material_id}/complete",
      post(assignments::complete::<S>),
    )
    .route("/progress/bulk", post(assignments::bulk_progress::<S>))
    // Quiz
    .route("/materials/{id}/quiz/attempts", post(quiz::submit::<S>))
    .route("/quiz/attempts", get(quiz::list::<S>))
    .route("/quiz/attempts/{id}", get(quiz::get_one::<S>))
    // Certificates
    .route("/assignments/{id}/certificates", post(certificates::issue::<S>))
    .route("/users/{id}/certificates", get(certificates::list_for_user::<S>))
    .route("/certificates/{id}", get(certificates::get_one::<S>))
    .route("/certificates/{id}/revoke", post(certificates::revoke::<S>))
    .route(
      "/certificates/validate/{number}",
      get(certificates::validate::<S>),
    )
    // Notifications
    .route(
      "/notifications",
      get(notifications::list::<S>).post(notifications::create::<S>),
    )
    .route("/notifications/{id}/read", post(notifications::mark_read::<S>))
    // Reports
    .route("/users/{id}/analytics", get(reports::user::<S>))
    .route("/courses/{id}/analytics", get(reports::course::<S>))
    .route("/analytics/organization", get(reports::organization::<S>))
    .route("/reminders/sweep", post(reports::sweep::<S>))
    .with_state(engine)
}
