//! [`TrainingEngine`], the entry point shared by every operation module.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mentor_core::{assignment::Assignment, store::TrainingStore};
use uuid::Uuid;

use crate::{Error, Result};

/// Source of "now" for every evaluation.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Drives assignments through their lifecycle against a [`TrainingStore`].
///
/// Cloning is cheap: the store and clock are reference-counted.
pub struct TrainingEngine<S> {
  pub(crate) store: Arc<S>,
  clock:            Clock,
}

impl<S> Clone for TrainingEngine<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      clock: Arc::clone(&self.clock),
    }
  }
}

impl<S: TrainingStore> TrainingEngine<S> {
  /// Engine over `store`, reading time from the system clock.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      clock: Arc::new(Utc::now),
    }
  }

  /// Replace the clock, e.g. with a fixed instant in tests.
  pub fn with_clock(
    mut self,
    clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
  ) -> Self {
    self.clock = Arc::new(clock);
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub(crate) fn now(&self) -> DateTime<Utc> { (self.clock)() }

  /// Load an assignment or fail with [`Error::NotFound`].
  pub(crate) async fn require_assignment(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
  ) -> Result<Assignment> {
    self
      .store
      .get_assignment(tenant_id, assignment_id)
      .await
      .map_err(Error::store("failed to get assignment"))?
      .ok_or_else(|| Error::not_found("assignment", assignment_id))
  }

  /// Persist an assignment that is known to exist.
  pub(crate) async fn save_assignment(
    &self,
    assignment: Assignment,
    context: &'static str,
  ) -> Result<Assignment> {
    let assignment_id = assignment.assignment_id;
    let updated = self
      .store
      .update_assignment(assignment.clone())
      .await
      .map_err(Error::store(context))?;
    if !updated {
      return Err(Error::not_found("assignment", assignment_id));
    }
    Ok(assignment)
  }
}
