//! Reporting passthroughs.

use mentor_core::{
  analytics::{CourseAnalytics, OrganizationAnalytics, UserAnalytics},
  store::TrainingStore,
};
use uuid::Uuid;

use crate::{Error, Result, TrainingEngine};

impl<S: TrainingStore> TrainingEngine<S> {
  pub async fn user_analytics(&self, tenant_id: Uuid, user_id: Uuid) -> Result<UserAnalytics> {
    self
      .store
      .user_analytics(tenant_id, user_id)
      .await
      .map_err(Error::store("failed to get user analytics"))
  }

  /// Aggregates over the course's assignments; fails with `NotFound` for a
  /// course outside the tenant.
  pub async fn course_analytics(
    &self,
    tenant_id: Uuid,
    course_id: Uuid,
  ) -> Result<CourseAnalytics> {
    self.get_course(tenant_id, course_id).await?;
    self
      .store
      .course_analytics(tenant_id, course_id)
      .await
      .map_err(Error::store("failed to get course analytics"))
  }

  pub async fn organization_analytics(&self, tenant_id: Uuid) -> Result<OrganizationAnalytics> {
    self
      .store
      .organization_analytics(tenant_id)
      .await
      .map_err(Error::store("failed to get organization analytics"))
  }
}
