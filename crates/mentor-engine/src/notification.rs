//! User notifications.

use mentor_core::{
  notification::{Notification, NotificationKind},
  store::TrainingStore,
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::{Error, Result, TrainingEngine};

#[derive(Debug, Clone, Deserialize)]
pub struct NewNotification {
  pub assignment_id: Uuid,
  /// Defaults to the assignment's user.
  pub user_id:       Option<Uuid>,
  pub kind:          NotificationKind,
  pub title:         String,
  pub message:       String,
}

impl<S: TrainingStore> TrainingEngine<S> {
  pub async fn create_notification(
    &self,
    tenant_id: Uuid,
    request: NewNotification,
  ) -> Result<Notification> {
    if request.title.trim().is_empty() {
      return Err(Error::validation("title must not be empty"));
    }
    let assignment = self
      .require_assignment(tenant_id, request.assignment_id)
      .await?;

    let notification = Notification {
      notification_id: Uuid::new_v4(),
      tenant_id,
      assignment_id: assignment.assignment_id,
      user_id: request.user_id.unwrap_or(assignment.user_id),
      kind: request.kind,
      title: request.title,
      message: request.message,
      sent_at: self.now(),
      is_read: false,
      read_at: None,
    };
    let notification = self
      .store
      .create_notification(notification)
      .await
      .map_err(Error::store("failed to create notification"))?;

    debug!(
      notification_id = %notification.notification_id,
      user_id = %notification.user_id,
      kind = %notification.kind,
      "notification created"
    );
    Ok(notification)
  }

  pub async fn list_notifications(
    &self,
    user_id: Uuid,
    unread_only: bool,
  ) -> Result<Vec<Notification>> {
    self
      .store
      .list_notifications(user_id, unread_only)
      .await
      .map_err(Error::store("failed to list notifications"))
  }

  /// Mark one of `user_id`'s notifications read. Marking twice keeps the
  /// first read time.
  pub async fn mark_notification_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<()> {
    let updated = self
      .store
      .mark_notification_read(notification_id, user_id, self.now())
      .await
      .map_err(Error::store("failed to mark notification read"))?;
    if !updated {
      return Err(Error::not_found("notification", notification_id));
    }
    Ok(())
  }
}
