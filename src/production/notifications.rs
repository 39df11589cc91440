use crate::entities::{notification_project, notification_task};
use crate::error::{ProductionError, Result};
use crate::notify::UnreadCount;
use crate::repositories::NotificationRepository;

use super::{Actor, ProductionService};

impl ProductionService {
    /// Unread task notifications of the actor, newest first.
    pub async fn unread_task_notifications(&self, actor: Actor) -> Result<Vec<notification_task::Model>> {
        Ok(NotificationRepository::unread_task_notifications(&self.storage.conn, actor.user_id).await?)
    }

    /// Unread project notifications of the actor, newest first.
    pub async fn unread_project_notifications(&self, actor: Actor) -> Result<Vec<notification_project::Model>> {
        Ok(NotificationRepository::unread_project_notifications(&self.storage.conn, actor.user_id).await?)
    }

    pub async fn unread_count(&self, actor: Actor) -> Result<UnreadCount> {
        Ok(self.dispatcher.unread_count(&self.storage.conn, actor.user_id).await?)
    }

    /// Mark a task notification read. Only its owner or an admin may.
    pub async fn mark_task_notification_read(
        &self,
        actor: Actor,
        notification_id: i32,
    ) -> Result<notification_task::Model> {
        let notification = NotificationRepository::get_task_notification(&self.storage.conn, notification_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("task notification", notification_id))?;
        ensure_owner(actor, notification.user_id)?;
        Ok(NotificationRepository::mark_task_read(&self.storage.conn, notification).await?)
    }

    /// Mark a project notification read. Only its owner or an admin may.
    pub async fn mark_project_notification_read(
        &self,
        actor: Actor,
        notification_id: i32,
    ) -> Result<notification_project::Model> {
        let notification = NotificationRepository::get_project_notification(&self.storage.conn, notification_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("project notification", notification_id))?;
        ensure_owner(actor, notification.user_id)?;
        Ok(NotificationRepository::mark_project_read(&self.storage.conn, notification).await?)
    }
}

fn ensure_owner(actor: Actor, owner_id: i32) -> Result<()> {
    if actor.is_admin() || actor.user_id == owner_id {
        Ok(())
    } else {
        Err(ProductionError::Forbidden("notification belongs to another user".to_string()))
    }
}
