//! Notification repository.
//!
//! Task and project notifications are append-only rows; only their `read` flag changes.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::entities::{notification_project, notification_task};

/// Repository for notification-related database operations.
pub struct NotificationRepository;

impl NotificationRepository {
    pub async fn create_task_notification<C>(
        conn: &C,
        user_id: i32,
        department_id: i32,
        file_id: i32,
        content: &str,
    ) -> Result<notification_task::Model>
    where
        C: ConnectionTrait,
    {
        Ok(notification_task::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            department_id: ActiveValue::Set(department_id),
            file_id: ActiveValue::Set(file_id),
            content: ActiveValue::Set(content.to_string()),
            read: ActiveValue::Set(false),
            timestamp: ActiveValue::Set(Utc::now()),
        }
        .insert(conn)
        .await?)
    }

    pub async fn create_project_notification<C>(
        conn: &C,
        user_id: i32,
        project_id: i32,
        content: &str,
    ) -> Result<notification_project::Model>
    where
        C: ConnectionTrait,
    {
        Ok(notification_project::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            project_id: ActiveValue::Set(project_id),
            content: ActiveValue::Set(content.to_string()),
            read: ActiveValue::Set(false),
            timestamp: ActiveValue::Set(Utc::now()),
        }
        .insert(conn)
        .await?)
    }

    /// Unread task notifications of a user, newest first.
    pub async fn unread_task_notifications<C>(conn: &C, user_id: i32) -> Result<Vec<notification_task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(notification_task::Entity::find()
            .filter(notification_task::Column::UserId.eq(user_id))
            .filter(notification_task::Column::Read.eq(false))
            .order_by_desc(notification_task::Column::Timestamp)
            .order_by_desc(notification_task::Column::Id)
            .all(conn)
            .await?)
    }

    /// Unread project notifications of a user, newest first.
    pub async fn unread_project_notifications<C>(conn: &C, user_id: i32) -> Result<Vec<notification_project::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(notification_project::Entity::find()
            .filter(notification_project::Column::UserId.eq(user_id))
            .filter(notification_project::Column::Read.eq(false))
            .order_by_desc(notification_project::Column::Timestamp)
            .order_by_desc(notification_project::Column::Id)
            .all(conn)
            .await?)
    }

    pub async fn count_unread_task<C>(conn: &C, user_id: i32) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(notification_task::Entity::find()
            .filter(notification_task::Column::UserId.eq(user_id))
            .filter(notification_task::Column::Read.eq(false))
            .count(conn)
            .await?)
    }

    pub async fn count_unread_project<C>(conn: &C, user_id: i32) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(notification_project::Entity::find()
            .filter(notification_project::Column::UserId.eq(user_id))
            .filter(notification_project::Column::Read.eq(false))
            .count(conn)
            .await?)
    }

    pub async fn get_task_notification<C>(conn: &C, id: i32) -> Result<Option<notification_task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(notification_task::Entity::find_by_id(id).one(conn).await?)
    }

    pub async fn get_project_notification<C>(conn: &C, id: i32) -> Result<Option<notification_project::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(notification_project::Entity::find_by_id(id).one(conn).await?)
    }

    pub async fn mark_task_read<C>(conn: &C, notification: notification_task::Model) -> Result<notification_task::Model>
    where
        C: ConnectionTrait,
    {
        let mut active: notification_task::ActiveModel = notification.into();
        active.read = ActiveValue::Set(true);
        Ok(active.update(conn).await?)
    }

    pub async fn mark_project_read<C>(
        conn: &C,
        notification: notification_project::Model,
    ) -> Result<notification_project::Model>
    where
        C: ConnectionTrait,
    {
        let mut active: notification_project::ActiveModel = notification.into();
        active.read = ActiveValue::Set(true);
        Ok(active.update(conn).await?)
    }

    /// Drop the task notifications pointing at a file.
    pub async fn delete_for_file<C>(conn: &C, file_id: i32) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = notification_task::Entity::delete_many()
            .filter(notification_task::Column::FileId.eq(file_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
