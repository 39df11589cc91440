//! Production file and document repository.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
};

use crate::entities::{document, file_production};

/// Repository for file-related database operations.
pub struct FileRepository;

impl FileRepository {
    /// Get a single file by id.
    pub async fn get_by_id<C>(conn: &C, id: i32) -> Result<Option<file_production::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(file_production::Entity::find_by_id(id).one(conn).await?)
    }

    /// All files of a project ordered by name.
    pub async fn get_for_project<C>(conn: &C, project_id: i32) -> Result<Vec<file_production::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(file_production::Entity::find()
            .filter(file_production::Column::ProjectId.eq(project_id))
            .order_by_asc(file_production::Column::Name)
            .all(conn)
            .await?)
    }

    /// Documents of a project.
    pub async fn get_documents_for_project<C>(conn: &C, project_id: i32) -> Result<Vec<document::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(document::Entity::find()
            .filter(document::Column::ProjectId.eq(project_id))
            .order_by_asc(document::Column::Name)
            .all(conn)
            .await?)
    }

    /// Insert a file row. New files start unseen.
    pub async fn create<C>(conn: &C, user_id: i32, project_id: i32, name: &str, path: &str) -> Result<file_production::Model>
    where
        C: ConnectionTrait,
    {
        Ok(file_production::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            project_id: ActiveValue::Set(project_id),
            name: ActiveValue::Set(name.to_string()),
            file: ActiveValue::Set(path.to_string()),
            date_add: ActiveValue::Set(Utc::now().date_naive()),
            new: ActiveValue::Set(true),
        }
        .insert(conn)
        .await?)
    }

    /// Insert a document row.
    pub async fn create_document<C>(conn: &C, user_id: i32, project_id: i32, name: &str, path: &str) -> Result<document::Model>
    where
        C: ConnectionTrait,
    {
        Ok(document::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            project_id: ActiveValue::Set(project_id),
            name: ActiveValue::Set(name.to_string()),
            file: ActiveValue::Set(path.to_string()),
            date_add: ActiveValue::Set(Utc::now().date_naive()),
        }
        .insert(conn)
        .await?)
    }

    /// Clear the `new` flag once a file has been picked up.
    pub async fn mark_seen<C>(conn: &C, file: file_production::Model) -> Result<file_production::Model>
    where
        C: ConnectionTrait,
    {
        if !file.new {
            return Ok(file);
        }
        let mut active: file_production::ActiveModel = file.into();
        active.new = ActiveValue::Set(false);
        Ok(active.update(conn).await?)
    }

    /// Delete a file row.
    pub async fn delete<C>(conn: &C, file: file_production::Model) -> Result<()>
    where
        C: ConnectionTrait,
    {
        file.delete(conn).await?;
        Ok(())
    }

    /// Delete every document of a project.
    pub async fn delete_documents_for_project<C>(conn: &C, project_id: i32) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = document::Entity::delete_many()
            .filter(document::Column::ProjectId.eq(project_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
