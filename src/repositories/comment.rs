//! File comment repository.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
};

use crate::entities::comment_file;

/// Repository for comment-related database operations.
pub struct CommentRepository;

impl CommentRepository {
    pub async fn get_by_id<C>(conn: &C, id: i32) -> Result<Option<comment_file::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(comment_file::Entity::find_by_id(id).one(conn).await?)
    }

    /// Comments of a file, oldest first.
    pub async fn get_for_file<C>(conn: &C, file_id: i32) -> Result<Vec<comment_file::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(comment_file::Entity::find()
            .filter(comment_file::Column::FileId.eq(file_id))
            .order_by_asc(comment_file::Column::DatePosted)
            .all(conn)
            .await?)
    }

    pub async fn create<C>(conn: &C, user_id: i32, file_id: i32, text: &str) -> Result<comment_file::Model>
    where
        C: ConnectionTrait,
    {
        Ok(comment_file::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            file_id: ActiveValue::Set(file_id),
            text: ActiveValue::Set(text.to_string()),
            date_posted: ActiveValue::Set(Utc::now()),
            read: ActiveValue::Set(false),
        }
        .insert(conn)
        .await?)
    }

    pub async fn delete<C>(conn: &C, comment: comment_file::Model) -> Result<()>
    where
        C: ConnectionTrait,
    {
        comment.delete(conn).await?;
        Ok(())
    }

    pub async fn delete_for_file<C>(conn: &C, file_id: i32) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = comment_file::Entity::delete_many()
            .filter(comment_file::Column::FileId.eq(file_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
