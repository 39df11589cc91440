use log::info;

use crate::constants::MESSAGE_NOT_YOUR_COMMENT;
use crate::entities::comment_file;
use crate::error::{ProductionError, Result};
use crate::notify::{BoardEvent, Notice};
use crate::repositories::CommentRepository;

use super::{Actor, ProductionService};

impl ProductionService {
    pub async fn comments_for_file(&self, file_id: i32) -> Result<Vec<comment_file::Model>> {
        Ok(CommentRepository::get_for_file(&self.storage.conn, file_id).await?)
    }

    /// Comment on a file and refresh the boards showing it.
    pub async fn add_comment(&self, actor: Actor, file_id: i32, text: &str) -> Result<comment_file::Model> {
        self.get_file(file_id).await?;
        let comment = CommentRepository::create(&self.storage.conn, actor.user_id, file_id, text).await?;
        info!("User {} commented on file {}", actor.user_id, file_id);

        self.deliver(Notice::Board(BoardEvent::CommentAdd {
            comment: comment.clone(),
        }))
        .await;
        Ok(comment)
    }

    /// Remove a comment. Non-admins may only remove their own.
    pub async fn remove_comment(&self, actor: Actor, comment_id: i32) -> Result<()> {
        let comment = CommentRepository::get_by_id(&self.storage.conn, comment_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("comment", comment_id))?;
        if !actor.is_admin() && comment.user_id != actor.user_id {
            return Err(ProductionError::Forbidden(MESSAGE_NOT_YOUR_COMMENT.to_string()));
        }

        CommentRepository::delete(&self.storage.conn, comment.clone()).await?;
        info!("User {} removed comment {}", actor.user_id, comment_id);

        self.deliver(Notice::Board(BoardEvent::CommentDelete { comment })).await;
        Ok(())
    }
}
