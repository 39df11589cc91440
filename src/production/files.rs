use log::{info, warn};
use sea_orm::TransactionTrait;
use std::io::ErrorKind;
use std::path::Path;

use crate::entities::{document, file_production};
use crate::error::{ProductionError, Result};
use crate::notify::{BoardEvent, Notice, ProjectProgress};
use crate::progress;
use crate::repositories::{CommentRepository, FileRepository, NotificationRepository, ProjectRepository, TaskRepository};
use crate::storage::{is_allowed_file, UploadPaths};

use super::{Actor, ProductionService};

impl ProductionService {
    pub async fn get_file(&self, file_id: i32) -> Result<file_production::Model> {
        FileRepository::get_by_id(&self.storage.conn, file_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("file", file_id))
    }

    pub async fn files_for_project(&self, project_id: i32) -> Result<Vec<file_production::Model>> {
        Ok(FileRepository::get_for_project(&self.storage.conn, project_id).await?)
    }

    pub async fn documents_for_project(&self, project_id: i32) -> Result<Vec<document::Model>> {
        Ok(FileRepository::get_documents_for_project(&self.storage.conn, project_id).await?)
    }

    /// Store an uploaded production file under the project's upload directory.
    pub async fn register_file(
        &self,
        actor: Actor,
        project_id: i32,
        file_name: &str,
        contents: &[u8],
    ) -> Result<file_production::Model> {
        actor.require_admin("upload files")?;
        let relative = self.store_upload(project_id, file_name, contents).await?;
        let file = FileRepository::create(&self.storage.conn, actor.user_id, project_id, file_name, &relative).await?;
        info!("Registered file {} ({}) in project {}", file.name, file.id, project_id);
        Ok(file)
    }

    /// Store an uploaded project document. Documents have no task chain.
    pub async fn register_document(
        &self,
        actor: Actor,
        project_id: i32,
        file_name: &str,
        contents: &[u8],
    ) -> Result<document::Model> {
        actor.require_admin("upload documents")?;
        let relative = self.store_upload(project_id, file_name, contents).await?;
        let document =
            FileRepository::create_document(&self.storage.conn, actor.user_id, project_id, file_name, &relative)
                .await?;
        info!("Registered document {} ({}) in project {}", document.name, document.id, project_id);
        Ok(document)
    }

    /// Delete a file, its chain and the stored upload.
    ///
    /// Failing to remove the stored upload aborts the whole deletion.
    pub async fn delete_file(&self, actor: Actor, file_id: i32) -> Result<()> {
        actor.require_admin("delete files")?;
        let project_id = self.get_file(file_id).await?.project_id;

        let _guard = self.locks.acquire(project_id).await;
        let txn = self.storage.conn.begin().await?;

        let file = FileRepository::get_by_id(&txn, file_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("file", file_id))?;
        let stored = self.uploads.resolve(&file.file);

        let removed_tasks = TaskRepository::delete_for_file(&txn, file_id).await?;
        CommentRepository::delete_for_file(&txn, file_id).await?;
        NotificationRepository::delete_for_file(&txn, file_id).await?;
        FileRepository::delete(&txn, file).await?;

        let project = if removed_tasks > 0 {
            progress::recompute_project_progress(&txn, project_id).await?
        } else {
            ProjectRepository::get_by_id(&txn, project_id)
                .await?
                .ok_or_else(|| ProductionError::not_found("project", project_id))?
        };

        remove_stored(&stored).await?;
        txn.commit().await?;

        info!(
            "User {} deleted file {} ({} tasks) from project {}",
            actor.user_id, file_id, removed_tasks, project_id
        );
        self.deliver(Notice::Board(BoardEvent::FileDelete {
            file_id,
            project: ProjectProgress::from(&project),
        }))
        .await;
        Ok(())
    }

    async fn store_upload(&self, project_id: i32, file_name: &str, contents: &[u8]) -> Result<String> {
        if !is_allowed_file(file_name) || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(ProductionError::InvalidFileType(file_name.to_string()));
        }
        if ProjectRepository::get_by_id(&self.storage.conn, project_id).await?.is_none() {
            return Err(ProductionError::not_found("project", project_id));
        }

        let relative = UploadPaths::relative_file_path(project_id, file_name);
        tokio::fs::create_dir_all(self.uploads.project_dir(project_id)).await?;
        tokio::fs::write(self.uploads.resolve(&relative), contents).await?;
        Ok(relative)
    }
}

async fn remove_stored(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Stored upload {} was already gone", path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
