use chrono::NaiveDate;
use log::info;
use sea_orm::{ActiveValue, TransactionTrait};
use serde::Deserialize;

use crate::constants::{ACTION_CREATE, ACTION_DELETE, ACTION_UPDATE};
use crate::entities::project::{self, InvoiceStatus, Priority, ProjectStatus};
use crate::error::{ProductionError, Result};
use crate::notify::{Notice, ProjectBoardData, ProjectRef};
use crate::progress;
use crate::repositories::project::NewProject;
use crate::repositories::{ProjectRepository, TaskRepository};

use super::{Actor, ProductionService};

/// Partial update of a project. Absent fields are left untouched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectChanges {
    pub manager_id: Option<i32>,
    pub client_id: Option<i32>,
    pub name: Option<String>,
    pub number: Option<String>,
    pub order_number: Option<String>,
    pub start: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub invoiced: Option<InvoiceStatus>,
    pub secretariat: Option<bool>,
}

impl ProjectChanges {
    fn into_active(self, project: project::Model) -> project::ActiveModel {
        let mut active: project::ActiveModel = project.into();
        if let Some(manager_id) = self.manager_id {
            active.manager_id = ActiveValue::Set(manager_id);
        }
        if let Some(client_id) = self.client_id {
            active.client_id = ActiveValue::Set(client_id);
        }
        if let Some(name) = self.name {
            active.name = ActiveValue::Set(name);
        }
        if let Some(number) = self.number {
            active.number = ActiveValue::Set(number);
        }
        if let Some(order_number) = self.order_number {
            active.order_number = ActiveValue::Set(order_number);
        }
        if let Some(start) = self.start {
            active.start = ActiveValue::Set(start);
        }
        if let Some(deadline) = self.deadline {
            active.deadline = ActiveValue::Set(deadline);
        }
        if let Some(status) = self.status {
            active.status = ActiveValue::Set(status);
            if status == ProjectStatus::Completed {
                active.progress = ActiveValue::Set(100);
            }
        }
        if let Some(priority) = self.priority {
            active.priority = ActiveValue::Set(priority);
        }
        if let Some(invoiced) = self.invoiced {
            active.invoiced = ActiveValue::Set(invoiced);
        }
        if let Some(secretariat) = self.secretariat {
            active.secretariat = ActiveValue::Set(secretariat);
        }
        active
    }
}

impl ProductionService {
    pub async fn get_project(&self, project_id: i32) -> Result<project::Model> {
        ProjectRepository::get_by_id(&self.storage.conn, project_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("project", project_id))
    }

    /// Create a project and announce it to the admins.
    pub async fn create_project(&self, actor: Actor, new_project: NewProject) -> Result<project::Model> {
        actor.require_admin("create projects")?;

        let project = ProjectRepository::create(&self.storage.conn, new_project).await?;
        info!("Project {} ({}) created by user {}", project.number, project.id, actor.user_id);

        self.deliver(Notice::ProjectCreated(project.clone())).await;
        self.deliver(Notice::ProjectBoard(board_data(&project, ACTION_CREATE))).await;
        Ok(project)
    }

    /// Apply changes to a project.
    ///
    /// Marking it completed forces full progress. Moving a completed project to any other
    /// status brings its progress back under 100 from the task counts.
    pub async fn update_project(&self, actor: Actor, project_id: i32, changes: ProjectChanges) -> Result<project::Model> {
        actor.require_admin("update projects")?;

        let _guard = self.locks.acquire(project_id).await;
        let txn = self.storage.conn.begin().await?;
        let current = ProjectRepository::get_by_id(&txn, project_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("project", project_id))?;

        let status = changes.status.unwrap_or(current.status);
        let reopened = status != ProjectStatus::Completed && current.progress >= 100;
        let mut active = changes.into_active(current);
        if reopened {
            let (total, completed) = TaskRepository::count_for_project(&txn, project_id).await?;
            active.progress = ActiveValue::Set(progress::reopened_percent(completed, total));
        }

        let project = ProjectRepository::update(&txn, active).await?;
        txn.commit().await?;
        info!("Project {} updated by user {}", project.id, actor.user_id);

        self.deliver(Notice::ProjectBoard(board_data(&project, ACTION_UPDATE))).await;
        Ok(project)
    }

    /// Delete a project with its files, tasks, documents and upload directory.
    pub async fn delete_project(&self, actor: Actor, project_id: i32) -> Result<()> {
        actor.require_admin("delete projects")?;

        {
            let _guard = self.locks.acquire(project_id).await;
            let txn = self.storage.conn.begin().await?;
            let project = ProjectRepository::get_by_id(&txn, project_id)
                .await?
                .ok_or_else(|| ProductionError::not_found("project", project_id))?;
            let status = project.status;
            ProjectRepository::delete_cascade(&txn, project).await?;

            let dir = self.uploads.project_dir(project_id);
            if tokio::fs::try_exists(&dir).await? {
                tokio::fs::remove_dir_all(&dir).await?;
                info!("Removed upload directory {}", dir.display());
            }
            txn.commit().await?;

            info!("Project {} deleted by user {}", project_id, actor.user_id);
            self.deliver(Notice::ProjectBoard(ProjectBoardData {
                project: ProjectRef::Id(project_id),
                action: ACTION_DELETE,
                project_status: status.board_label(),
            }))
            .await;
        }

        self.locks.forget(project_id);
        Ok(())
    }

    /// Recount a project's finished tasks and store its progress and status.
    pub async fn recompute_project_progress(&self, project_id: i32) -> Result<project::Model> {
        let _guard = self.locks.acquire(project_id).await;
        if ProjectRepository::get_by_id(&self.storage.conn, project_id).await?.is_none() {
            return Err(ProductionError::not_found("project", project_id));
        }
        Ok(progress::recompute_project_progress(&self.storage.conn, project_id).await?)
    }
}

fn board_data(project: &project::Model, action: &'static str) -> ProjectBoardData {
    ProjectBoardData {
        project: ProjectRef::Full(project.clone()),
        action,
        project_status: project.status.board_label(),
    }
}
