use chrono::{DateTime, Utc};
use log::{debug, info};
use sea_orm::{ActiveValue, ConnectionTrait, TransactionTrait};
use serde::Deserialize;

use crate::chain::{Chain, TaskUpdate, UpdateOutcome};
use crate::entities::task;
use crate::error::{ProductionError, Result};
use crate::notify::Notice;
use crate::progress;
use crate::repositories::{DepartmentRepository, FileRepository, TaskRepository};

use super::{Actor, ProductionService};

/// Fields of a task to create.
#[derive(Clone, Debug, Deserialize)]
pub struct NewTask {
    pub file_id: i32,
    pub department_id: i32,
    pub manager_id: i32,
    pub planned_start_date: DateTime<Utc>,
    pub planned_end_date: DateTime<Utc>,
    #[serde(default)]
    pub users: Vec<i32>,
}

impl ProductionService {
    /// Tasks of a file in chain order.
    pub async fn tasks_for_file(&self, file_id: i32) -> Result<Vec<task::Model>> {
        Ok(TaskRepository::get_for_file(&self.storage.conn, file_id).await?)
    }

    pub async fn get_task(&self, task_id: i32) -> Result<task::Model> {
        TaskRepository::get_by_id(&self.storage.conn, task_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("task", task_id))
    }

    /// Unfinished tasks assigned to a user, for the calendar view.
    pub async fn open_tasks_for_user(&self, user_id: i32) -> Result<Vec<task::Model>> {
        Ok(TaskRepository::get_open_for_user(&self.storage.conn, user_id).await?)
    }

    /// Creates a task for a file in a department and links it into the file's chain.
    ///
    /// # Arguments
    /// * `actor` - Must be an admin
    /// * `new_task` - Target file and department, manager, planned dates and assignees
    ///
    /// # Returns
    /// The stored task with its permission and links as decided by the chain
    ///
    /// # Errors
    /// `DuplicateTask` when the file already visits that department, `NotFound` for an
    /// unknown file or department, `Forbidden` for non-admins
    pub async fn create_task(&self, actor: Actor, new_task: NewTask) -> Result<task::Model> {
        actor.require_admin("create tasks")?;

        let file = FileRepository::get_by_id(&self.storage.conn, new_task.file_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("file", new_task.file_id))?;
        let department = DepartmentRepository::get_by_id(&self.storage.conn, new_task.department_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("department", new_task.department_id))?;

        let project_id = file.project_id;
        let _guard = self.locks.acquire(project_id).await;
        let txn = self.storage.conn.begin().await?;

        if TaskRepository::get_for_file_and_department(&txn, file.id, department.id)
            .await?
            .is_some()
        {
            return Err(ProductionError::DuplicateTask {
                file_id: file.id,
                department_id: department.id,
            });
        }

        let mut chain = Chain::load(file.id, TaskRepository::get_chain(&txn, file.id).await?);

        let inserted = TaskRepository::insert(
            &txn,
            task::ActiveModel {
                id: ActiveValue::NotSet,
                file_id: ActiveValue::Set(file.id),
                department_id: ActiveValue::Set(department.id),
                project_id: ActiveValue::Set(file.project_id),
                manager_id: ActiveValue::Set(new_task.manager_id),
                planned_start_date: ActiveValue::Set(new_task.planned_start_date),
                planned_end_date: ActiveValue::Set(new_task.planned_end_date),
                real_start_date: ActiveValue::Set(None),
                real_end_date: ActiveValue::Set(None),
                paused_date: ActiveValue::Set(None),
                permission: ActiveValue::Set(false),
                start: ActiveValue::Set(false),
                paused: ActiveValue::Set(false),
                end: ActiveValue::Set(false),
                next_task_id: ActiveValue::Set(None),
                previous_task_id: ActiveValue::Set(None),
            },
        )
        .await?;
        TaskRepository::assign_users(&txn, inserted.id, &new_task.users).await?;

        let task_id = inserted.id;
        chain.admit(inserted, department.order)?;
        persist(&txn, &mut chain).await?;

        FileRepository::mark_seen(&txn, file).await?;
        progress::recompute_project_progress(&txn, project_id).await?;

        let created = TaskRepository::get_by_id(&txn, task_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("task", task_id))?;
        let board = self.task_board_event(&txn, created.file_id).await?;
        txn.commit().await?;

        info!(
            "Created task {} for file {} in {} (permission: {})",
            created.id, created.file_id, department.name, created.permission
        );

        self.deliver(Notice::TaskAppeared(created.clone())).await;
        self.deliver(Notice::Board(board)).await;
        Ok(created)
    }

    /// Applies an update to a task that holds permission.
    ///
    /// Finishing a task passes permission to the next task of the chain; any other change
    /// restarts the tasks behind it. Project progress is recomputed in the same transaction.
    ///
    /// # Returns
    /// `UpdateOutcome::PermissionDenied` when the task does not hold permission, in which
    /// case nothing was written
    pub async fn update_task(&self, actor: Actor, task_id: i32, update: TaskUpdate) -> Result<UpdateOutcome> {
        let project_id = self.get_task(task_id).await?.project_id;

        let _guard = self.locks.acquire(project_id).await;
        let txn = self.storage.conn.begin().await?;

        let current = TaskRepository::get_by_id(&txn, task_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("task", task_id))?;
        let mut chain = Chain::load(current.file_id, TaskRepository::get_chain(&txn, current.file_id).await?);

        let outcome = chain.apply(task_id, &update)?;
        if let UpdateOutcome::PermissionDenied { .. } = outcome {
            debug!("User {} tried to update task {} without permission", actor.user_id, task_id);
            return Ok(outcome);
        }

        persist(&txn, &mut chain).await?;
        progress::recompute_project_progress(&txn, project_id).await?;
        let board = self.task_board_event(&txn, current.file_id).await?;
        txn.commit().await?;

        info!("User {} updated task {}", actor.user_id, task_id);
        self.deliver(Notice::Board(board)).await;
        Ok(outcome)
    }

    /// Removes a task and repairs the chain around it.
    ///
    /// # Errors
    /// `NotFound` for an unknown task, `Forbidden` for non-admins
    pub async fn delete_task(&self, actor: Actor, task_id: i32) -> Result<()> {
        actor.require_admin("delete tasks")?;
        let project_id = self.get_task(task_id).await?.project_id;

        let _guard = self.locks.acquire(project_id).await;
        let txn = self.storage.conn.begin().await?;

        let current = TaskRepository::get_by_id(&txn, task_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("task", task_id))?;
        let mut chain = Chain::load(current.file_id, TaskRepository::get_chain(&txn, current.file_id).await?);

        let removed = chain.remove(task_id)?;
        // Neighbours stop pointing at the task before its row goes away.
        persist(&txn, &mut chain).await?;
        TaskRepository::delete(&txn, removed).await?;

        progress::recompute_project_progress(&txn, project_id).await?;
        let board = self.task_board_event(&txn, current.file_id).await?;
        txn.commit().await?;

        info!("User {} deleted task {} of file {}", actor.user_id, task_id, current.file_id);
        self.deliver(Notice::Board(board)).await;
        Ok(())
    }
}

/// Write every task the chain changed.
async fn persist<C>(conn: &C, chain: &mut Chain) -> Result<()>
where
    C: ConnectionTrait,
{
    let dirty = chain.take_dirty();
    debug!("Saving {} changed tasks of file {}", dirty.len(), chain.file_id());
    for task in dirty {
        TaskRepository::save(conn, task).await?;
    }
    Ok(())
}
