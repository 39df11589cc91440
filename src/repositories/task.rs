//! Task repository for database operations.

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait,
};

use crate::entities::{department, task, task_user};

/// Repository for task-related database operations.
pub struct TaskRepository;

impl TaskRepository {
    /// Get a single task by id.
    pub async fn get_by_id<C>(conn: &C, id: i32) -> Result<Option<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find_by_id(id).one(conn).await?)
    }

    /// Get the task a file already has for a department, if any.
    pub async fn get_for_file_and_department<C>(conn: &C, file_id: i32, department_id: i32) -> Result<Option<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::FileId.eq(file_id))
            .filter(task::Column::DepartmentId.eq(department_id))
            .one(conn)
            .await?)
    }

    /// Get the tasks of a file with their department rank, ordered by rank.
    pub async fn get_chain<C>(conn: &C, file_id: i32) -> Result<Vec<(task::Model, i32)>>
    where
        C: ConnectionTrait,
    {
        let rows = task::Entity::find()
            .find_also_related(department::Entity)
            .filter(task::Column::FileId.eq(file_id))
            .order_by_asc(department::Column::Order)
            .all(conn)
            .await?;

        rows.into_iter()
            .map(|(task, department)| {
                let department =
                    department.ok_or_else(|| anyhow::anyhow!("Task {} has no department", task.id))?;
                Ok((task, department.order))
            })
            .collect()
    }

    /// Get all tasks of a file ordered by department rank.
    pub async fn get_for_file<C>(conn: &C, file_id: i32) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(Self::get_chain(conn, file_id).await?.into_iter().map(|(task, _)| task).collect())
    }

    /// Count the tasks of a project, and how many of them are finished.
    pub async fn count_for_project<C>(conn: &C, project_id: i32) -> Result<(u64, u64)>
    where
        C: ConnectionTrait,
    {
        let total = task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_id))
            .count(conn)
            .await?;
        let completed = task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_id))
            .filter(task::Column::End.eq(true))
            .count(conn)
            .await?;
        Ok((total, completed))
    }

    /// Tasks queued in a department, filtered by whether they are finished and
    /// optionally by assignee.
    pub async fn get_for_department<C>(
        conn: &C,
        department_id: i32,
        ended: bool,
        assignee: Option<i32>,
    ) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        let mut query = task::Entity::find()
            .filter(task::Column::DepartmentId.eq(department_id))
            .filter(task::Column::End.eq(ended));
        if let Some(user_id) = assignee {
            query = query.filter(
                task::Column::Id.in_subquery(
                    task_user::Entity::find()
                        .filter(task_user::Column::UserId.eq(user_id))
                        .select_only()
                        .column(task_user::Column::TaskId)
                        .into_query(),
                ),
            );
        }
        Ok(query
            .order_by_asc(task::Column::PlannedStartDate)
            .order_by_asc(task::Column::Id)
            .all(conn)
            .await?)
    }

    /// Unfinished tasks a user is assigned to.
    pub async fn get_open_for_user<C>(conn: &C, user_id: i32) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(
                task::Column::Id.in_subquery(
                    task_user::Entity::find()
                        .filter(task_user::Column::UserId.eq(user_id))
                        .select_only()
                        .column(task_user::Column::TaskId)
                        .into_query(),
                ),
            )
            .filter(task::Column::End.eq(false))
            .order_by_asc(task::Column::PlannedStartDate)
            .all(conn)
            .await?)
    }

    /// Ids of the users assigned to a task.
    pub async fn get_user_ids<C>(conn: &C, task_id: i32) -> Result<Vec<i32>>
    where
        C: ConnectionTrait,
    {
        Ok(task_user::Entity::find()
            .filter(task_user::Column::TaskId.eq(task_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|row| row.user_id)
            .collect())
    }

    /// Insert a new task.
    pub async fn insert<C>(conn: &C, task: task::ActiveModel) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        Ok(task.insert(conn).await?)
    }

    /// Assign users to a task.
    pub async fn assign_users<C>(conn: &C, task_id: i32, user_ids: &[i32]) -> Result<()>
    where
        C: ConnectionTrait,
    {
        if user_ids.is_empty() {
            return Ok(());
        }
        let rows = user_ids.iter().map(|user_id| task_user::ActiveModel {
            task_id: sea_orm::ActiveValue::Set(task_id),
            user_id: sea_orm::ActiveValue::Set(*user_id),
        });
        task_user::Entity::insert_many(rows).exec(conn).await?;
        Ok(())
    }

    /// Write every column of a task back.
    pub async fn save<C>(conn: &C, task: task::Model) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        let active: task::ActiveModel = task.into();
        Ok(active.reset_all().update(conn).await?)
    }

    /// Delete a task from the database.
    pub async fn delete<C>(conn: &C, task: task::Model) -> Result<()>
    where
        C: ConnectionTrait,
    {
        task_user::Entity::delete_many()
            .filter(task_user::Column::TaskId.eq(task.id))
            .exec(conn)
            .await?;
        task.delete(conn).await?;
        Ok(())
    }

    /// Delete every task of a file.
    pub async fn delete_for_file<C>(conn: &C, file_id: i32) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        task_user::Entity::delete_many()
            .filter(
                task_user::Column::TaskId.in_subquery(
                    task::Entity::find()
                        .filter(task::Column::FileId.eq(file_id))
                        .select_only()
                        .column(task::Column::Id)
                        .into_query(),
                ),
            )
            .exec(conn)
            .await?;
        // Links point inside the file only, so clearing them first keeps the foreign keys satisfied.
        task::Entity::update_many()
            .col_expr(task::Column::NextTaskId, sea_orm::sea_query::Expr::value(Option::<i32>::None))
            .col_expr(task::Column::PreviousTaskId, sea_orm::sea_query::Expr::value(Option::<i32>::None))
            .filter(task::Column::FileId.eq(file_id))
            .exec(conn)
            .await?;
        let result = task::Entity::delete_many()
            .filter(task::Column::FileId.eq(file_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
