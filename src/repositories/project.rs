//! Project repository for database operations.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait,
};

use crate::entities::project::{InvoiceStatus, Priority, ProjectStatus};
use crate::entities::{
    client, comment_file, document, file_production, notification_project, notification_task, project, task,
    task_user,
};

/// Fields needed to create a project.
#[derive(Clone, Debug)]
pub struct NewProject {
    pub manager_id: i32,
    pub client_id: i32,
    pub name: String,
    pub number: String,
    pub order_number: String,
    pub start: NaiveDate,
    pub deadline: NaiveDate,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub invoiced: InvoiceStatus,
    pub secretariat: bool,
}

/// Repository for project-related database operations.
pub struct ProjectRepository;

impl ProjectRepository {
    /// Get a single project by id.
    pub async fn get_by_id<C>(conn: &C, id: i32) -> Result<Option<project::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(project::Entity::find_by_id(id).one(conn).await?)
    }

    /// Get all projects, closest deadline first.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<project::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(project::Entity::find()
            .order_by_asc(project::Column::Deadline)
            .order_by_asc(project::Column::Id)
            .all(conn)
            .await?)
    }

    /// Projects in any of `statuses`, optionally restricted to one manager.
    pub async fn get_by_statuses<C>(
        conn: &C,
        statuses: &[ProjectStatus],
        manager_id: Option<i32>,
    ) -> Result<Vec<project::Model>>
    where
        C: ConnectionTrait,
    {
        let mut query = project::Entity::find().filter(project::Column::Status.is_in(statuses.iter().copied()));
        if let Some(manager_id) = manager_id {
            query = query.filter(project::Column::ManagerId.eq(manager_id));
        }
        Ok(query
            .order_by_asc(project::Column::Deadline)
            .order_by_asc(project::Column::Id)
            .all(conn)
            .await?)
    }

    /// Secretariat projects in any of the invoice states.
    pub async fn get_by_invoice<C>(conn: &C, invoiced: &[InvoiceStatus]) -> Result<Vec<project::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(project::Entity::find()
            .filter(project::Column::Secretariat.eq(true))
            .filter(project::Column::Invoiced.is_in(invoiced.iter().copied()))
            .order_by_asc(project::Column::Deadline)
            .order_by_asc(project::Column::Id)
            .all(conn)
            .await?)
    }

    /// Insert a new project. A project created as completed starts at full progress.
    pub async fn create<C>(conn: &C, new_project: NewProject) -> Result<project::Model>
    where
        C: ConnectionTrait,
    {
        let progress = if new_project.status == ProjectStatus::Completed { 100 } else { 0 };
        Ok(project::ActiveModel {
            id: ActiveValue::NotSet,
            manager_id: ActiveValue::Set(new_project.manager_id),
            client_id: ActiveValue::Set(new_project.client_id),
            name: ActiveValue::Set(new_project.name),
            number: ActiveValue::Set(new_project.number),
            order_number: ActiveValue::Set(new_project.order_number),
            start: ActiveValue::Set(new_project.start),
            deadline: ActiveValue::Set(new_project.deadline),
            progress: ActiveValue::Set(progress),
            status: ActiveValue::Set(new_project.status),
            priority: ActiveValue::Set(new_project.priority),
            invoiced: ActiveValue::Set(new_project.invoiced),
            secretariat: ActiveValue::Set(new_project.secretariat),
            date_add: ActiveValue::Set(Utc::now().date_naive()),
        }
        .insert(conn)
        .await?)
    }

    /// Update a project in the database.
    pub async fn update<C>(conn: &C, project: project::ActiveModel) -> Result<project::Model>
    where
        C: ConnectionTrait,
    {
        Ok(project.update(conn).await?)
    }

    /// Store a recomputed progress and status.
    pub async fn set_progress<C>(
        conn: &C,
        project: project::Model,
        progress: i32,
        status: ProjectStatus,
    ) -> Result<project::Model>
    where
        C: ConnectionTrait,
    {
        let mut active: project::ActiveModel = project.into();
        active.progress = ActiveValue::Set(progress);
        active.status = ActiveValue::Set(status);
        Ok(active.update(conn).await?)
    }

    /// Delete a project and every row hanging off it.
    pub async fn delete_cascade<C>(conn: &C, project: project::Model) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let project_id = project.id;
        let file_ids = || {
            file_production::Entity::find()
                .filter(file_production::Column::ProjectId.eq(project_id))
                .select_only()
                .column(file_production::Column::Id)
                .into_query()
        };

        task_user::Entity::delete_many()
            .filter(
                task_user::Column::TaskId.in_subquery(
                    task::Entity::find()
                        .filter(task::Column::ProjectId.eq(project_id))
                        .select_only()
                        .column(task::Column::Id)
                        .into_query(),
                ),
            )
            .exec(conn)
            .await?;
        task::Entity::update_many()
            .col_expr(task::Column::NextTaskId, Expr::value(Option::<i32>::None))
            .col_expr(task::Column::PreviousTaskId, Expr::value(Option::<i32>::None))
            .filter(task::Column::ProjectId.eq(project_id))
            .exec(conn)
            .await?;
        task::Entity::delete_many()
            .filter(task::Column::ProjectId.eq(project_id))
            .exec(conn)
            .await?;
        comment_file::Entity::delete_many()
            .filter(comment_file::Column::FileId.in_subquery(file_ids()))
            .exec(conn)
            .await?;
        notification_task::Entity::delete_many()
            .filter(notification_task::Column::FileId.in_subquery(file_ids()))
            .exec(conn)
            .await?;
        file_production::Entity::delete_many()
            .filter(file_production::Column::ProjectId.eq(project_id))
            .exec(conn)
            .await?;
        document::Entity::delete_many()
            .filter(document::Column::ProjectId.eq(project_id))
            .exec(conn)
            .await?;
        notification_project::Entity::delete_many()
            .filter(notification_project::Column::ProjectId.eq(project_id))
            .exec(conn)
            .await?;
        project.delete(conn).await?;
        Ok(())
    }

    /// Create a client.
    pub async fn create_client<C>(conn: &C, name: &str, email: &str, address: &str) -> Result<client::Model>
    where
        C: ConnectionTrait,
    {
        Ok(client::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name.to_string()),
            email: ActiveValue::Set(email.to_string()),
            phone_number: ActiveValue::Set(None),
            address: ActiveValue::Set(address.to_string()),
            color: ActiveValue::Set("#c8c8c8".to_string()),
            date_add: ActiveValue::Set(Utc::now().date_naive()),
        }
        .insert(conn)
        .await?)
    }
}
