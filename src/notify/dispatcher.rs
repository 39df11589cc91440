use anyhow::{Context, Result};
use log::{debug, info};
use sea_orm::ConnectionTrait;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::entities::{project, task};
use crate::repositories::{DepartmentRepository, FileRepository, NotificationRepository, UserRepository};

use super::{BoardEvent, Event, ProjectBoardData, Publisher, TopicKind};

/// Something worth telling connected users about.
#[derive(Clone, Debug)]
pub enum Notice {
    /// A task was created in a department.
    TaskAppeared(task::Model),
    /// A project was added.
    ProjectCreated(project::Model),
    /// The project board changed.
    ProjectBoard(ProjectBoardData),
    /// A file board changed.
    Board(BoardEvent),
}

/// Unread notification counters of one user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnreadCount {
    pub task: u64,
    pub project: u64,
}

/// Persists notifications and fans them out to their audience.
#[derive(Clone)]
pub struct NotificationDispatcher {
    publisher: Arc<dyn Publisher>,
}

impl NotificationDispatcher {
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self { publisher }
    }

    /// Deliver a notice. Returns how many users it was addressed to.
    pub async fn notify<C>(&self, conn: &C, notice: Notice) -> Result<usize>
    where
        C: ConnectionTrait,
    {
        match notice {
            Notice::TaskAppeared(task) => self.task_appeared(conn, &task).await,
            Notice::ProjectCreated(project) => self.project_created(conn, &project).await,
            Notice::ProjectBoard(data) => self.project_board(conn, data).await,
            Notice::Board(event) => self.board(conn, event).await,
        }
    }

    /// Notify admins and the department's employees that a task appeared.
    pub async fn task_appeared<C>(&self, conn: &C, task: &task::Model) -> Result<usize>
    where
        C: ConnectionTrait,
    {
        let department = DepartmentRepository::get_by_id(conn, task.department_id)
            .await?
            .with_context(|| format!("Department not found: {}", task.department_id))?;
        let file = FileRepository::get_by_id(conn, task.file_id)
            .await?
            .with_context(|| format!("File not found: {}", task.file_id))?;

        let mut audience = BTreeSet::new();
        for user in UserRepository::get_admins(conn).await? {
            audience.insert(user.id);
        }
        for user in UserRepository::get_employees_in_department(conn, department.id).await? {
            audience.insert(user.id);
        }

        let content = format!("New Task ({}) appeared in {}", file.name, department.name);
        for user_id in &audience {
            let notification =
                NotificationRepository::create_task_notification(conn, *user_id, department.id, file.id, &content)
                    .await?;
            let message = json!({ "notification": notification, "task": task });
            self.publish(TopicKind::TaskNotifications, *user_id, message);
        }

        info!(
            "Task {} appeared in {}: notified {} users",
            task.id,
            department.name,
            audience.len()
        );
        Ok(audience.len())
    }

    /// Notify admins that a project was added.
    pub async fn project_created<C>(&self, conn: &C, project: &project::Model) -> Result<usize>
    where
        C: ConnectionTrait,
    {
        let admins = UserRepository::get_admins(conn).await?;
        let content = format!("Project ({}) has been added", project.number);
        for admin in &admins {
            let notification =
                NotificationRepository::create_project_notification(conn, admin.id, project.id, &content).await?;
            let message = json!({ "notification": notification, "project": project });
            self.publish(TopicKind::ProjectNotifications, admin.id, message);
        }
        info!("Project {} created: notified {} admins", project.number, admins.len());
        Ok(admins.len())
    }

    /// Push a project board change to every admin.
    pub async fn project_board<C>(&self, conn: &C, data: ProjectBoardData) -> Result<usize>
    where
        C: ConnectionTrait,
    {
        let admins = UserRepository::get_admins(conn).await?;
        let message = serde_json::to_value(&data)?;
        for admin in &admins {
            self.publish(TopicKind::ProjectBoardData, admin.id, message.clone());
        }
        debug!("Project board {} sent to {} admins", data.action, admins.len());
        Ok(admins.len())
    }

    /// Push a file board refresh: admins watch the project view, everyone may watch a
    /// department queue.
    pub async fn board<C>(&self, conn: &C, event: BoardEvent) -> Result<usize>
    where
        C: ConnectionTrait,
    {
        let admins = UserRepository::get_admins(conn).await?;
        let everyone = UserRepository::get_all(conn).await?;
        let message = serde_json::to_value(&event)?;

        for admin in &admins {
            self.publish(TopicKind::TaskProjectBoard, admin.id, message.clone());
        }
        for user in &everyone {
            self.publish(TopicKind::TaskDepartmentBoard, user.id, message.clone());
        }
        debug!(
            "Board refresh sent to {} admins and {} users",
            admins.len(),
            everyone.len()
        );
        Ok(everyone.len())
    }

    /// Unread task and project notifications of a user.
    pub async fn unread_count<C>(&self, conn: &C, user_id: i32) -> Result<UnreadCount>
    where
        C: ConnectionTrait,
    {
        Ok(UnreadCount {
            task: NotificationRepository::count_unread_task(conn, user_id).await?,
            project: NotificationRepository::count_unread_project(conn, user_id).await?,
        })
    }

    fn publish(&self, kind: TopicKind, user_id: i32, message: serde_json::Value) {
        self.publisher.publish(&kind.for_user(user_id), Event::new(kind, message));
    }
}
