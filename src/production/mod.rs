//! Production service: the transactional entry points of the backend.
//!
//! Operations are split by area across the submodules, each adding methods to
//! [`ProductionService`]:
//!
//! - `tasks`: chain mutations (create, update, delete)
//! - `projects`: project lifecycle and progress recompute
//! - `files`: file and document registration and removal
//! - `comments`: file comments
//! - `notifications`: unread listings, counts and read flags
//! - `boards`: filtered, paginated project and department views
//!
//! Every chain mutation holds its project's lock for the whole unit of work and commits
//! before any notification leaves the process.

mod boards;
mod comments;
mod files;
mod notifications;
mod projects;
mod tasks;

pub use boards::{InvoiceFilter, ProductionFilter, QueueFilter};
pub use projects::ProjectChanges;
pub use tasks::NewTask;

use log::warn;
use sea_orm::ConnectionTrait;
use std::sync::Arc;

use crate::entities::user::{self, Role};
use crate::error::{ProductionError, Result};
use crate::notify::{BoardEvent, Notice, NotificationDispatcher, ProjectProgress, Publisher};
use crate::realtime::Identity;
use crate::repositories::{FileRepository, ProjectRepository, TaskRepository};
use crate::storage::{LocalStorage, ProjectLocks, UploadPaths};

/// The user performing an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: i32, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    fn require_admin(&self, action: &str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ProductionError::Forbidden(format!("only admins may {}", action)))
        }
    }
}

impl From<&user::Model> for Actor {
    fn from(user: &user::Model) -> Self {
        Self::new(user.id, user.role)
    }
}

impl From<Identity> for Actor {
    fn from(identity: Identity) -> Self {
        Self::new(identity.user_id, identity.role)
    }
}

/// Production tracking operations over one database.
#[derive(Clone)]
pub struct ProductionService {
    storage: Arc<LocalStorage>,
    uploads: UploadPaths,
    locks: ProjectLocks,
    dispatcher: NotificationDispatcher,
}

impl ProductionService {
    pub fn new(storage: Arc<LocalStorage>, uploads: UploadPaths, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            storage,
            uploads,
            locks: ProjectLocks::new(),
            dispatcher: NotificationDispatcher::new(publisher),
        }
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn uploads(&self) -> &UploadPaths {
        &self.uploads
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Deliver a notice after the triggering change is committed.
    ///
    /// Delivery is best effort: a failure is logged and the committed change stands.
    async fn deliver(&self, notice: Notice) {
        if let Err(e) = self.dispatcher.notify(&self.storage.conn, notice).await {
            warn!("Failed to deliver notification: {:#}", e);
        }
    }

    /// Board refresh describing the current chain of a file.
    async fn task_board_event<C>(&self, conn: &C, file_id: i32) -> Result<BoardEvent>
    where
        C: ConnectionTrait,
    {
        let file = FileRepository::get_by_id(conn, file_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("file", file_id))?;
        let project = ProjectRepository::get_by_id(conn, file.project_id)
            .await?
            .ok_or_else(|| ProductionError::not_found("project", file.project_id))?;
        let tasks = TaskRepository::get_for_file(conn, file_id).await?;
        Ok(BoardEvent::Task {
            file,
            tasks,
            project: ProjectProgress::from(&project),
        })
    }
}
