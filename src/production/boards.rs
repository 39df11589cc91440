use std::str::FromStr;

use crate::constants::{MESSAGE_UNKNOWN_FILE_STATUS, MESSAGE_UNKNOWN_PROJECT_STATUS};
use crate::entities::project::{self, InvoiceStatus, ProjectStatus};
use crate::entities::task;
use crate::error::{ProductionError, Result};
use crate::repositories::{DepartmentRepository, ProjectRepository, TaskRepository};
use crate::utils::pagination::{paginate, Page, PageRequest};

use super::{Actor, ProductionService};

/// Status keyword of the production project board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductionFilter {
    Active,
    MyActive,
    Completed,
    MyCompleted,
    Suspended,
    MySuspended,
}

impl ProductionFilter {
    pub fn statuses(self) -> &'static [ProjectStatus] {
        match self {
            ProductionFilter::Active | ProductionFilter::MyActive => &[ProjectStatus::Started, ProjectStatus::InDesign],
            ProductionFilter::Completed | ProductionFilter::MyCompleted => &[ProjectStatus::Completed],
            ProductionFilter::Suspended | ProductionFilter::MySuspended => &[ProjectStatus::Suspended],
        }
    }

    /// `My_` keywords only show projects managed by the actor.
    pub fn mine(self) -> bool {
        matches!(
            self,
            ProductionFilter::MyActive | ProductionFilter::MyCompleted | ProductionFilter::MySuspended
        )
    }
}

impl FromStr for ProductionFilter {
    type Err = ProductionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Active" => Ok(ProductionFilter::Active),
            "My_Active" => Ok(ProductionFilter::MyActive),
            "Completed" => Ok(ProductionFilter::Completed),
            "My_Completed" => Ok(ProductionFilter::MyCompleted),
            "Suspended" => Ok(ProductionFilter::Suspended),
            "My_Suspended" => Ok(ProductionFilter::MySuspended),
            _ => Err(status_filter(s, MESSAGE_UNKNOWN_PROJECT_STATUS)),
        }
    }
}

/// Invoice keyword of the secretariat board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvoiceFilter {
    Yes,
    No,
}

impl InvoiceFilter {
    pub fn statuses(self) -> &'static [InvoiceStatus] {
        match self {
            InvoiceFilter::Yes => &[InvoiceStatus::Yes, InvoiceStatus::LackOfInvoice],
            InvoiceFilter::No => &[InvoiceStatus::No],
        }
    }
}

impl FromStr for InvoiceFilter {
    type Err = ProductionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "YES" => Ok(InvoiceFilter::Yes),
            "NO" => Ok(InvoiceFilter::No),
            _ => Err(status_filter(s, MESSAGE_UNKNOWN_PROJECT_STATUS)),
        }
    }
}

/// Keyword of a department task queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueFilter {
    /// Tasks not finished yet.
    Active,
    /// Finished tasks.
    Completed,
}

impl QueueFilter {
    fn ended(self) -> bool {
        self == QueueFilter::Completed
    }
}

impl FromStr for QueueFilter {
    type Err = ProductionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Active" => Ok(QueueFilter::Active),
            "Completed" => Ok(QueueFilter::Completed),
            _ => Err(status_filter(s, MESSAGE_UNKNOWN_FILE_STATUS)),
        }
    }
}

fn status_filter(keyword: &str, message: &'static str) -> ProductionError {
    ProductionError::StatusFilter {
        keyword: keyword.to_string(),
        message,
    }
}

impl ProductionService {
    /// Production projects matching a status keyword.
    pub async fn project_board(&self, actor: Actor, keyword: &str, page: PageRequest) -> Result<Page<project::Model>> {
        let filter: ProductionFilter = keyword.parse()?;
        let manager = filter.mine().then_some(actor.user_id);
        let projects = ProjectRepository::get_by_statuses(&self.storage.conn, filter.statuses(), manager).await?;
        Ok(paginate(projects, page))
    }

    /// Secretariat projects matching an invoice keyword. Admins only.
    pub async fn secretariat_board(
        &self,
        actor: Actor,
        keyword: &str,
        page: PageRequest,
    ) -> Result<Page<project::Model>> {
        actor.require_admin("view the secretariat board")?;
        let filter: InvoiceFilter = keyword.parse()?;
        let projects = ProjectRepository::get_by_invoice(&self.storage.conn, filter.statuses()).await?;
        Ok(paginate(projects, page))
    }

    /// Tasks queued in a department. Employees only see tasks assigned to them.
    pub async fn department_queue(
        &self,
        actor: Actor,
        department_id: i32,
        keyword: &str,
        page: PageRequest,
    ) -> Result<Page<task::Model>> {
        let filter: QueueFilter = keyword.parse()?;
        if DepartmentRepository::get_by_id(&self.storage.conn, department_id).await?.is_none() {
            return Err(ProductionError::not_found("department", department_id));
        }
        let assignee = (!actor.is_admin()).then_some(actor.user_id);
        let tasks =
            TaskRepository::get_for_department(&self.storage.conn, department_id, filter.ended(), assignee).await?;
        Ok(paginate(tasks, page))
    }
}
