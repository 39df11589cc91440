//! Project progress derived from task completion.

use anyhow::Result;
use log::debug;
use sea_orm::ConnectionTrait;

use crate::entities::project::{self, ProjectStatus};
use crate::repositories::{ProjectRepository, TaskRepository};

/// Progress snapshot of a project.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub percent: i32,
    pub status: ProjectStatus,
}

/// Progress for `completed` finished tasks out of `total`.
///
/// A project without tasks stays `In design` at 0%. Otherwise it is `Completed` at
/// exactly 100% and `Started` below that.
pub fn compute(completed: u64, total: u64) -> Progress {
    if total == 0 {
        return Progress {
            percent: 0,
            status: ProjectStatus::InDesign,
        };
    }
    let completed = completed.min(total);
    let percent = (100.0 * completed as f64 / total as f64).round() as i32;
    let status = if percent == 100 {
        ProjectStatus::Completed
    } else {
        ProjectStatus::Started
    };
    Progress { percent, status }
}

/// Percentage kept by a project that leaves `Completed` by hand.
///
/// Falls back to the task count, held below 100 so the stored value never claims completion.
pub fn reopened_percent(completed: u64, total: u64) -> i32 {
    compute(completed, total).percent.min(99)
}

/// Recount a project's tasks and store the resulting progress and status.
pub async fn recompute_project_progress<C>(conn: &C, project_id: i32) -> Result<project::Model>
where
    C: ConnectionTrait,
{
    let project = ProjectRepository::get_by_id(conn, project_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Project not found: {}", project_id))?;
    let (total, completed) = TaskRepository::count_for_project(conn, project_id).await?;
    let progress = compute(completed, total);
    debug!(
        "Project {} progress {}/{} -> {}% ({:?})",
        project_id, completed, total, progress.percent, progress.status
    );

    if project.progress == progress.percent && project.status == progress.status {
        return Ok(project);
    }
    ProjectRepository::set_progress(conn, project, progress.percent, progress.status).await
}
