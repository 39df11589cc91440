use serde::Serialize;
use serde_json::{json, Value};

use crate::entities::{comment_file, file_production, project, task};

use super::TopicKind;

/// A message travelling to the subscribers of one topic.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Relay type of the topic kind the event was built for.
    pub relay: &'static str,
    pub message: Value,
}

impl Event {
    pub fn new(kind: TopicKind, message: Value) -> Self {
        Self {
            relay: kind.relay_type(),
            message,
        }
    }

    /// Outbound websocket frame: `{"message": ...}`.
    pub fn to_frame(&self) -> String {
        json!({ "message": self.message }).to_string()
    }
}

/// Progress view of a project carried by board refreshes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectProgress {
    pub id: i32,
    pub progress: i32,
    pub status: project::ProjectStatus,
}

impl From<&project::Model> for ProjectProgress {
    fn from(project: &project::Model) -> Self {
        Self {
            id: project.id,
            progress: project.progress,
            status: project.status,
        }
    }
}

/// Transient board refresh. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
    /// A chain of the file changed.
    Task {
        file: file_production::Model,
        tasks: Vec<task::Model>,
        project: ProjectProgress,
    },
    CommentAdd {
        comment: comment_file::Model,
    },
    CommentDelete {
        comment: comment_file::Model,
    },
    FileDelete {
        file_id: i32,
        project: ProjectProgress,
    },
}

/// Change to the project list shown on the project board.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectBoardData {
    pub project: ProjectRef,
    pub action: &'static str,
    /// Board column: design and started projects are both `Active`.
    pub project_status: &'static str,
}

/// Deleted projects are referenced by id only.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProjectRef {
    Full(project::Model),
    Id(i32),
}
