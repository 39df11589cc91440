use std::fmt;

/// The five per-user realtime channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TopicKind {
    ProjectNotifications,
    ProjectBoardData,
    TaskNotifications,
    TaskProjectBoard,
    TaskDepartmentBoard,
}

impl TopicKind {
    pub const ALL: [TopicKind; 5] = [
        TopicKind::ProjectNotifications,
        TopicKind::ProjectBoardData,
        TopicKind::TaskNotifications,
        TopicKind::TaskProjectBoard,
        TopicKind::TaskDepartmentBoard,
    ];

    /// Websocket endpoint serving this kind.
    pub fn path(self) -> &'static str {
        match self {
            TopicKind::ProjectNotifications => "/ws/project/",
            TopicKind::ProjectBoardData => "/ws/project-data/",
            TopicKind::TaskNotifications => "/ws/task/",
            TopicKind::TaskProjectBoard => "/ws/task-project/",
            TopicKind::TaskDepartmentBoard => "/ws/file-department/",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            TopicKind::ProjectNotifications => "project-notifications",
            TopicKind::ProjectBoardData => "project-board-data",
            TopicKind::TaskNotifications => "task-notifications",
            TopicKind::TaskProjectBoard => "file-modify-project",
            TopicKind::TaskDepartmentBoard => "file-modify-department",
        }
    }

    /// Envelope `type` a connection on this kind relays.
    pub fn relay_type(self) -> &'static str {
        match self {
            TopicKind::ProjectNotifications => "project_notification",
            TopicKind::ProjectBoardData => "project_data",
            TopicKind::TaskNotifications => "task_noti",
            TopicKind::TaskProjectBoard => "task_modify_project",
            TopicKind::TaskDepartmentBoard => "task_modify_department",
        }
    }

    pub fn for_user(self, user_id: i32) -> Topic {
        Topic { kind: self, user_id }
    }
}

/// A user's subscription channel of one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Topic {
    pub kind: TopicKind,
    pub user_id: i32,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.prefix(), self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names_are_user_scoped() {
        assert_eq!(TopicKind::TaskNotifications.for_user(4).to_string(), "task-notifications:4");
        assert_eq!(TopicKind::TaskDepartmentBoard.for_user(1).to_string(), "file-modify-department:1");
    }

    #[test]
    fn endpoints_are_distinct() {
        let mut paths: Vec<&str> = TopicKind::ALL.iter().map(|kind| kind.path()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), TopicKind::ALL.len());
    }
}
