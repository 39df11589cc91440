//! Task entity: one department visit of a production file.
//!
//! `next_task_id` / `previous_task_id` link the tasks of one file in department-rank
//! order. They are plain nullable foreign keys; the chain itself is rebuilt in memory
//! by [`crate::chain::Chain`] whenever it has to be mutated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub file_id: i32,
    pub department_id: i32,
    pub project_id: i32,
    pub manager_id: i32,
    pub planned_start_date: DateTimeUtc,
    pub planned_end_date: DateTimeUtc,
    pub real_start_date: Option<DateTimeUtc>,
    pub real_end_date: Option<DateTimeUtc>,
    pub paused_date: Option<DateTimeUtc>,
    pub permission: bool,
    pub start: bool,
    pub paused: bool,
    pub end: bool,
    pub next_task_id: Option<i32>,
    pub previous_task_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::file_production::Entity",
        from = "Column::FileId",
        to = "super::file_production::Column::Id",
        on_delete = "Cascade"
    )]
    File,
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id",
        on_delete = "Cascade"
    )]
    Department,
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::NextTaskId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    NextTask,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::PreviousTaskId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    PreviousTask,
}

impl Related<super::file_production::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::File.def()
    }
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        super::task_user::Relation::User.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::task_user::Relation::Task.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Clears every progress flag. Used when an upstream change invalidates this task.
    pub fn reset_flags(&mut self) -> bool {
        let changed = self.permission || self.start || self.paused || self.end;
        self.permission = false;
        self.start = false;
        self.paused = false;
        self.end = false;
        changed
    }
}
