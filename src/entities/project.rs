use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ProjectStatus {
    #[sea_orm(string_value = "In design")]
    #[serde(rename = "In design")]
    InDesign,
    #[sea_orm(string_value = "Started")]
    Started,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Suspended")]
    Suspended,
}

impl ProjectStatus {
    /// Label used on the project board, where design and started projects share one column.
    pub fn board_label(self) -> &'static str {
        match self {
            ProjectStatus::InDesign | ProjectStatus::Started => "Active",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Suspended => "Suspended",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(30))")]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "YES")]
    #[serde(rename = "YES")]
    Yes,
    #[sea_orm(string_value = "YES (LACK OF INVOICE)")]
    #[serde(rename = "YES (LACK OF INVOICE)")]
    LackOfInvoice,
    #[sea_orm(string_value = "NO")]
    #[serde(rename = "NO")]
    No,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Priority {
    #[sea_orm(string_value = "High")]
    High,
    #[sea_orm(string_value = "Normal")]
    Normal,
    #[sea_orm(string_value = "Low")]
    Low,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub manager_id: i32,
    pub client_id: i32,
    pub name: String,
    pub number: String,
    pub order_number: String,
    pub start: Date,
    pub deadline: Date,
    pub progress: i32,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub invoiced: InvoiceStatus,
    pub secretariat: bool,
    pub date_add: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ManagerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Manager,
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_delete = "Cascade"
    )]
    Client,
    #[sea_orm(has_many = "super::file_production::Entity")]
    Files,
    #[sea_orm(has_many = "super::document::Entity")]
    Documents,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::file_production::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
