//! Department repository for database operations.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::department;

/// Repository for department-related database operations.
pub struct DepartmentRepository;

impl DepartmentRepository {
    /// Get all departments ordered by rank.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<department::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(department::Entity::find()
            .order_by_asc(department::Column::Order)
            .all(conn)
            .await?)
    }

    /// Get a single department by id.
    pub async fn get_by_id<C>(conn: &C, id: i32) -> Result<Option<department::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(department::Entity::find_by_id(id).one(conn).await?)
    }

    /// Get a department by its unique name.
    pub async fn get_by_name<C>(conn: &C, name: &str) -> Result<Option<department::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(department::Entity::find()
            .filter(department::Column::Name.eq(name))
            .one(conn)
            .await?)
    }

    /// Create a department. `order` must be unique and at least 1.
    pub async fn create<C>(conn: &C, name: &str, order: i32) -> Result<department::Model>
    where
        C: ConnectionTrait,
    {
        if order < 1 {
            anyhow::bail!("Department order must be at least 1, got {}", order);
        }
        let model = department::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name.to_string()),
            order: ActiveValue::Set(order),
            date_add: ActiveValue::Set(Utc::now().date_naive()),
        };
        Ok(model.insert(conn).await?)
    }
}
