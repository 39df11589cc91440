//! User repository for database operations.

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    QueryTrait,
};

use crate::entities::{user, user_department};

/// Fields needed to create a user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: user::Role,
    pub first_name: String,
    pub last_name: String,
    pub departments: Vec<i32>,
}

/// Repository for user-related database operations.
pub struct UserRepository;

impl UserRepository {
    /// Get a single user by id.
    pub async fn get_by_id<C>(conn: &C, id: i32) -> Result<Option<user::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(user::Entity::find_by_id(id).one(conn).await?)
    }

    /// Every active user.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<user::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .order_by_asc(user::Column::Id)
            .all(conn)
            .await?)
    }

    /// Every active admin.
    pub async fn get_admins<C>(conn: &C) -> Result<Vec<user::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .filter(user::Column::Role.eq(user::Role::Admin))
            .order_by_asc(user::Column::Id)
            .all(conn)
            .await?)
    }

    /// Active employees that belong to a department.
    pub async fn get_employees_in_department<C>(conn: &C, department_id: i32) -> Result<Vec<user::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .filter(user::Column::Role.eq(user::Role::Employee))
            .filter(
                user::Column::Id.in_subquery(
                    user_department::Entity::find()
                        .filter(user_department::Column::DepartmentId.eq(department_id))
                        .select_only()
                        .column(user_department::Column::UserId)
                        .into_query(),
                ),
            )
            .order_by_asc(user::Column::Id)
            .all(conn)
            .await?)
    }

    /// Department ids a user belongs to.
    pub async fn get_department_ids<C>(conn: &C, user_id: i32) -> Result<Vec<i32>>
    where
        C: ConnectionTrait,
    {
        Ok(user_department::Entity::find()
            .filter(user_department::Column::UserId.eq(user_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|row| row.department_id)
            .collect())
    }

    /// Create a user together with its department memberships.
    pub async fn create<C>(conn: &C, new_user: NewUser) -> Result<user::Model>
    where
        C: ConnectionTrait,
    {
        if new_user.username.trim().is_empty() {
            anyhow::bail!("User must have username");
        }
        let model = user::ActiveModel {
            id: ActiveValue::NotSet,
            username: ActiveValue::Set(new_user.username),
            email: ActiveValue::Set(new_user.email),
            role: ActiveValue::Set(new_user.role),
            first_name: ActiveValue::Set(new_user.first_name),
            last_name: ActiveValue::Set(new_user.last_name),
            is_active: ActiveValue::Set(true),
        }
        .insert(conn)
        .await?;

        if !new_user.departments.is_empty() {
            let rows = new_user.departments.iter().map(|department_id| user_department::ActiveModel {
                user_id: ActiveValue::Set(model.id),
                department_id: ActiveValue::Set(*department_id),
            });
            user_department::Entity::insert_many(rows).exec(conn).await?;
        }

        Ok(model)
    }
}
