//! Auth token repository backing the realtime `auth` cookie.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::entities::{auth_token, user};

/// Repository for auth token operations.
pub struct TokenRepository;

impl TokenRepository {
    /// Issue a fresh token for a user.
    pub async fn issue<C>(conn: &C, user_id: i32) -> Result<String>
    where
        C: ConnectionTrait,
    {
        let key = Uuid::new_v4().simple().to_string();
        auth_token::ActiveModel {
            key: ActiveValue::Set(key.clone()),
            user_id: ActiveValue::Set(user_id),
            created: ActiveValue::Set(Utc::now()),
        }
        .insert(conn)
        .await?;
        Ok(key)
    }

    /// Resolve the active user owning a token.
    pub async fn resolve<C>(conn: &C, key: &str) -> Result<Option<user::Model>>
    where
        C: ConnectionTrait,
    {
        let found = auth_token::Entity::find_by_id(key.to_string())
            .find_also_related(user::Entity)
            .one(conn)
            .await?;
        Ok(found.and_then(|(_, user)| user).filter(|user| user.is_active))
    }
}
