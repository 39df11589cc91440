//! Handshake authentication.

use anyhow::Result;
use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::constants::AUTH_COOKIE;
use crate::entities::user::Role;
use crate::repositories::TokenRepository;

/// The user behind a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub role: Role,
}

/// Maps an auth token to a user.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `None` for unknown tokens and inactive users.
    async fn resolve(&self, token: &str) -> Result<Option<Identity>>;
}

/// Resolves tokens against the `auth_tokens` table.
#[derive(Clone)]
pub struct TokenResolver {
    conn: DatabaseConnection,
}

impl TokenResolver {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl IdentityResolver for TokenResolver {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>> {
        Ok(TokenRepository::resolve(&self.conn, token).await?.map(|user| Identity {
            user_id: user.id,
            role: user.role,
        }))
    }
}

/// Extract the auth token from `Cookie` header values.
pub fn token_from_cookies<'a, I>(headers: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    headers
        .into_iter()
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == AUTH_COOKIE)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
