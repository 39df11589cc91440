use anyhow::{Context, Result};
use log::{debug, info};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::entities::{
    auth_token, client, comment_file, department, document, file_production, notification_project,
    notification_task, project, task, task_user, user, user_department,
};

/// Database handle shared by every service.
pub struct LocalStorage {
    pub conn: DatabaseConnection,
}

impl LocalStorage {
    /// Connect to the configured database and make sure the schema exists.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        // SQLite creates the file but not the directories leading to it
        if let Some(parent) = sqlite_file_path(&config.url).as_deref().and_then(Path::parent) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
        }

        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .with_context(|| format!("Failed to open database {}", config.url))?;

        let storage = LocalStorage { conn };
        storage.init_schema().await?;
        info!("Database ready at {}", config.url);
        Ok(storage)
    }

    /// Private in-memory database. A single pooled connection keeps it alive.
    pub async fn in_memory() -> Result<Self> {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(24 * 60 * 60))
            .max_lifetime(Duration::from_secs(24 * 60 * 60))
            .sqlx_logging(false);

        let conn = Database::connect(options).await?;
        let storage = LocalStorage { conn };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        // Referenced tables first.
        self.create_table(&schema, department::Entity).await?;
        self.create_table(&schema, user::Entity).await?;
        self.create_table(&schema, user_department::Entity).await?;
        self.create_table(&schema, auth_token::Entity).await?;
        self.create_table(&schema, client::Entity).await?;
        self.create_table(&schema, project::Entity).await?;
        self.create_table(&schema, file_production::Entity).await?;
        self.create_table(&schema, document::Entity).await?;
        self.create_table(&schema, task::Entity).await?;
        self.create_table(&schema, task_user::Entity).await?;
        self.create_table(&schema, comment_file::Entity).await?;
        self.create_table(&schema, notification_task::Entity).await?;
        self.create_table(&schema, notification_project::Entity).await?;

        Ok(())
    }

    async fn create_table<E>(&self, schema: &Schema, entity: E) -> Result<()>
    where
        E: EntityTrait,
    {
        let backend = self.conn.get_database_backend();
        let table = entity.table_name().to_string();
        let mut statement = schema.create_table_from_entity(entity);
        statement.if_not_exists();
        self.conn
            .execute(backend.build(&statement))
            .await
            .with_context(|| format!("Failed to create table {}", table))?;
        debug!("Ensured table {}", table);
        Ok(())
    }
}

/// Filesystem path behind a SQLite URL, or `None` for in-memory databases.
fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(PathBuf::from(path))
}
