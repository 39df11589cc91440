//! Error types surfaced by the production services.

use sea_orm::DbErr;
use thiserror::Error;

use crate::chain::ChainError;

/// Errors returned by [`crate::production::ProductionService`] operations.
#[derive(Debug, Error)]
pub enum ProductionError {
    /// The file already has a task for this department.
    #[error("task with this department exists (file {file_id}, department {department_id})")]
    DuplicateTask { file_id: i32, department_id: i32 },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i32 },

    /// A board or search filter received a status keyword it does not know.
    #[error("{message}: '{keyword}'")]
    StatusFilter { keyword: String, message: &'static str },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Wrong file format: {0}")]
    InvalidFileType(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProductionError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        ProductionError::NotFound { entity, id }
    }

    /// Whether the caller should see this as a not-found result.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProductionError::NotFound { .. } | ProductionError::StatusFilter { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProductionError>;
