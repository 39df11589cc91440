//! Prodflow - production tracking backend
//!
//! Projects are split into production files; every file travels through departments in
//! rank order as a chain of tasks, and connected clients are kept in sync over websockets.
//!
//! # Modules
//!
//! * [`chain`] - Task chain ordering, linking and permission rules
//! * [`progress`] - Project progress derived from finished tasks
//! * [`notify`] - Notification persistence and topic fan-out
//! * [`realtime`] - Websocket endpoints and connection sessions
//! * [`production`] - Transactional service entry points
//! * [`storage`] - Database, upload paths and per-project locks
//! * [`config`] - Application configuration management
//! * [`app`] - Process wiring of storage, service and realtime endpoints

/// Process wiring
pub mod app;

/// Task chain state machine
pub mod chain;

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// SeaORM entity models for database tables
pub mod entities;

/// Error types of the service layer
pub mod error;

/// Logging setup
pub mod logger;

/// Notification dispatch and the in-memory topic hub
pub mod notify;

/// Service operations over the production database
pub mod production;

/// Project progress aggregation
pub mod progress;

/// Realtime websocket channel
pub mod realtime;

/// Repository layer for database operations
pub mod repositories;

/// Database connection, upload paths and locking
pub mod storage;

/// Utility functions and helpers
pub mod utils;

pub use app::App;
pub use error::{ProductionError, Result};
pub use production::{Actor, ProductionService};
