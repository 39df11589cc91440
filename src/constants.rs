//! Constants used throughout the application
//!
//! This module centralizes magic strings, response messages, and default values.

// Response Messages
pub const MESSAGE_UNKNOWN_FILE_STATUS: &str = "There is no such file status";
pub const MESSAGE_UNKNOWN_PROJECT_STATUS: &str = "There is no such project status";
pub const MESSAGE_NOT_YOUR_COMMENT: &str = "This is not your comment";

// Board event actions
pub const ACTION_CREATE: &str = "create";
pub const ACTION_UPDATE: &str = "update";
pub const ACTION_DELETE: &str = "delete";

// Realtime
/// Cookie carrying the auth token on websocket handshakes
pub const AUTH_COOKIE: &str = "auth";
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
pub const MAX_CHANNEL_CAPACITY: usize = 4096;

// Server
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";

// Uploads
pub const ALLOWED_FILE_EXTENSIONS: &[&str] = &[
    "pdf", "dxf", "xlsx", "xls", "txt", "png", "jpg", "jpeg", "rar", "zip", "doc", "docx", "igs", "step", "stp",
    "stl",
];

// Misc
pub const CONFIG_GENERATED: &str = "Generated default configuration file";
