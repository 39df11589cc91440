//! Persistence and file-system plumbing.
//!
//! - [`LocalStorage`]: SeaORM connection and schema bootstrap
//! - [`UploadPaths`]: upload directory layout and the extension allow-list
//! - [`ProjectLocks`]: per-project serialization of chain mutations

pub mod db;
pub mod locks;
pub mod uploads;

pub use db::LocalStorage;
pub use locks::ProjectLocks;
pub use uploads::{is_allowed_file, UploadPaths};
