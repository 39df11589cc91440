//! Repository layer for database operations.
//!
//! Each repository is a unit struct whose associated functions are generic over
//! [`sea_orm::ConnectionTrait`], so the same query runs on the pooled connection or
//! inside a chain-mutation transaction.

pub mod comment;
pub mod department;
pub mod file;
pub mod notification;
pub mod project;
pub mod task;
pub mod token;
pub mod user;

pub use comment::CommentRepository;
pub use department::DepartmentRepository;
pub use file::FileRepository;
pub use notification::NotificationRepository;
pub use project::ProjectRepository;
pub use task::TaskRepository;
pub use token::TokenRepository;
pub use user::UserRepository;
