//! SeaORM entity models for the production database.

pub mod auth_token;
pub mod client;
pub mod comment_file;
pub mod department;
pub mod document;
pub mod file_production;
pub mod notification_project;
pub mod notification_task;
pub mod project;
pub mod task;
pub mod task_user;
pub mod user;
pub mod user_department;

pub use auth_token::Entity as AuthToken;
pub use client::Entity as Client;
pub use comment_file::Entity as CommentFile;
pub use department::Entity as Department;
pub use document::Entity as Document;
pub use file_production::Entity as FileProduction;
pub use notification_project::Entity as NotificationProject;
pub use notification_task::Entity as NotificationTask;
pub use project::Entity as Project;
pub use task::Entity as Task;
pub use task_user::Entity as TaskUser;
pub use user::Entity as User;
pub use user_department::Entity as UserDepartment;
