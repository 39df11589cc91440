//! Notification fan-out.
//!
//! Everything that reaches a connected client goes through [`Publisher::publish`]. The
//! chain and progress code never touch it; [`NotificationDispatcher`] decides the audience
//! and persists what must survive a disconnect, [`Hub`] does the in-memory delivery.

mod dispatcher;
mod event;
mod hub;
mod topic;

pub use dispatcher::{Notice, NotificationDispatcher, UnreadCount};
pub use event::{BoardEvent, Event, ProjectBoardData, ProjectProgress, ProjectRef};
pub use hub::{Hub, Subscription};
pub use topic::{Topic, TopicKind};

/// Fire-and-forget delivery of an event to a topic's current subscribers.
pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &Topic, event: Event);
}
