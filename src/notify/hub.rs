//! In-memory topic broker.
//!
//! Each topic with at least one live subscriber owns a `tokio::sync::broadcast` channel.
//! Publishing never blocks: events for topics nobody listens to are dropped, and a
//! subscriber that falls more than the channel capacity behind skips what it missed.

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast::{self, error::RecvError};

use super::{Event, Publisher, Topic};

type Channels = HashMap<Topic, broadcast::Sender<Arc<Event>>>;

pub struct Hub {
    capacity: usize,
    channels: RwLock<Channels>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Join a topic. Dropping the returned subscription leaves it.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let mut channels = self.write();
        let sender = channels
            .entry(topic)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        debug!("Subscribed to {} ({} receivers)", topic, sender.receiver_count() + 1);
        Subscription {
            topic,
            receiver: sender.subscribe(),
        }
    }

    /// Live subscribers of a topic.
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.read().get(topic).map(|sender| sender.receiver_count()).unwrap_or(0)
    }

    fn read(&self) -> RwLockReadGuard<'_, Channels> {
        self.channels.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Channels> {
        self.channels.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn prune(&self, topic: &Topic) {
        let mut channels = self.write();
        if channels.get(topic).is_some_and(|sender| sender.receiver_count() == 0) {
            channels.remove(topic);
            debug!("Released topic {}", topic);
        }
    }
}

impl Publisher for Hub {
    fn publish(&self, topic: &Topic, event: Event) {
        let delivered = match self.read().get(topic) {
            Some(sender) => sender.send(Arc::new(event)).is_ok(),
            None => return,
        };
        if !delivered {
            self.prune(topic);
        }
    }
}

/// Membership of one topic.
pub struct Subscription {
    topic: Topic,
    receiver: broadcast::Receiver<Arc<Event>>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Next event in publish order. `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Subscriber of {} lagged, skipped {} events", self.topic, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
