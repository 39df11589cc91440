//! Per-connection state machine.
//!
//! `Connecting -> Subscribed -> Open -> Closed`. A connection that cannot be
//! authenticated goes straight to `Closed` and never joins a topic.

use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;

use crate::notify::{Event, Hub, Publisher, Subscription, TopicKind};

use super::auth::{Identity, IdentityResolver};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Subscribed,
    Open,
    Closed,
}

pub struct Session {
    kind: TopicKind,
    hub: Arc<Hub>,
    state: SessionState,
    identity: Option<Identity>,
    subscription: Option<Subscription>,
}

impl Session {
    pub fn new(kind: TopicKind, hub: Arc<Hub>) -> Self {
        Self {
            kind,
            hub,
            state: SessionState::Connecting,
            identity: None,
            subscription: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity
    }

    /// Resolve the handshake token and join the user's topic.
    ///
    /// Returns `false` when the connection must be refused.
    pub async fn authenticate(&mut self, resolver: &dyn IdentityResolver, token: Option<&str>) -> bool {
        if self.state != SessionState::Connecting {
            return self.state != SessionState::Closed;
        }

        let identity = match token {
            Some(token) => match resolver.resolve(token).await {
                Ok(identity) => identity,
                Err(e) => {
                    warn!("Token lookup failed on {}: {:#}", self.kind.path(), e);
                    None
                }
            },
            None => None,
        };

        match identity {
            Some(identity) => {
                let topic = self.kind.for_user(identity.user_id);
                self.subscription = Some(self.hub.subscribe(topic));
                self.identity = Some(identity);
                self.state = SessionState::Subscribed;
                debug!("User {} joined {}", identity.user_id, topic);
                true
            }
            None => {
                debug!("Refusing anonymous connection on {}", self.kind.path());
                self.state = SessionState::Closed;
                false
            }
        }
    }

    /// The websocket upgrade completed.
    pub fn open(&mut self) {
        if self.state == SessionState::Subscribed {
            self.state = SessionState::Open;
        }
    }

    /// Handle a client text frame. Returns whether it was relayed.
    ///
    /// Envelopes whose `type` is this endpoint's relay type have their `message` published
    /// to the connection's own topic. Anything else is ignored.
    pub fn handle_inbound(&mut self, text: &str) -> bool {
        if self.state != SessionState::Open {
            return false;
        }
        let Some(topic) = self.subscription.as_ref().map(|sub| sub.topic()) else {
            return false;
        };

        let envelope: Value = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(_) => {
                debug!("Ignoring non-JSON frame on {}", topic);
                return false;
            }
        };
        if envelope.get("type").and_then(Value::as_str) != Some(self.kind.relay_type()) {
            return false;
        }
        let Some(message) = envelope.get("message") else {
            return false;
        };

        self.hub.publish(&topic, Event::new(self.kind, message.clone()));
        true
    }

    /// Next outbound frame for the client. `None` when the session is over.
    pub async fn next_outbound(&mut self) -> Option<String> {
        let subscription = self.subscription.as_mut()?;
        subscription.recv().await.map(|event| event.to_frame())
    }

    /// Leave the topic.
    pub fn close(&mut self) {
        if let (Some(subscription), Some(identity)) = (self.subscription.take(), self.identity) {
            debug!("User {} left {}", identity.user_id, subscription.topic());
        }
        self.state = SessionState::Closed;
    }
}
