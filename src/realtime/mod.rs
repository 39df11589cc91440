//! Realtime websocket channel: handshake authentication, per-connection sessions and the
//! axum router exposing one endpoint per topic kind.

pub mod auth;
pub mod server;
pub mod session;

pub use auth::{token_from_cookies, Identity, IdentityResolver, TokenResolver};
pub use server::{router, RealtimeState};
pub use session::{Session, SessionState};
