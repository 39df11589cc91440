//! Websocket endpoints.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header::COOKIE, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::debug;
use std::sync::Arc;

use crate::notify::{Hub, TopicKind};

use super::auth::{token_from_cookies, IdentityResolver};
use super::session::Session;

/// Shared state of the realtime endpoints.
#[derive(Clone)]
pub struct RealtimeState {
    pub hub: Arc<Hub>,
    pub resolver: Arc<dyn IdentityResolver>,
}

/// One route per topic kind, see [`TopicKind::path`].
pub fn router(state: RealtimeState) -> Router {
    let mut router: Router<RealtimeState> = Router::new();
    for kind in TopicKind::ALL {
        router = router.route(
            kind.path(),
            get(
                move |ws: WebSocketUpgrade, headers: HeaderMap, State(state): State<RealtimeState>| async move {
                    handshake(kind, ws, headers, state).await
                },
            ),
        );
    }
    router.with_state(state)
}

async fn handshake(kind: TopicKind, ws: WebSocketUpgrade, headers: HeaderMap, state: RealtimeState) -> Response {
    let token = token_from_cookies(headers.get_all(COOKIE).iter().filter_map(|value| value.to_str().ok()));

    let mut session = Session::new(kind, state.hub.clone());
    if !session.authenticate(state.resolver.as_ref(), token.as_deref()).await {
        return StatusCode::FORBIDDEN.into_response();
    }

    ws.on_upgrade(move |socket| serve(socket, session))
}

async fn serve(mut socket: WebSocket, mut session: Session) {
    session.open();

    loop {
        tokio::select! {
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    session.handle_inbound(&text);
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            outbound = session.next_outbound() => match outbound {
                Some(frame) => {
                    if socket.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    if let Some(identity) = session.identity() {
        debug!("Connection of user {} closed", identity.user_id);
    }
    session.close();
}
