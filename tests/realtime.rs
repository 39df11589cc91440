mod support;

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use prodflow::config::Config;
use prodflow::entities::user::Role;
use prodflow::notify::{Event, Hub, Publisher, TopicKind};
use prodflow::realtime::{self, IdentityResolver, RealtimeState, TokenResolver};
use prodflow::repositories::{ProjectRepository, TokenRepository, UserRepository};
use prodflow::storage::LocalStorage;
use prodflow::{Actor, App};
use support::{new_project, new_user};

struct Server {
    addr: SocketAddr,
    hub: Arc<Hub>,
    token: String,
    user_id: i32,
}

async fn start_server() -> Server {
    let storage = LocalStorage::in_memory().await.unwrap();
    let user = UserRepository::create(&storage.conn, new_user("viewer", Role::Employee, vec![]))
        .await
        .unwrap();
    let token = TokenRepository::issue(&storage.conn, user.id).await.unwrap();

    let hub = Arc::new(Hub::new(16));
    let state = RealtimeState {
        hub: hub.clone(),
        resolver: Arc::new(TokenResolver::new(storage.conn.clone())),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, realtime::router(state)).await.unwrap();
    });

    Server {
        addr,
        hub,
        token,
        user_id: user.id,
    }
}

/// Send a websocket upgrade request and return the response head.
async fn handshake(addr: SocketAddr, path: &str, cookie: Option<&str>) -> (TcpStream, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: Upgrade\r\nUpgrade: websocket\r\n\
         Sec-WebSocket-Version: 13\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n",
        path, addr
    );
    if let Some(cookie) = cookie {
        request.push_str(&format!("Cookie: {}\r\n", cookie));
    }
    request.push_str("\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).await.unwrap();
        head.push(byte[0]);
    }
    (stream, String::from_utf8(head).unwrap())
}

/// Read one unmasked server text frame.
async fn read_text_frame(stream: &mut TcpStream) -> String {
    let mut header = [0u8; 2];
    stream.read_exact(&mut header).await.unwrap();
    assert_eq!(header[0], 0x81, "expected a final text frame");

    let len = match header[1] & 0x7f {
        126 => {
            let mut ext = [0u8; 2];
            stream.read_exact(&mut ext).await.unwrap();
            u16::from_be_bytes(ext) as usize
        }
        127 => {
            let mut ext = [0u8; 8];
            stream.read_exact(&mut ext).await.unwrap();
            u64::from_be_bytes(ext) as usize
        }
        n => n as usize,
    };
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await.unwrap();
    String::from_utf8(payload).unwrap()
}

#[tokio::test]
async fn test_handshake_without_cookie_is_refused() {
    let server = start_server().await;

    for kind in TopicKind::ALL {
        let (_, head) = handshake(server.addr, kind.path(), None).await;
        assert!(head.starts_with("HTTP/1.1 403"), "{}: {}", kind.path(), head);
    }
}

#[tokio::test]
async fn test_handshake_with_unknown_token_is_refused() {
    let server = start_server().await;
    let (_, head) = handshake(server.addr, "/ws/task/", Some("auth=not-a-token")).await;
    assert!(head.starts_with("HTTP/1.1 403"));
    assert_eq!(
        server
            .hub
            .subscriber_count(&TopicKind::TaskNotifications.for_user(server.user_id)),
        0
    );
}

#[tokio::test]
async fn test_authenticated_connection_receives_its_topic() {
    let server = start_server().await;
    let cookie = format!("csrftoken=abc; auth={}", server.token);

    let (mut stream, head) = handshake(server.addr, "/ws/task/", Some(&cookie)).await;
    assert!(head.starts_with("HTTP/1.1 101"), "{}", head);

    let topic = TopicKind::TaskNotifications.for_user(server.user_id);
    assert_eq!(server.hub.subscriber_count(&topic), 1);

    // Another user's topic and another kind stay silent
    server.hub.publish(
        &TopicKind::TaskNotifications.for_user(server.user_id + 1),
        Event::new(TopicKind::TaskNotifications, json!("not yours")),
    );
    server.hub.publish(
        &topic,
        Event::new(TopicKind::TaskNotifications, json!({"notification": {"id": 3}})),
    );

    let frame: Value = serde_json::from_str(&read_text_frame(&mut stream).await).unwrap();
    assert_eq!(frame, json!({"message": {"notification": {"id": 3}}}));
}

#[tokio::test]
async fn test_token_resolver_skips_inactive_users() {
    let storage = LocalStorage::in_memory().await.unwrap();
    let user = UserRepository::create(&storage.conn, new_user("retired", Role::Admin, vec![]))
        .await
        .unwrap();
    let token = TokenRepository::issue(&storage.conn, user.id).await.unwrap();
    let resolver = TokenResolver::new(storage.conn.clone());

    let identity = resolver.resolve(&token).await.unwrap().unwrap();
    assert_eq!(identity.user_id, user.id);
    assert_eq!(identity.role, Role::Admin);
    assert!(resolver.resolve("missing").await.unwrap().is_none());

    let mut active: prodflow::entities::user::ActiveModel = user.into();
    active.is_active = sea_orm::ActiveValue::Set(false);
    sea_orm::ActiveModelTrait::update(active, &storage.conn).await.unwrap();

    assert!(resolver.resolve(&token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_app_relays_service_notifications_to_websockets() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.database.url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("data").join("prodflow.db").display()
    );
    config.storage.media_root = dir.path().join("media");

    let app = App::open(&config).await.unwrap();
    assert!(config.storage.media_root.is_dir());

    let conn = &app.service.storage().conn;
    let admin = UserRepository::create(conn, new_user("boss", Role::Admin, vec![]))
        .await
        .unwrap();
    let client = ProjectRepository::create_client(conn, "Acme", "a@acme.test", "x")
        .await
        .unwrap();
    let token = TokenRepository::issue(conn, admin.id).await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let cookie = format!("auth={}", token);
    let (mut stream, head) = handshake(addr, "/ws/project/", Some(&cookie)).await;
    assert!(head.starts_with("HTTP/1.1 101"), "{}", head);
    let topic = TopicKind::ProjectNotifications.for_user(admin.id);
    assert_eq!(app.realtime.hub.subscriber_count(&topic), 1);

    let project = app
        .service
        .create_project(Actor::from(&admin), new_project(admin.id, client.id, "P-500"))
        .await
        .unwrap();

    let frame: Value = serde_json::from_str(&read_text_frame(&mut stream).await).unwrap();
    assert_eq!(frame["message"]["project"]["id"], project.id);
    assert_eq!(
        frame["message"]["notification"]["content"],
        "Project (P-500) has been added"
    );
}
