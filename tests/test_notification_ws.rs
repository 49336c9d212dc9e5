mod helpers;

use axum::http::Method;
use futures::{SinkExt, StreamExt};
use helpers::*;
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr, token: Option<&str>) -> Client {
    let url = match token {
        Some(token) => format!("ws://{}/api-v1/notifications/ws?token={}", addr, token),
        None => format!("ws://{}/api-v1/notifications/ws", addr),
    };
    let (client, _) = connect_async(url).await.expect("WebSocket handshake failed");
    client
}

async fn next_message(client: &mut Client) -> Message {
    tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("timed out waiting for a message")
        .expect("stream ended")
        .expect("WebSocket error")
}

async fn next_event(client: &mut Client) -> Value {
    match next_message(client).await {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {:?}", other),
    }
}

async fn expect_policy_close(client: &mut Client) {
    match next_message(client).await {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 1008),
        other => panic!("expected a policy close frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_token_is_closed_with_policy_violation() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;

    let mut client = connect(addr, Some("not-a-token")).await;
    expect_policy_close(&mut client).await;
    assert_eq!(app.state.hub.registry().connection_count().await, 0);

    app.teardown().await;
}

#[tokio::test]
async fn test_missing_token_is_closed_with_policy_violation() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;

    let mut client = connect(addr, None).await;
    expect_policy_close(&mut client).await;
    assert_eq!(app.state.hub.registry().user_count().await, 0);

    app.teardown().await;
}

#[tokio::test]
async fn test_unparsable_query_is_closed_with_policy_violation() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let user = app.create_user("alice").await;
    let token = app.token_for(&user);

    let url = format!(
        "ws://{}/api-v1/notifications/ws?token={}&token={}",
        addr, token, token
    );
    let (mut client, _) = connect_async(url).await.expect("WebSocket handshake failed");
    expect_policy_close(&mut client).await;
    assert_eq!(app.state.hub.registry().connection_count().await, 0);

    app.teardown().await;
}

#[tokio::test]
async fn test_token_for_unknown_user_is_rejected() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let token = app.token_for(&Uuid::new_v4());

    let mut client = connect(addr, Some(&token)).await;
    expect_policy_close(&mut client).await;
    assert_eq!(app.state.hub.registry().connection_count().await, 0);

    app.teardown().await;
}

#[tokio::test]
async fn test_notification_reaches_every_tab_until_one_closes() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let user = app.create_user("alice").await;
    let token = app.token_for(&user);

    let mut tab1 = connect(addr, Some(&token)).await;
    let mut tab2 = connect(addr, Some(&token)).await;
    app.wait_for_connections(&user, 2).await;

    let created = app.notify(user, "You were assigned a task").await;

    for tab in [&mut tab1, &mut tab2] {
        let event = next_event(tab).await;
        assert_eq!(event["id"], created.id.to_string());
        assert_eq!(event["user_id"], user.to_string());
        assert_eq!(event["type"], "task_assigned");
        assert_eq!(event["message"], "You were assigned a task");
        assert_eq!(event["is_read"], false);
    }

    tab1.close(None).await.unwrap();
    app.wait_for_connections(&user, 1).await;

    let second = app.notify(user, "Second").await;
    let event = next_event(&mut tab2).await;
    assert_eq!(event["id"], second.id.to_string());

    app.teardown().await;
}

#[tokio::test]
async fn test_pushed_event_matches_listed_record() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let user = app.create_user("alice").await;
    let token = app.token_for(&user);

    let mut tab = connect(addr, Some(&token)).await;
    app.wait_for_connections(&user, 1).await;

    app.notify(user, "same everywhere").await;
    let pushed = next_event(&mut tab).await;

    let (_, listed) = app
        .request(Method::GET, "/api-v1/notifications", Some(&token))
        .await;
    assert_eq!(listed[0], pushed);
    assert_eq!(listed[0]["created_at"], pushed["created_at"]);

    app.teardown().await;
}

#[tokio::test]
async fn test_other_users_do_not_receive_pushes() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let mut alice_tab = connect(addr, Some(&app.token_for(&alice))).await;
    let mut bob_tab = connect(addr, Some(&app.token_for(&bob))).await;
    app.wait_for_connections(&alice, 1).await;
    app.wait_for_connections(&bob, 1).await;

    app.notify(alice, "only alice").await;
    let event = next_event(&mut alice_tab).await;
    assert_eq!(event["message"], "only alice");

    let nothing = tokio::time::timeout(Duration::from_millis(200), bob_tab.next()).await;
    assert!(nothing.is_err(), "bob received a push meant for alice");

    app.teardown().await;
}

#[tokio::test]
async fn test_inbound_messages_are_ignored() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let user = app.create_user("alice").await;

    let mut tab = connect(addr, Some(&app.token_for(&user))).await;
    app.wait_for_connections(&user, 1).await;

    tab.send(Message::Text("ping".to_string())).await.unwrap();
    app.notify(user, "still here").await;

    let event = next_event(&mut tab).await;
    assert_eq!(event["message"], "still here");
    assert_eq!(app.state.hub.registry().connection_count().await, 1);

    app.teardown().await;
}

#[tokio::test]
async fn test_hub_shutdown_closes_sockets() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let user = app.create_user("alice").await;

    let mut tab = connect(addr, Some(&app.token_for(&user))).await;
    app.wait_for_connections(&user, 1).await;

    app.state.hub.shutdown().await;

    match next_message(&mut tab).await {
        Message::Close(_) => {}
        other => panic!("expected a close frame, got {:?}", other),
    }
    assert!(!app.state.hub.registry().is_connected(&user).await);

    app.teardown().await;
}
