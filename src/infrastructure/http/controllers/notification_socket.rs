use crate::{
    domain::entities::NotificationEvent,
    infrastructure::http::middleware::AppState,
    infrastructure::realtime::{Connection, NotificationHub},
};
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

/// Browsers cannot set headers on a WebSocket handshake, so the token rides
/// in the query string.
#[derive(Debug, Deserialize)]
pub struct NotificationSocketQuery {
    pub token: Option<String>,
}

/// GET /notifications/ws?token=...
///
/// The upgrade always completes; a token that fails verification, or a query
/// string that does not parse, is answered with a policy-violation close frame
/// and the socket is never registered.
pub async fn notification_socket(
    State(state): State<AppState>,
    query: Option<Query<NotificationSocketQuery>>,
    ws: WebSocketUpgrade,
) -> Response {
    let token = query.and_then(|Query(query)| query.token);
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub, token))
}

async fn handle_socket(mut socket: WebSocket, hub: NotificationHub, token: Option<String>) {
    let (connection, outbound) = match hub.admit(token.as_deref()).await {
        Ok(admitted) => admitted,
        Err(_) => {
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "".into(),
                })))
                .await;
            return;
        }
    };

    run_connection(socket, &connection, outbound).await;
    hub.remove(&connection).await;

    let remaining = hub
        .registry()
        .connections_for(&connection.user_id())
        .await
        .len();
    tracing::debug!(
        user_id = %connection.user_id(),
        connection_id = %connection.id(),
        remaining,
        "WebSocket loop ended"
    );
}

/// Pump queued events out and read (and discard) inbound frames until the
/// client leaves, the transport errors, or the hub closes the connection.
async fn run_connection(
    socket: WebSocket,
    connection: &Connection,
    mut outbound: mpsc::Receiver<NotificationEvent>,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            _ = connection.closed() => {
                let _ = sink
                    .send(Message::Close(Some(CloseFrame {
                        code: close_code::AWAY,
                        reason: "".into(),
                    })))
                    .await;
                break;
            }
            event = outbound.recv() => {
                let Some(event) = event else { break };
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!("Failed to serialize notification event: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(payload)).await {
                    tracing::debug!(
                        connection_id = %connection.id(),
                        error = %e,
                        "WebSocket send failed"
                    );
                    break;
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                // Reserved for heartbeats; content is ignored
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(
                        connection_id = %connection.id(),
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            },
        }
    }
}
