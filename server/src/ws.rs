use crate::hub::{epoch_ms, ConnId, Hub};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use shared::{close, ClientMessage, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

pub async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<Hub>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Writer task: drains the connection's channel into the sink. A queued
    // close frame is the last thing it sends.
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sender.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    let conn: ConnId = uuid::Uuid::new_v4();
    hub.add_connection(conn, tx);

    // Unregistered connections only get until the deadline.
    let deadline = tokio::time::Instant::now() + hub.config.registration_timeout;
    loop {
        let next = if hub.registry.identity_of(conn).is_some() {
            receiver.next().await
        } else {
            match tokio::time::timeout_at(deadline, receiver.next()).await {
                Ok(next) => next,
                Err(_) => {
                    tracing::info!(conn = %conn, "closing connection that never registered");
                    hub.connections.close(conn, close::NORMAL, "Registration timeout");
                    break;
                }
            }
        };
        let Some(Ok(msg)) = next else { break };
        match msg {
            Message::Text(text) => {
                if !handle_message(&hub, conn, &text) {
                    break;
                }
            }
            Message::Close(_) => break,
            // Pings are answered by the protocol layer; pongs and binary
            // frames carry nothing for us.
            _ => {}
        }
    }

    hub.disconnect(conn);
}

/// Dispatches one inbound text frame. Returns false when the connection was
/// closed server-side and the read loop should end.
pub(crate) fn handle_message(hub: &Hub, conn: ConnId, text: &str) -> bool {
    let msg = match ClientMessage::parse(text) {
        Ok(msg) => msg,
        Err(err) => {
            tracing::debug!(conn = %conn, reason = %err.message(), "rejected inbound frame");
            hub.connections
                .send_one(conn, &ServerMessage::error(err.message()));
            return true;
        }
    };

    // Per-identity admission control; anonymous connections can only
    // register, which is not rate limited.
    if let Some(identity) = hub.registry.identity_of(conn) {
        if !hub.rate.allow(&identity, epoch_ms()) {
            hub.connections
                .send_one(conn, &ServerMessage::error("Rate limit exceeded"));
            return true;
        }
    }

    match msg {
        ClientMessage::Register { user_id, name } => {
            return hub.register(conn, &user_id, name.as_deref());
        }
        ClientMessage::LocationUpdate {
            user_id,
            lat,
            lng,
            name,
        } => {
            hub.handle_location_update(conn, &user_id, &lat, &lng, name.as_deref());
        }
        ClientMessage::StopSharing { user_id } => {
            hub.handle_stop_sharing(conn, user_id.as_deref());
        }
        ClientMessage::TrackUser { target_user_id } => {
            hub.handle_track_user(conn, &target_user_id);
        }
        ClientMessage::Ping => {
            hub.connections.send_one(conn, &ServerMessage::Pong);
        }
    }
    true
}
