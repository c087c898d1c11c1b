//! WebSocket handler for dashboard clients
//!
//! Each connection becomes one subscriber. The broadcast task writes into the
//! connection's mpsc queue; a writer task drains it onto the socket while this
//! handler reads inbound client messages. When the broadcaster drops the
//! subscriber, the channel is closed and the socket is closed with it, so the
//! client knows to reconnect.

use super::server::AppState;
use crate::channel::{ClientChannel, MpscChannel};
use crate::engine::Engine;
use crate::events::{ClientMessage, DashboardMessage};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Time given to the writer to flush the close frame
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// WebSocket upgrade handler.
///
/// GET /ws
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state.engine, state.client_buffer))
}

/// Handle a WebSocket connection.
async fn handle_ws_connection(socket: WebSocket, engine: Arc<Engine>, buffer: usize) {
    let (mut sender, mut receiver) = socket.split();
    let (channel, mut outbound) = MpscChannel::pair(buffer);
    let channel_id = channel.id();

    // Spawn task to send queued messages to the client
    let writer_channel = channel.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                _ = writer_channel.closed() => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
                next = outbound.recv() => match next {
                    Some(message) => message,
                    None => break,
                },
            };

            let json = match serde_json::to_string(&*message) {
                Ok(j) => j,
                Err(e) => {
                    warn!(channel_id = %channel_id, "Failed to serialize message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Greet with the current state so the client does not wait a full cycle
    if reply(&channel, DashboardMessage::connected(channel_id)).await
        && reply(&channel, engine.dashboard_update().await).await
    {
        engine.add_subscriber(channel.clone()).await;

        loop {
            let msg_result = tokio::select! {
                _ = channel.closed() => {
                    info!(channel_id = %channel_id, "Closing connection dropped by broadcaster");
                    break;
                }
                next = receiver.next() => match next {
                    Some(msg_result) => msg_result,
                    None => break,
                },
            };

            match msg_result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Ping) => {
                        if !reply(&channel, DashboardMessage::pong()).await {
                            break;
                        }
                    }
                    Ok(ClientMessage::Snapshot) => {
                        if !reply(&channel, engine.dashboard_update().await).await {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(channel_id = %channel_id, "Ignoring unrecognized client message: {}", e);
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(channel_id = %channel_id, "WebSocket receive error: {}", e);
                    break;
                }
            }
        }
    }

    engine.remove_subscriber(channel_id).await;
    channel.close();
    if tokio::time::timeout(CLOSE_GRACE, &mut send_task).await.is_err() {
        send_task.abort();
    }
}

/// Queue a direct reply; false once the channel is closed
async fn reply(channel: &MpscChannel, message: DashboardMessage) -> bool {
    channel.send(Arc::new(message)).await.is_ok()
}
