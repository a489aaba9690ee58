//! `/ws` endpoint: server → client push session
//!
//! 协议:
//! - Server → Client: `{type, data}` text frames, periodic Ping
//! - Client → Server: nothing expected; text frames are ignored

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use std::time::Duration;

use super::PushHub;
use crate::core::ServerState;

/// GET /ws
pub async fn ws_handler(State(state): State<ServerState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let hub = state.push.clone();
    let ping_every = state.config.ws_ping_interval();
    ws.on_upgrade(move |socket| push_session(socket, hub, ping_every))
}

async fn push_session(socket: WebSocket, hub: PushHub, ping_every: Duration) {
    let (mut sink, mut stream) = socket.split();
    let mut conn = hub.register();
    let connection_id = conn.id;

    tracing::info!(connection_id, total = hub.connection_count(), "Push client connected");

    let mut ping_interval = tokio::time::interval(ping_every);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    tracing::debug!(connection_id, "Ping failed, dropping push client");
                    break;
                }
            }

            frame = conn.recv() => {
                match frame {
                    Some(frame) => {
                        if let Err(e) = sink.send(Message::Text(String::from(&*frame).into())).await {
                            tracing::debug!(connection_id, "Push send failed: {e}");
                            break;
                        }
                    }
                    // Hub dropped us (server shutting down)
                    None => {
                        let _ = sink
                            .send(Message::Close(Some(CloseFrame {
                                code: close_code::AWAY,
                                reason: "server shutting down".into(),
                            })))
                            .await;
                        break;
                    }
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.as_ref().map(|f| f.code);
                        let deliberate = code == Some(close_code::NORMAL);
                        tracing::debug!(connection_id, ?code, deliberate, "Push client sent close");
                        break;
                    }
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(connection_id, len = text.len(), "Ignoring inbound text frame");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(connection_id, "Push socket error: {e}");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    hub.unregister(connection_id);
    tracing::info!(connection_id, total = hub.connection_count(), "Push client disconnected");
}
