//! WebSocket session lifecycle.
//!
//! Each accepted socket gets a fresh connection id and a dedicated writer
//! task; inbound intents are dispatched to the room service, and the
//! socket closing triggers disconnect fallout (grace-period scheduling).

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    services::room_service,
    state::SharedState,
};

/// Handle the full lifecycle for an individual game WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let connection_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    state.connections().register(connection_id, outbound_tx.clone());
    info!(connection = %connection_id, "client connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(connection = %connection_id, payload = %text, "received client message");

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Unknown) => {
                        warn!(connection = %connection_id, "ignoring unknown message type");
                        send_message(
                            &outbound_tx,
                            &ServerMessage::Error {
                                message: "unknown message type".into(),
                            },
                        );
                    }
                    Ok(intent) => {
                        if let Err(err) =
                            room_service::dispatch(&state, connection_id, intent).await
                        {
                            debug!(connection = %connection_id, error = %err, "intent rejected");
                            send_message(
                                &outbound_tx,
                                &ServerMessage::Error {
                                    message: err.to_string(),
                                },
                            );
                        }
                    }
                    Err(err) => {
                        warn!(connection = %connection_id, error = %err, "failed to parse client message");
                        send_message(
                            &outbound_tx,
                            &ServerMessage::Error {
                                message: "malformed message".into(),
                            },
                        );
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(connection = %connection_id, "client closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(connection = %connection_id, error = %err, "websocket error");
                break;
            }
        }
    }

    if let Some(binding) = state.connections().unregister(connection_id) {
        room_service::handle_disconnect(&state, binding).await;
    }
    info!(connection = %connection_id, "client disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Serialize a payload and push it onto the provided writer channel.
///
/// Serialization failures are permanent (a bug in this code), so they are
/// logged and dropped rather than retried; a closed writer just means the
/// socket is already going away.
pub fn send_message(tx: &mpsc::UnboundedSender<Message>, message: &ServerMessage) {
    let payload = match serde_json::to_string(message) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize outbound message");
            return;
        }
    };
    let _ = tx.send(Message::Text(payload.into()));
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
