use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::time::{timeout, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{ReceivedMessage, Reply};
use crate::websocket::msg_join_handler::{handle_join_message, handle_leave_message};
use crate::websocket::msg_pin_handler::{handle_add_pin_message, handle_remove_message, handle_vote_message};
use crate::websocket::msg_ping_handler::handle_ping_message;
use crate::websocket::msg_query_handler::handle_optimal_location_message;
use crate::ws::SyncEngine;
use crate::AppState;

/// WebSocket handler
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one connection: inbound requests, the outbound event queue and the
/// heartbeat all run on this task, so a request is never cut off halfway.
/// Every write is bounded by the heartbeat timeout, so a peer that stops
/// reading is dropped like one that stops answering.
async fn handle_socket(socket: WebSocket, state: AppState) {
    // Generate unique connection ID to identify this client
    let connection_id = Uuid::new_v4().to_string();
    let engine = state.engine.clone();
    let mut outbox = engine.connect(&connection_id);
    info!("WebSocket connection established with connection_id: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();

    let heartbeat_timeout = state.config.heartbeat_timeout();
    let mut heartbeat = tokio::time::interval(state.config.heartbeat_interval());
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    heartbeat.tick().await;
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        last_seen = Instant::now();
                        dispatch(&text, &connection_id, &engine).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Connection {} closed by peer", connection_id);
                        break;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        last_seen = Instant::now();
                        engine.reply(&connection_id, Reply::Error {
                            kind: "validation_error".to_string(),
                            message: "Binary frames are not supported".to_string(),
                        });
                    }
                    // pings are answered by axum, pongs only prove liveness
                    Some(Ok(_)) => last_seen = Instant::now(),
                    Some(Err(e)) => {
                        warn!("WebSocket error on {}: {}", connection_id, e);
                        break;
                    }
                }
            }
            outgoing = outbox.recv() => {
                let Some(msg) = outgoing else { break };
                let text = match serde_json::to_string(&msg) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Failed to serialize message for {}: {}", connection_id, e);
                        continue;
                    }
                };
                match timeout(heartbeat_timeout, sender.send(Message::Text(text))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        debug!("Failed to write to {}: {}", connection_id, e);
                        break;
                    }
                    Err(_) => {
                        warn!("Connection {} stopped reading for {:?}, dropping", connection_id, heartbeat_timeout);
                        break;
                    }
                }
            }
            _ = heartbeat.tick() => {
                if last_seen.elapsed() > heartbeat_timeout {
                    warn!("Connection {} missed its heartbeat for {:?}, dropping", connection_id, last_seen.elapsed());
                    break;
                }
                if !matches!(timeout(heartbeat_timeout, sender.send(Message::Ping(Vec::new()))).await, Ok(Ok(()))) {
                    warn!("Connection {} could not be pinged, dropping", connection_id);
                    break;
                }
            }
        }
    }

    engine.disconnect(&connection_id).await;
    // a peer that stopped reading may never take the close frame
    let _ = timeout(state.config.heartbeat_interval(), sender.close()).await;
    info!("WebSocket connection {} terminated", connection_id);
}

async fn dispatch(text: &str, connection_id: &str, engine: &SyncEngine) {
    // Parse the incoming message as JSON
    let msg: ReceivedMessage = match serde_json::from_str(text) {
        Ok(msg) => {
            debug!("Received message from {}: {:?}", connection_id, msg);
            msg
        }
        Err(e) => {
            warn!("Failed to parse message from {}: {}", connection_id, e);
            engine.reply(
                connection_id,
                Reply::Error {
                    kind: "validation_error".to_string(),
                    message: format!("Malformed message: {}", e),
                },
            );
            return;
        }
    };

    match msg {
        ReceivedMessage::JoinRoom(join_msg) => handle_join_message(&join_msg, connection_id, engine).await,
        ReceivedMessage::LeaveRoom(leave_msg) => handle_leave_message(&leave_msg, connection_id, engine).await,
        ReceivedMessage::AddPin(add_msg) => handle_add_pin_message(&add_msg, connection_id, engine).await,
        ReceivedMessage::VotePin(vote_msg) => handle_vote_message(&vote_msg, connection_id, engine).await,
        ReceivedMessage::RemovePin(remove_msg) => handle_remove_message(&remove_msg, connection_id, engine).await,
        ReceivedMessage::OptimalLocation => handle_optimal_location_message(connection_id, engine).await,
        ReceivedMessage::Ping => handle_ping_message(connection_id, engine),
    }
}
