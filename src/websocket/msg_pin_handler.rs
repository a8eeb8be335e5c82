use tracing::{debug, warn};

use crate::models::{AddPinMessage, PinRefMessage};
use crate::websocket::reply_error;
use crate::ws::SyncEngine;

// Successful mutations need no direct reply: the requester is a room member
// and receives the broadcast event like everyone else.

/// Handle AddPinMessage
pub async fn handle_add_pin_message(add_msg: &AddPinMessage, connection_id: &str, engine: &SyncEngine) {
    let result = engine
        .conn_add_pin(
            connection_id,
            &add_msg.title,
            add_msg.description.as_deref(),
            add_msg.latitude,
            add_msg.longitude,
        )
        .await;
    match result {
        Ok(pin) => debug!("Connection {} added pin {}", connection_id, pin.id),
        Err(e) => {
            warn!("Add pin from {} failed: {}", connection_id, e);
            reply_error(engine, connection_id, &e);
        }
    }
}

/// Handle vote toggle
pub async fn handle_vote_message(vote_msg: &PinRefMessage, connection_id: &str, engine: &SyncEngine) {
    if let Err(e) = engine.conn_vote(connection_id, &vote_msg.pin_id).await {
        warn!("Vote from {} on pin {} failed: {}", connection_id, vote_msg.pin_id, e);
        reply_error(engine, connection_id, &e);
    }
}

/// Handle pin removal
pub async fn handle_remove_message(remove_msg: &PinRefMessage, connection_id: &str, engine: &SyncEngine) {
    if let Err(e) = engine.conn_remove_pin(connection_id, &remove_msg.pin_id).await {
        warn!("Remove from {} of pin {} failed: {}", connection_id, remove_msg.pin_id, e);
        reply_error(engine, connection_id, &e);
    }
}
