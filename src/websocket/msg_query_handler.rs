use tracing::{debug, warn};

use crate::models::Reply;
use crate::websocket::reply_error;
use crate::ws::SyncEngine;

/// Handle optimal location query. Answered to the requester only.
pub async fn handle_optimal_location_message(connection_id: &str, engine: &SyncEngine) {
    match engine.conn_optimal_location(connection_id).await {
        Ok((room_id, result)) => {
            debug!("Optimal location for {} in room {}", connection_id, room_id);
            engine.reply(connection_id, Reply::OptimalLocation { room_id, result });
        }
        Err(e) => {
            warn!("Optimal location query from {} failed: {}", connection_id, e);
            reply_error(engine, connection_id, &e);
        }
    }
}
