use chrono::Utc;
use tracing::debug;

use crate::models::Reply;
use crate::ws::SyncEngine;

/// Handle PingMessage
pub fn handle_ping_message(connection_id: &str, engine: &SyncEngine) {
    debug!("Ping message received from {}", connection_id);
    engine.reply(
        connection_id,
        Reply::Pong {
            date: Utc::now().to_rfc3339(),
        },
    );
}
