pub mod handler;
pub mod msg_join_handler;
pub mod msg_pin_handler;
pub mod msg_ping_handler;
pub mod msg_query_handler;

use crate::models::{Reply, SyncError};
use crate::ws::SyncEngine;

/// Report a failed request to the connection that sent it.
pub(crate) fn reply_error(engine: &SyncEngine, connection_id: &str, e: &SyncError) {
    engine.reply(
        connection_id,
        Reply::Error {
            kind: e.kind().to_string(),
            message: e.to_string(),
        },
    );
}
