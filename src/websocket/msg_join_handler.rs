use tracing::{info, warn};

use crate::models::{JoinRoomMessage, LeaveRoomMessage, Reply};
use crate::websocket::reply_error;
use crate::ws::SyncEngine;

/// Handle JoinRoomMessage
pub async fn handle_join_message(join_msg: &JoinRoomMessage, connection_id: &str, engine: &SyncEngine) {
    info!("Join request from {} for room {} as {}", connection_id, join_msg.room_id, join_msg.display_name);

    let display_name = match join_msg.display_name.trim() {
        "" => "Anonymous",
        name => name,
    };
    let user_id = join_msg
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(display_name);

    if let Err(e) = engine.join(connection_id, &join_msg.room_id, display_name, user_id).await {
        warn!("Join of {} to room {} failed: {}", connection_id, join_msg.room_id, e);
        reply_error(engine, connection_id, &e);
    }
}

/// Handle LeaveRoomMessage
pub async fn handle_leave_message(leave_msg: &LeaveRoomMessage, connection_id: &str, engine: &SyncEngine) {
    match engine.leave(connection_id, &leave_msg.room_id).await {
        Ok(()) => engine.reply(
            connection_id,
            Reply::Left {
                room_id: leave_msg.room_id.clone(),
            },
        ),
        Err(e) => {
            warn!("Leave of {} from room {} failed: {}", connection_id, leave_msg.room_id, e);
            reply_error(engine, connection_id, &e);
        }
    }
}
