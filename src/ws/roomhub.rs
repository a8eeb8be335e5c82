use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::models::Room;
use crate::store::membership::Membership;
use crate::store::pin_table::PinTable;

/// Everything that must change atomically for one room.
#[derive(Debug)]
pub struct RoomState {
    /// Pins were loaded from persistence
    pub loaded: bool,
    /// Set by the idle sweep once the hub left the registry. A retired state
    /// is never mutated again.
    pub retired: bool,
    pub last_active: Instant,
    pub pins: PinTable,
    pub members: Membership,
}

impl RoomState {
    fn new() -> Self {
        Self {
            loaded: false,
            retired: false,
            last_active: Instant::now(),
            pins: PinTable::new(),
            members: Membership::new(),
        }
    }
}

/// Live state of one room. Rooms never share a lock.
#[derive(Debug)]
pub struct RoomHub {
    pub room: Room,
    pub state: Arc<Mutex<RoomState>>,
}

impl RoomHub {
    pub fn new(room: Room) -> Self {
        Self {
            room,
            state: Arc::new(Mutex::new(RoomState::new())),
        }
    }
}
