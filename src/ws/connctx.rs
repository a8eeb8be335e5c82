use crate::store::membership::Outbox;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinedRoom {
    pub room_id: String,
    pub display_name: String,
    pub user_id: String,
}

/// Lifecycle of a transport connection. A connection that is not tracked at
/// all is disconnected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    JoinedRoom(JoinedRoom),
}

#[derive(Clone, Debug)]
pub struct ConnCtx {
    pub outbox: Outbox,
    pub state: ConnectionState,
}

impl ConnCtx {
    pub fn new(outbox: Outbox) -> Self {
        Self {
            outbox,
            state: ConnectionState::Connected,
        }
    }

    pub fn joined(&self) -> Option<&JoinedRoom> {
        match &self.state {
            ConnectionState::JoinedRoom(joined) => Some(joined),
            ConnectionState::Connected => None,
        }
    }
}
