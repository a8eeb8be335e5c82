use serde::{Deserialize, Serialize};

use crate::models::{OptimalLocation, Pin};
use crate::store::voters::VoteAction;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JoinRoomMessage {
    pub room_id: String,
    #[serde(default = "default_display_name")]
    pub display_name: String,
    /// Identity used for votes and pin ownership; defaults to the display name
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_display_name() -> String {
    "Anonymous".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LeaveRoomMessage {
    pub room_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AddPinMessage {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PinRefMessage {
    pub pin_id: String,
}

/// Messages accepted from a websocket client
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ReceivedMessage {
    #[serde(rename = "join_room")]
    JoinRoom(JoinRoomMessage),
    #[serde(rename = "leave_room")]
    LeaveRoom(LeaveRoomMessage),
    #[serde(rename = "add_pin")]
    AddPin(AddPinMessage),
    #[serde(rename = "vote_pin")]
    VotePin(PinRefMessage),
    #[serde(rename = "remove_pin")]
    RemovePin(PinRefMessage),
    #[serde(rename = "optimal_location")]
    OptimalLocation,
    #[serde(rename = "ping")]
    Ping,
}

/// State changes fanned out to the members of a room, in the order the
/// engine applied them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    PresenceJoined {
        room_id: String,
        connection_id: String,
        display_name: String,
        message: String,
    },
    PresenceLeft {
        room_id: String,
        connection_id: String,
        display_name: String,
        message: String,
    },
    PinsSnapshot {
        room_id: String,
        pins: Vec<Pin>,
    },
    PinAdded {
        room_id: String,
        pin: Pin,
    },
    PinModified {
        room_id: String,
        action: VoteAction,
        pin: Pin,
    },
    PinRemoved {
        room_id: String,
        pin_id: String,
        title: String,
    },
}

impl RoomEvent {
    pub fn room_id(&self) -> &str {
        match self {
            RoomEvent::PresenceJoined { room_id, .. }
            | RoomEvent::PresenceLeft { room_id, .. }
            | RoomEvent::PinsSnapshot { room_id, .. }
            | RoomEvent::PinAdded { room_id, .. }
            | RoomEvent::PinModified { room_id, .. }
            | RoomEvent::PinRemoved { room_id, .. } => room_id,
        }
    }
}

/// Direct answers to the connection that sent a request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Joined {
        room_id: String,
        connection_id: String,
        member_count: usize,
    },
    Left {
        room_id: String,
    },
    OptimalLocation {
        room_id: String,
        result: OptimalLocation,
    },
    Pong {
        date: String,
    },
    Error {
        kind: String,
        message: String,
    },
}

/// Everything the server writes to a websocket
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ServerMessage {
    Event(RoomEvent),
    Reply(Reply),
}

impl From<RoomEvent> for ServerMessage {
    fn from(event: RoomEvent) -> Self {
        ServerMessage::Event(event)
    }
}

impl From<Reply> for ServerMessage {
    fn from(reply: Reply) -> Self {
        ServerMessage::Reply(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_defaults_apply() {
        let msg: ReceivedMessage =
            serde_json::from_str(r#"{"type":"join_room","room_id":"r1"}"#).unwrap();
        match msg {
            ReceivedMessage::JoinRoom(join) => {
                assert_eq!(join.room_id, "r1");
                assert_eq!(join.display_name, "Anonymous");
                assert_eq!(join.user_id, None);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn unit_requests_parse() {
        let msg: ReceivedMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, ReceivedMessage::Ping));
        let msg: ReceivedMessage =
            serde_json::from_str(r#"{"type":"optimal_location"}"#).unwrap();
        assert!(matches!(msg, ReceivedMessage::OptimalLocation));
    }

    #[test]
    fn events_are_tagged_by_kind() {
        let event = RoomEvent::PinRemoved {
            room_id: "r1".to_string(),
            pin_id: "p1".to_string(),
            title: "Cafe".to_string(),
        };
        let json = serde_json::to_value(ServerMessage::from(event.clone())).unwrap();
        assert_eq!(json["type"], "pin_removed");
        assert_eq!(json["room_id"], "r1");

        let back: ServerMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, ServerMessage::Event(event));
    }

    #[test]
    fn replies_decode_through_untagged_wrapper() {
        let json = r#"{"type":"error","kind":"not_in_room","message":"nope"}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Reply(Reply::Error {
                kind: "not_in_room".to_string(),
                message: "nope".to_string()
            })
        );
    }
}
