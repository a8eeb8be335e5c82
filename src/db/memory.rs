use futures_util::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::RwLock;

use super::{Persistence, StorageError};
use crate::models::{Pin, Room, User};

/// In-process persistence, used when no database is configured.
#[derive(Default)]
pub struct MemoryPersistence {
    rooms: RwLock<Vec<Room>>,
    // insertion ordered per room
    pins: RwLock<HashMap<String, Vec<Pin>>>,
    users: RwLock<HashMap<String, User>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StorageError {
    StorageError::new("memory store lock poisoned")
}

impl Persistence for MemoryPersistence {
    fn insert_room<'a>(&'a self, room: &'a Room) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let mut rooms = self.rooms.write().map_err(|_| poisoned())?;
            if rooms.iter().any(|r| r.id == room.id) {
                return Err(StorageError::new(format!("room '{}' already exists", room.id)));
            }
            rooms.push(room.clone());
            Ok(())
        }
        .boxed()
    }

    fn find_room<'a>(&'a self, room_id: &'a str) -> BoxFuture<'a, Result<Option<Room>, StorageError>> {
        async move {
            let rooms = self.rooms.read().map_err(|_| poisoned())?;
            Ok(rooms.iter().find(|r| r.id == room_id).cloned())
        }
        .boxed()
    }

    fn list_rooms(&self) -> BoxFuture<'_, Result<Vec<Room>, StorageError>> {
        async move {
            let rooms = self.rooms.read().map_err(|_| poisoned())?;
            Ok(rooms.iter().filter(|r| r.is_active).cloned().collect())
        }
        .boxed()
    }

    fn insert_pin<'a>(&'a self, pin: &'a Pin) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let mut pins = self.pins.write().map_err(|_| poisoned())?;
            pins.entry(pin.room_id.clone()).or_default().push(pin.clone());
            Ok(())
        }
        .boxed()
    }

    fn update_pin_votes<'a>(&'a self, pin: &'a Pin) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let mut pins = self.pins.write().map_err(|_| poisoned())?;
            let stored = pins
                .get_mut(&pin.room_id)
                .and_then(|room_pins| room_pins.iter_mut().find(|p| p.id == pin.id))
                .ok_or_else(|| StorageError::new(format!("pin '{}' is not stored", pin.id)))?;
            stored.voted_by = pin.voted_by.clone();
            Ok(())
        }
        .boxed()
    }

    fn delete_pin<'a>(&'a self, pin_id: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let mut pins = self.pins.write().map_err(|_| poisoned())?;
            for room_pins in pins.values_mut() {
                room_pins.retain(|p| p.id != pin_id);
            }
            Ok(())
        }
        .boxed()
    }

    fn find_pins_in_room<'a>(&'a self, room_id: &'a str) -> BoxFuture<'a, Result<Vec<Pin>, StorageError>> {
        async move {
            let pins = self.pins.read().map_err(|_| poisoned())?;
            Ok(pins.get(room_id).cloned().unwrap_or_default())
        }
        .boxed()
    }

    fn find_pin_room<'a>(&'a self, pin_id: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move {
            let pins = self.pins.read().map_err(|_| poisoned())?;
            Ok(pins
                .values()
                .flatten()
                .find(|p| p.id == pin_id)
                .map(|p| p.room_id.clone()))
        }
        .boxed()
    }

    fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let mut users = self.users.write().map_err(|_| poisoned())?;
            if users.contains_key(&user.id) {
                return Err(StorageError::new(format!("user '{}' already exists", user.id)));
            }
            users.insert(user.id.clone(), user.clone());
            Ok(())
        }
        .boxed()
    }

    fn find_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<User>, StorageError>> {
        async move {
            let users = self.users.read().map_err(|_| poisoned())?;
            Ok(users.get(user_id).cloned())
        }
        .boxed()
    }
}
