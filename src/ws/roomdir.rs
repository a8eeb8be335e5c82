use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::db::{retry_read, Persistence, StorageError};
use crate::models::Room;

/// Room existence lookups against persistence.
///
/// Only rooms that exist are cached: the core never deletes a room, so a
/// positive answer cannot go stale, while a miss is always asked again.
pub struct RoomDirectory {
    persistence: Arc<dyn Persistence>,
    cache: Cache<String, Room>,
}

impl RoomDirectory {
    pub fn new(persistence: Arc<dyn Persistence>, ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { persistence, cache }
    }

    pub async fn lookup(&self, room_id: &str) -> Result<Option<Room>, StorageError> {
        if let Some(room) = self.cache.get(room_id).await {
            return Ok(Some(room));
        }

        debug!("Room directory cache miss for {}", room_id);
        let persistence = &self.persistence;
        let found = retry_read("find_room", || persistence.find_room(room_id)).await?;
        if let Some(room) = &found {
            self.cache.insert(room_id.to_string(), room.clone()).await;
        }
        Ok(found)
    }

    pub async fn remember(&self, room: &Room) {
        self.cache.insert(room.id.clone(), room.clone()).await;
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryPersistence;
    use crate::models::RoomCreateRequest;

    #[tokio::test]
    async fn finds_persisted_rooms_and_misses_unknown_ones() {
        let persistence = Arc::new(MemoryPersistence::new());
        let room = Room::new(&RoomCreateRequest {
            name: "Picnic".to_string(),
            description: None,
            created_by: "ann".to_string(),
        })
        .unwrap();
        persistence.insert_room(&room).await.unwrap();

        let directory = RoomDirectory::new(persistence, Duration::from_secs(60), 100);
        assert_eq!(directory.lookup(&room.id).await.unwrap(), Some(room.clone()));
        assert_eq!(directory.lookup("missing").await.unwrap(), None);
        // served from cache the second time
        assert_eq!(directory.lookup(&room.id).await.unwrap(), Some(room));
    }
}
