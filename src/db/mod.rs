pub mod dbpins;
pub mod memory;

use futures_util::future::BoxFuture;
use std::future::Future;
use tracing::warn;

use crate::models::{Pin, Room, User};

/// Failure reported by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageError {
    message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::new(e.to_string())
    }
}

/// Durable room and pin storage.
///
/// The engine keeps the live state in memory and writes every mutation
/// through this trait before committing it, so an `Err` from a mutating
/// call must mean nothing was stored.
pub trait Persistence: Send + Sync {
    fn insert_room<'a>(&'a self, room: &'a Room) -> BoxFuture<'a, Result<(), StorageError>>;

    fn find_room<'a>(&'a self, room_id: &'a str) -> BoxFuture<'a, Result<Option<Room>, StorageError>>;

    /// Active rooms, oldest first
    fn list_rooms(&self) -> BoxFuture<'_, Result<Vec<Room>, StorageError>>;

    fn insert_pin<'a>(&'a self, pin: &'a Pin) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Replace the stored voter set of `pin`
    fn update_pin_votes<'a>(&'a self, pin: &'a Pin) -> BoxFuture<'a, Result<(), StorageError>>;

    fn delete_pin<'a>(&'a self, pin_id: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Pins of a room in insertion order
    fn find_pins_in_room<'a>(&'a self, room_id: &'a str) -> BoxFuture<'a, Result<Vec<Pin>, StorageError>>;

    /// Room owning a pin, if the pin exists
    fn find_pin_room<'a>(&'a self, pin_id: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>>;

    fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<(), StorageError>>;

    fn find_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<User>, StorageError>>;
}

/// Run an idempotent read, retrying it once on a storage failure.
pub async fn retry_read<T, F, Fut>(what: &str, mut op: F) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("Storage read '{}' failed, retrying once: {}", what, e);
            op().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn retry_read_recovers_from_one_failure() {
        let calls = AtomicUsize::new(0);
        let result = retry_read("test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(StorageError::new("transient"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retry_read_gives_up_after_second_failure() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = retry_read("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StorageError::new("down")) }
        })
        .await;
        assert_eq!(result, Err(StorageError::new("down")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
