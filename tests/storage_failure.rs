use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pinroom::db::memory::MemoryPersistence;
use pinroom::db::{Persistence, StorageError};
use pinroom::config::Config;
use pinroom::models::{NewPin, Pin, Room, RoomCreateRequest, RoomEvent, ServerMessage, SyncError, User};
use pinroom::routes::create_app;
use pinroom::ws::SyncEngine;
use pinroom::AppState;
use tower::ServiceExt;

/// Memory persistence with switchable write failures and a budget of
/// failing reads.
#[derive(Default)]
struct FlakyPersistence {
    inner: MemoryPersistence,
    fail_writes: AtomicBool,
    failing_reads: AtomicUsize,
}

impl FlakyPersistence {
    fn write_gate(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::new("injected write failure"));
        }
        Ok(())
    }

    fn read_gate(&self) -> Result<(), StorageError> {
        let took = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if took {
            return Err(StorageError::new("injected read failure"));
        }
        Ok(())
    }
}

impl Persistence for FlakyPersistence {
    fn insert_room<'a>(&'a self, room: &'a Room) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.write_gate()?;
            self.inner.insert_room(room).await
        }
        .boxed()
    }

    fn find_room<'a>(&'a self, room_id: &'a str) -> BoxFuture<'a, Result<Option<Room>, StorageError>> {
        async move {
            self.read_gate()?;
            self.inner.find_room(room_id).await
        }
        .boxed()
    }

    fn list_rooms(&self) -> BoxFuture<'_, Result<Vec<Room>, StorageError>> {
        async move {
            self.read_gate()?;
            self.inner.list_rooms().await
        }
        .boxed()
    }

    fn insert_pin<'a>(&'a self, pin: &'a Pin) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.write_gate()?;
            self.inner.insert_pin(pin).await
        }
        .boxed()
    }

    fn update_pin_votes<'a>(&'a self, pin: &'a Pin) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.write_gate()?;
            self.inner.update_pin_votes(pin).await
        }
        .boxed()
    }

    fn delete_pin<'a>(&'a self, pin_id: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.write_gate()?;
            self.inner.delete_pin(pin_id).await
        }
        .boxed()
    }

    fn find_pins_in_room<'a>(&'a self, room_id: &'a str) -> BoxFuture<'a, Result<Vec<Pin>, StorageError>> {
        async move {
            self.read_gate()?;
            self.inner.find_pins_in_room(room_id).await
        }
        .boxed()
    }

    fn find_pin_room<'a>(&'a self, pin_id: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move {
            self.read_gate()?;
            self.inner.find_pin_room(pin_id).await
        }
        .boxed()
    }

    fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.write_gate()?;
            self.inner.insert_user(user).await
        }
        .boxed()
    }

    fn find_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<User>, StorageError>> {
        async move {
            self.read_gate()?;
            self.inner.find_user(user_id).await
        }
        .boxed()
    }
}

fn room_request() -> RoomCreateRequest {
    RoomCreateRequest {
        name: "Offsite".to_string(),
        description: None,
        created_by: "ann".to_string(),
    }
}

fn new_pin(title: &str) -> NewPin {
    NewPin::parse(title, None, 10.0, 20.0, "ann").unwrap()
}

async fn setup() -> (Arc<FlakyPersistence>, SyncEngine, Room) {
    let persistence = Arc::new(FlakyPersistence::default());
    let engine = SyncEngine::new(persistence.clone(), Duration::from_secs(60), 100);
    let room = engine.create_room(&room_request()).await.unwrap();
    (persistence, engine, room)
}

#[tokio::test]
async fn failed_pin_insert_leaves_room_untouched() {
    let (persistence, engine, room) = setup().await;
    let mut outbox = engine.connect("c1");
    engine.join("c1", &room.id, "Ann", "ann").await.unwrap();
    while outbox.try_recv().is_ok() {}

    persistence.fail_writes.store(true, Ordering::SeqCst);
    let result = engine.add_pin(&room.id, new_pin("Lost")).await;
    assert!(matches!(result, Err(SyncError::Storage(_))));

    persistence.fail_writes.store(false, Ordering::SeqCst);
    assert!(engine.list_pins(&room.id).await.unwrap().is_empty());
    assert!(outbox.try_recv().is_err(), "no event may follow a failed write");
}

#[tokio::test]
async fn failed_vote_keeps_previous_voters() {
    let (persistence, engine, room) = setup().await;
    let pin = engine.add_pin(&room.id, new_pin("Lake")).await.unwrap();
    engine.vote(&pin.id, "bob").await.unwrap();

    let mut outbox = engine.connect("c1");
    engine.join("c1", &room.id, "Ann", "ann").await.unwrap();
    while outbox.try_recv().is_ok() {}

    persistence.fail_writes.store(true, Ordering::SeqCst);
    assert!(matches!(engine.vote(&pin.id, "carol").await, Err(SyncError::Storage(_))));
    assert!(matches!(engine.vote(&pin.id, "bob").await, Err(SyncError::Storage(_))));
    assert!(matches!(engine.remove_pin(&pin.id).await, Err(SyncError::Storage(_))));
    persistence.fail_writes.store(false, Ordering::SeqCst);

    let pins = engine.list_pins(&room.id).await.unwrap();
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].voted_by.to_vec(), vec!["bob".to_string()]);
    assert!(outbox.try_recv().is_err());

    // a later success is delivered normally
    engine.vote(&pin.id, "carol").await.unwrap();
    match outbox.try_recv() {
        Ok(ServerMessage::Event(event)) => assert_eq!(event.room_id(), room.id),
        other => panic!("expected a room event, got {:?}", other),
    }
}

#[tokio::test]
async fn failed_room_insert_is_not_listed() {
    let (persistence, engine, _) = setup().await;
    persistence.fail_writes.store(true, Ordering::SeqCst);
    assert!(matches!(engine.create_room(&room_request()).await, Err(SyncError::Storage(_))));
    persistence.fail_writes.store(false, Ordering::SeqCst);
    assert_eq!(engine.list_rooms().await.unwrap().len(), 1);
}

#[tokio::test]
async fn single_read_failure_is_retried() {
    let persistence = Arc::new(FlakyPersistence::default());
    let room = Room::new(&room_request()).unwrap();
    persistence.inner.insert_room(&room).await.unwrap();
    let engine = SyncEngine::new(persistence.clone(), Duration::from_secs(60), 100);

    // the room lookup fails once and succeeds on retry
    persistence.failing_reads.store(1, Ordering::SeqCst);
    assert!(engine.list_pins(&room.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn repeated_read_failure_surfaces_as_storage_error() {
    let persistence = Arc::new(FlakyPersistence::default());
    let room = Room::new(&room_request()).unwrap();
    persistence.inner.insert_room(&room).await.unwrap();
    let engine = SyncEngine::new(persistence.clone(), Duration::from_secs(60), 100);

    persistence.failing_reads.store(2, Ordering::SeqCst);
    assert!(matches!(engine.list_pins(&room.id).await, Err(SyncError::Storage(_))));

    // nothing was cached by the failed attempt
    assert!(engine.list_pins(&room.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_delete_keeps_pin() {
    let (persistence, engine, room) = setup().await;
    let pin = engine.add_pin(&room.id, new_pin("Cafe")).await.unwrap();

    let mut outbox = engine.connect("c1");
    engine.join("c1", &room.id, "Ann", "ann").await.unwrap();
    while outbox.try_recv().is_ok() {}

    persistence.fail_writes.store(true, Ordering::SeqCst);
    assert!(matches!(engine.remove_pin(&pin.id).await, Err(SyncError::Storage(_))));
    persistence.fail_writes.store(false, Ordering::SeqCst);

    assert_eq!(engine.list_pins(&room.id).await.unwrap(), vec![pin.clone()]);
    assert!(outbox.try_recv().is_err(), "no pin_removed after a failed delete");

    assert_eq!(engine.remove_pin(&pin.id).await.unwrap(), "Cafe");
    assert!(matches!(
        outbox.try_recv(),
        Ok(ServerMessage::Event(RoomEvent::PinRemoved { .. }))
    ));
    assert!(engine.list_pins(&room.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn readiness_reports_unreachable_storage() {
    let persistence = Arc::new(FlakyPersistence::default());
    let engine = SyncEngine::new(persistence.clone(), Duration::from_secs(60), 100);
    let app = create_app(AppState::new(engine, Config::default()));

    let ready = || Request::builder().uri("/api/ready").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(ready()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    persistence.failing_reads.store(2, Ordering::SeqCst);
    let response = app.clone().oneshot(ready()).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
