use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Error as SqlxError;
use std::time::Duration;
use tracing::{error, info};

use super::{Persistence, StorageError};
use crate::models::{Pin, Room, User};

const SCHEMA_SQL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS rooms (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_by TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        seq BIGSERIAL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pins (
        id TEXT PRIMARY KEY,
        room_id TEXT NOT NULL REFERENCES rooms(id),
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        latitude DOUBLE PRECISION NOT NULL,
        longitude DOUBLE PRECISION NOT NULL,
        created_by TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        voted_by TEXT[] NOT NULL DEFAULT '{}',
        seq BIGSERIAL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS pins_room_seq_idx ON pins (room_id, seq)",
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL DEFAULT '',
        avatar TEXT NOT NULL DEFAULT ''
    )
    "#,
];

/// Room row from database
#[derive(Debug, Clone, sqlx::FromRow)]
struct RoomRow {
    id: String,
    name: String,
    description: String,
    created_by: String,
    created_at: DateTime<Utc>,
    is_active: bool,
}

impl From<RoomRow> for Room {
    fn from(row: RoomRow) -> Self {
        Room {
            id: row.id,
            name: row.name,
            description: row.description,
            created_by: row.created_by,
            created_at: row.created_at,
            is_active: row.is_active,
        }
    }
}

/// Pin row from database
#[derive(Debug, Clone, sqlx::FromRow)]
struct PinRow {
    id: String,
    room_id: String,
    title: String,
    description: String,
    latitude: f64,
    longitude: f64,
    created_by: String,
    created_at: DateTime<Utc>,
    voted_by: Vec<String>,
}

impl From<PinRow> for Pin {
    fn from(row: PinRow) -> Self {
        Pin {
            id: row.id,
            room_id: row.room_id,
            title: row.title,
            description: row.description,
            latitude: row.latitude,
            longitude: row.longitude,
            created_by: row.created_by,
            created_at: row.created_at,
            voted_by: row.voted_by.into_iter().collect(),
        }
    }
}

/// User row from database
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    avatar: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            avatar: row.avatar,
            current_room: None,
        }
    }
}

/// Postgres backed persistence
pub struct PgPersistence {
    pool: PgPool,
}

impl PgPersistence {
    /// Create a new database connection pool and make sure the tables exist
    pub async fn connect(database_url: &str) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), SqlxError> {
        for statement in SCHEMA_SQL {
            if let Err(e) = sqlx::query(*statement).execute(&self.pool).await {
                error!("Failed to apply schema statement: {}", e);
                return Err(e);
            }
        }
        info!("Database schema is up to date");
        Ok(())
    }
}

impl Persistence for PgPersistence {
    fn insert_room<'a>(&'a self, room: &'a Room) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            sqlx::query(
                r#"
                INSERT INTO rooms (id, name, description, created_by, created_at, is_active)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&room.id)
            .bind(&room.name)
            .bind(&room.description)
            .bind(&room.created_by)
            .bind(room.created_at)
            .bind(room.is_active)
            .execute(&self.pool)
            .await?;
            Ok(())
        }
        .boxed()
    }

    fn find_room<'a>(&'a self, room_id: &'a str) -> BoxFuture<'a, Result<Option<Room>, StorageError>> {
        async move {
            let row = sqlx::query_as::<_, RoomRow>(
                "SELECT id, name, description, created_by, created_at, is_active FROM rooms WHERE id = $1",
            )
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(Room::from))
        }
        .boxed()
    }

    fn list_rooms(&self) -> BoxFuture<'_, Result<Vec<Room>, StorageError>> {
        async move {
            let rows = sqlx::query_as::<_, RoomRow>(
                r#"
                SELECT id, name, description, created_by, created_at, is_active
                FROM rooms
                WHERE is_active
                ORDER BY seq
                "#,
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows.into_iter().map(Room::from).collect())
        }
        .boxed()
    }

    fn insert_pin<'a>(&'a self, pin: &'a Pin) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            sqlx::query(
                r#"
                INSERT INTO pins (id, room_id, title, description, latitude, longitude, created_by, created_at, voted_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(&pin.id)
            .bind(&pin.room_id)
            .bind(&pin.title)
            .bind(&pin.description)
            .bind(pin.latitude)
            .bind(pin.longitude)
            .bind(&pin.created_by)
            .bind(pin.created_at)
            .bind(pin.voted_by.to_vec())
            .execute(&self.pool)
            .await?;
            Ok(())
        }
        .boxed()
    }

    fn update_pin_votes<'a>(&'a self, pin: &'a Pin) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let result = sqlx::query("UPDATE pins SET voted_by = $2 WHERE id = $1")
                .bind(&pin.id)
                .bind(pin.voted_by.to_vec())
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(StorageError::new(format!("pin '{}' is not stored", pin.id)));
            }
            Ok(())
        }
        .boxed()
    }

    fn delete_pin<'a>(&'a self, pin_id: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            sqlx::query("DELETE FROM pins WHERE id = $1")
                .bind(pin_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn find_pins_in_room<'a>(&'a self, room_id: &'a str) -> BoxFuture<'a, Result<Vec<Pin>, StorageError>> {
        async move {
            let rows = sqlx::query_as::<_, PinRow>(
                r#"
                SELECT id, room_id, title, description, latitude, longitude, created_by, created_at, voted_by
                FROM pins
                WHERE room_id = $1
                ORDER BY seq
                "#,
            )
            .bind(room_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows.into_iter().map(Pin::from).collect())
        }
        .boxed()
    }

    fn find_pin_room<'a>(&'a self, pin_id: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move {
            let room_id: Option<String> = sqlx::query_scalar("SELECT room_id FROM pins WHERE id = $1")
                .bind(pin_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(room_id)
        }
        .boxed()
    }

    fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            sqlx::query("INSERT INTO users (id, name, email, avatar) VALUES ($1, $2, $3, $4)")
                .bind(&user.id)
                .bind(&user.name)
                .bind(&user.email)
                .bind(&user.avatar)
                .execute(&self.pool)
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn find_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<User>, StorageError>> {
        async move {
            let row = sqlx::query_as::<_, UserRow>("SELECT id, name, email, avatar FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row.map(User::from))
        }
        .boxed()
    }
}
