use pinroom::config::Config;
use pinroom::db::dbpins::PgPersistence;
use pinroom::db::memory::MemoryPersistence;
use pinroom::db::Persistence;
use pinroom::routes::create_app;
use pinroom::ws::{spawn_hub_sweeper, SyncEngine};
use pinroom::AppState;
use std::panic;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "pinroom=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    // Pick the persistence backend
    let persistence: Arc<dyn Persistence> = match &config.db_url {
        Some(db_url) => match PgPersistence::connect(db_url).await {
            Ok(db) => {
                info!("Database initialized successfully");
                Arc::new(db)
            }
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                warn!("Falling back to in-memory storage; rooms and pins will not survive a restart");
                Arc::new(MemoryPersistence::new())
            }
        },
        None => {
            warn!("No database URL configured - rooms and pins are kept in memory only");
            Arc::new(MemoryPersistence::new())
        }
    };

    let engine = SyncEngine::new(persistence, config.room_cache_ttl(), config.room_cache_capacity);
    let address = config.server_address();
    let room_idle = config.room_idle_timeout();
    let state = AppState::new(engine, config);

    match room_idle {
        Some(idle_for) => {
            info!("Evicting rooms idle for more than {:?}", idle_for);
            spawn_hub_sweeper(state.engine.clone(), idle_for);
        }
        None => info!("Room eviction disabled"),
    }
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", address));

    info!("🚀 Server running on http://{}", address);
    info!("📡 WebSocket available at ws://{}/ws", address);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    axum::serve(listener, app).await.expect("Server failed to start");
}
