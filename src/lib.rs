pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod websocket;
pub mod ws;

use std::sync::Arc;

use config::Config;
use ws::SyncEngine;

/// Shared state handed to every HTTP and websocket handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(engine: SyncEngine, config: Config) -> Self {
        Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
        }
    }
}
