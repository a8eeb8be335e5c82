pub mod connctx;
pub mod engine;
pub mod roomdir;
pub mod roomhub;

pub use engine::{spawn_hub_sweeper, EngineStats, SyncEngine};
