use sqlx::PgPool;
use tokio::sync::broadcast;

use crate::config;

/// Shared per-process state. The broadcast sender is the event channel the
/// external real-time delivery layer subscribes to; the core only emits.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub env: config::Config,
    pub events_tx: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(db: PgPool, env: config::Config, events_tx: broadcast::Sender<String>) -> Self {
        Self { db, env, events_tx }
    }
}
