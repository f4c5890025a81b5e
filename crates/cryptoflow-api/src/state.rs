//! Shared server state.

use crate::ws::ClientRegistry;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

/// State handed to every handler.
pub struct AppState {
    /// Warehouse connection pool
    pub db: PgPool,
    /// Connected relay clients
    pub clients: Arc<ClientRegistry>,
    /// Server start time, for uptime reporting
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: PgPool, clients: Arc<ClientRegistry>) -> Self {
        Self {
            db,
            clients,
            started_at: Utc::now(),
        }
    }

    /// Cheap database round-trip.
    pub async fn is_db_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db).await.is_ok()
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
