//! REST route modules and shared pagination types.

pub mod analytics;
pub mod health;
pub mod market;
pub mod pipeline;
pub mod quality;

use crate::state::AppState;
use crate::ws;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default and maximum page sizes.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

/// Query parameters shared by paginated endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageQuery {
    /// Clamp to sane bounds and return `(limit, offset, page, size)`.
    pub fn resolve(&self) -> (i64, i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (size, (page - 1) * size, page, size)
    }
}

/// Standard paginated envelope.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        Self {
            items,
            total,
            page,
            page_size,
        }
    }
}

/// Build the full application router.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest("/api/market", market::router())
        .nest("/api/analytics", analytics::router())
        .nest("/api/pipeline", pipeline::router())
        .nest("/api/quality", quality::router())
        .route("/ws/prices", get(ws::prices_ws_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults() {
        let (limit, offset, page, size) = PageQuery::default().resolve();
        assert_eq!((limit, offset, page, size), (50, 0, 1, 50));
    }

    #[test]
    fn page_query_clamps_out_of_range_values() {
        let query = PageQuery {
            page: Some(0),
            page_size: Some(10_000),
        };
        let (limit, offset, page, _) = query.resolve();
        assert_eq!(limit, MAX_PAGE_SIZE);
        assert_eq!(offset, 0);
        assert_eq!(page, 1);
    }

    #[test]
    fn page_query_computes_offsets() {
        let query = PageQuery {
            page: Some(3),
            page_size: Some(20),
        };
        let (limit, offset, _, _) = query.resolve();
        assert_eq!((limit, offset), (20, 40));
    }
}
