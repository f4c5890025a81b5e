//! Analytics endpoints: correlation matrix and volatility rankings.

use crate::error::{db_error, invalid_input, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use cryptoflow_core::{CorrelationEntry, VolatilityEntry};
use cryptoflow_data::warehouse::analytics;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    /// Lookback window in days, default 30
    pub window: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CorrelationMatrixResponse {
    pub window_days: i32,
    /// Most recent computation time among the stored pairs
    pub computed_at: Option<DateTime<Utc>>,
    /// Asset ids present in the matrix, ascending
    pub assets: Vec<i32>,
    /// Full mirrored matrix, keyed by asset id
    pub matrix: BTreeMap<i32, BTreeMap<i32, f64>>,
}

/// Mirror the stored ordered pairs into a full symmetric matrix with a
/// unit diagonal. Pairs without a correlation value are left out.
pub fn mirror_matrix(entries: &[CorrelationEntry]) -> CorrelationMatrixResponse {
    let mut assets: BTreeSet<i32> = BTreeSet::new();
    let mut matrix: BTreeMap<i32, BTreeMap<i32, f64>> = BTreeMap::new();
    let mut computed_at: Option<DateTime<Utc>> = None;
    let window_days = entries.first().map(|e| e.window_days).unwrap_or(0);

    for entry in entries {
        assets.insert(entry.asset_a_id);
        assets.insert(entry.asset_b_id);

        computed_at = Some(match computed_at {
            Some(ts) => ts.max(entry.computed_at),
            None => entry.computed_at,
        });

        if let Some(corr) = entry.correlation {
            matrix
                .entry(entry.asset_a_id)
                .or_default()
                .insert(entry.asset_b_id, corr);
            matrix
                .entry(entry.asset_b_id)
                .or_default()
                .insert(entry.asset_a_id, corr);
        }
    }

    for &id in &assets {
        matrix.entry(id).or_default().insert(id, 1.0);
    }

    CorrelationMatrixResponse {
        window_days,
        computed_at,
        assets: assets.into_iter().collect(),
        matrix,
    }
}

/// `GET /api/analytics/correlation?window=30`
pub async fn correlation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Json<CorrelationMatrixResponse>> {
    let window = resolve_window(query.window)?;

    let entries = analytics::correlations(&state.db, window)
        .await
        .map_err(db_error)?;

    let mut response = mirror_matrix(&entries);
    response.window_days = window;
    Ok(Json(response))
}

/// `GET /api/analytics/volatility?window=30` — most volatile first.
pub async fn volatility(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Json<Vec<VolatilityEntry>>> {
    let window = resolve_window(query.window)?;

    let entries = analytics::volatilities(&state.db, window)
        .await
        .map_err(db_error)?;

    Ok(Json(entries))
}

fn resolve_window(window: Option<i32>) -> ApiResult<i32> {
    let window = window.unwrap_or(30);
    if window <= 0 {
        return Err(invalid_input("window must be positive"));
    }
    Ok(window)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/correlation", get(correlation))
        .route("/volatility", get(volatility))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(a: i32, b: i32, corr: Option<f64>) -> CorrelationEntry {
        CorrelationEntry {
            asset_a_id: a,
            asset_b_id: b,
            window_days: 30,
            correlation: corr,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let entries = vec![entry(1, 2, Some(0.85)), entry(1, 3, Some(-0.2))];
        let response = mirror_matrix(&entries);

        assert_eq!(response.assets, vec![1, 2, 3]);
        assert_eq!(response.matrix[&1][&2], 0.85);
        assert_eq!(response.matrix[&2][&1], 0.85);
        assert_eq!(response.matrix[&3][&1], -0.2);
        assert_eq!(response.matrix[&1][&1], 1.0);
        assert_eq!(response.matrix[&2][&2], 1.0);
    }

    #[test]
    fn pairs_without_a_value_keep_the_asset_but_not_the_cell() {
        let entries = vec![entry(1, 2, None)];
        let response = mirror_matrix(&entries);

        assert_eq!(response.assets, vec![1, 2]);
        assert!(!response.matrix[&1].contains_key(&2));
        assert_eq!(response.matrix[&1][&1], 1.0);
    }

    #[test]
    fn empty_entries_yield_an_empty_matrix() {
        let response = mirror_matrix(&[]);
        assert!(response.assets.is_empty());
        assert!(response.matrix.is_empty());
        assert!(response.computed_at.is_none());
    }
}
