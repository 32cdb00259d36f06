//! Health and liveness endpoints.
//!
//! - `/ping` - Liveness probe, answers `pong` without touching any backend
//! - `/health` - Probes the durable store and the cache

use std::future::Future;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

/// Upper bound for a single probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Key read by the cache probe. Never written.
const CACHE_PROBE_KEY: &str = "health_probe";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthEntry {
    pub key: String,
    pub status: HealthStatus,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub total_checks: usize,
    pub entries: Vec<HealthEntry>,
}

impl HealthReport {
    /// Healthy only when every entry is.
    pub fn from_entries(entries: Vec<HealthEntry>) -> Self {
        let status = if entries.iter().all(|e| e.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        Self {
            status,
            total_checks: entries.len(),
            entries,
        }
    }
}

async fn probe<F, T, E>(key: &str, check: F) -> HealthEntry
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let (status, description) = match tokio::time::timeout(PROBE_TIMEOUT, check).await {
        Ok(Ok(_)) => (HealthStatus::Healthy, format!("{key} is reachable")),
        Ok(Err(err)) => (HealthStatus::Unhealthy, err.to_string()),
        Err(_) => (
            HealthStatus::Unhealthy,
            format!("{key} did not answer within {}s", PROBE_TIMEOUT.as_secs()),
        ),
    };

    if status == HealthStatus::Unhealthy {
        tracing::warn!(check = key, %description, "Health check failed");
    }

    HealthEntry {
        key: key.to_string(),
        status,
        description,
    }
}

/// GET /ping - Liveness probe.
pub async fn ping() -> &'static str {
    "pong"
}

/// GET /health - Readiness of the backing services.
///
/// Returns 200 when every check passes, 503 otherwise.
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let (store, cache) = tokio::join!(
        probe("store", state.store.get_book(0)),
        probe("cache", state.cache.get(CACHE_PROBE_KEY)),
    );

    let report = HealthReport::from_entries(vec![store, cache]);
    let code = match report.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(report))
}
