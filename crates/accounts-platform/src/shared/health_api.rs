//! Health Check Endpoints
//!
//! - /health - Combined status with a storage check
//! - /health/live - Liveness
//! - /health/ready - Readiness, 503 until startup (indexes, seeding) completes

use axum::{
    routing::get,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
    /// Alive but still starting
    Degraded,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Which user store is serving requests
    pub storage: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<HealthCheck>,
}

#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

/// Health endpoint state. `db` is set only when the MongoDB store is in use.
#[derive(Clone)]
pub struct HealthState {
    pub db: Option<mongodb::Database>,
    pub version: Option<String>,
    pub storage: String,
    ready: Arc<AtomicBool>,
}

impl HealthState {
    pub fn new(db: Option<mongodb::Database>, version: Option<String>) -> Self {
        let storage = if db.is_some() { "mongodb" } else { "memory" };
        Self {
            db,
            version,
            storage: storage.to_string(),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn storage_check(&self) -> Option<HealthCheck> {
        let db = self.db.as_ref()?;
        let start = Instant::now();
        let result = db.run_command(mongodb::bson::doc! { "ping": 1 }).await;
        let duration_ms = Some(start.elapsed().as_millis() as u64);

        Some(match result {
            Ok(_) => HealthCheck {
                name: "mongodb".to_string(),
                status: HealthStatus::Up,
                message: None,
                duration_ms,
            },
            Err(e) => HealthCheck {
                name: "mongodb".to_string(),
                status: HealthStatus::Down,
                message: Some(format!("Connection failed: {}", e)),
                duration_ms,
            },
        })
    }
}

fn status_code(status: HealthStatus) -> StatusCode {
    if status == HealthStatus::Down {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

async fn get_health(State(state): State<HealthState>) -> Response {
    let check = state.storage_check().await;

    let status = match &check {
        Some(c) if c.status == HealthStatus::Down => HealthStatus::Down,
        _ if !state.is_ready() => HealthStatus::Degraded,
        _ => HealthStatus::Up,
    };

    let response = HealthResponse {
        status,
        timestamp: Utc::now(),
        version: state.version.clone(),
        storage: state.storage.clone(),
        checks: check.into_iter().collect(),
    };

    (status_code(status), Json(response)).into_response()
}

async fn get_liveness() -> Json<SimpleHealthResponse> {
    Json(SimpleHealthResponse { status: HealthStatus::Up })
}

async fn get_readiness(State(state): State<HealthState>) -> Response {
    let status = if !state.is_ready() {
        HealthStatus::Down
    } else {
        match state.storage_check().await {
            Some(check) => check.status,
            None => HealthStatus::Up,
        }
    };

    (status_code(status), Json(SimpleHealthResponse { status })).into_response()
}

pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(get_health))
        .route("/live", get(get_liveness))
        .route("/ready", get(get_readiness))
        .with_state(state)
}
