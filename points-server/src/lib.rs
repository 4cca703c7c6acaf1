//! HTTP edge for the points ledger
//!
//! Thin axum layer: decodes JSON, forwards to the [`PointsHandle`] actor and
//! maps ledger errors to status codes. No business logic lives here.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use points_ledger::{
    spawn_points_actor, Config, Metrics, Payer, PayerBalance, PayerId, PointsHandle, PointsStore,
    SpendPlan,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub points: PointsHandle,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayerRequest {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub payer: String,
    pub points: i64,
    /// Defaults to the time the request is received
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SpendRequest {
    pub points: i64,
}

#[derive(Debug, Deserialize)]
pub struct PayerQuery {
    /// Name prefix; all payers when absent
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub payers: usize,
}

// Error handling
#[derive(Debug)]
pub enum ApiError {
    Points(points_ledger::Error),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use points_ledger::Error;

        let (status, message) = match self {
            ApiError::Points(e) => {
                let status = match &e {
                    Error::PayerNotFound(_) => StatusCode::NOT_FOUND,
                    Error::PayerExists(_) | Error::InsufficientPoints { .. } => {
                        StatusCode::CONFLICT
                    }
                    e if e.is_client_error() => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal error: {}", msg),
            ),
        };

        (status, Json(serde_json::json!({
            "error": message,
            "timestamp": Utc::now(),
        }))).into_response()
    }
}

impl From<points_ledger::Error> for ApiError {
    fn from(err: points_ledger::Error) -> Self {
        ApiError::Points(err)
    }
}

// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let payers = state.points.get_all_balances().await?.len();

    Ok(Json(HealthResponse {
        status: "healthy",
        service: "points-server",
        version: env!("CARGO_PKG_VERSION"),
        payers,
    }))
}

// Prometheus metrics endpoint
async fn metrics_handler(State(state): State<AppState>) -> Result<String, ApiError> {
    state
        .points
        .metrics()
        .export()
        .map_err(|e| ApiError::Internal(format!("Failed to export metrics: {}", e)))
}

async fn get_all_balances(
    State(state): State<AppState>,
) -> Result<Json<Vec<PayerBalance>>, ApiError> {
    Ok(Json(state.points.payer_balances().await?))
}

async fn get_payer_balance(
    State(state): State<AppState>,
    Path(payer_id): Path<String>,
) -> Result<Json<PayerBalance>, ApiError> {
    Ok(Json(state.points.get_balance(PayerId::new(payer_id)).await?))
}

async fn list_payers(
    State(state): State<AppState>,
    Query(query): Query<PayerQuery>,
) -> Result<Json<Vec<Payer>>, ApiError> {
    let payers = match query.search {
        Some(search) => state.points.search_payers(search).await?,
        None => state
            .points
            .payer_balances()
            .await?
            .into_iter()
            .map(|balance| balance.payer)
            .collect(),
    };

    Ok(Json(payers))
}

async fn register_payer(
    State(state): State<AppState>,
    Json(request): Json<RegisterPayerRequest>,
) -> Result<(StatusCode, Json<Payer>), ApiError> {
    let payer = state
        .points
        .register_payer(PayerId::new(request.id), request.name)
        .await?;

    Ok((StatusCode::CREATED, Json(payer)))
}

async fn add_purchase(
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<PayerBalance>, ApiError> {
    let timestamp = request.timestamp.unwrap_or_else(Utc::now);
    let balance = state
        .points
        .record_purchase(PayerId::new(request.payer), request.points, timestamp)
        .await?;

    Ok(Json(balance))
}

async fn spend_points(
    State(state): State<AppState>,
    Json(request): Json<SpendRequest>,
) -> Result<Json<SpendPlan>, ApiError> {
    Ok(Json(state.points.spend(request.points).await?))
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/payers", get(list_payers).post(register_payer))
        .route("/payers/balances", get(get_all_balances))
        .route("/payers/:payer_id/balances", get(get_payer_balance))
        .route("/purchases", post(add_purchase))
        .route("/rewards/spend", post(spend_points))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the store, register seed payers and start the actor
pub async fn bootstrap(config: &Config) -> anyhow::Result<PointsHandle> {
    let mut store = PointsStore::new(config.spend.policy);
    for seed in &config.seed_payers {
        match store.register_payer(PayerId::new(seed.id.as_str()), seed.name.as_str()) {
            Ok(payer) => info!("Registered seed payer {}", payer.id),
            Err(e) => warn!("Skipping seed payer {}: {}", seed.id, e),
        }
    }

    let metrics = Metrics::new()?;
    Ok(spawn_points_actor(
        store,
        metrics,
        config.actor.mailbox_capacity,
    ))
}
