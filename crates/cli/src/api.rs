//! Dispatch HTTP API
//!
//! - `POST /v1/dispatch`: one `{deviceAddress, payload}` object or an array
//!   of them; replies with the per-device outcome array and the aggregate
//!   status (200 / 207 / 400 / 500)
//! - `GET /healthz`: liveness

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use contracts::DispatchRequest;
use dispatcher::{CancellationToken, HttpReportSink, LogSink, ResultSink};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::commands::Engine;

/// Shared engine behind every request
#[derive(Clone)]
pub struct ApiState {
    engine: Arc<Engine>,
    /// Fired on shutdown; pending requests report `Cancelled`
    shutdown: CancellationToken,
}

impl ApiState {
    pub fn new(engine: Arc<Engine>, shutdown: CancellationToken) -> Self {
        Self { engine, shutdown }
    }
}

/// Request body: single request or batch
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DispatchBody {
    Batch(Vec<DispatchRequest>),
    Single(DispatchRequest),
}

impl DispatchBody {
    fn into_requests(self) -> Vec<DispatchRequest> {
        match self {
            Self::Batch(requests) => requests,
            Self::Single(request) => vec![request],
        }
    }
}

/// Build the API router
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/v1/dispatch", post(dispatch))
        .with_state(state)
        // Enable tracing
        .layer(TraceLayer::new_for_http())
}

/// Handle `/v1/dispatch` requests
#[instrument(name = "api_dispatch", skip_all)]
async fn dispatch(State(state): State<ApiState>, Json(body): Json<DispatchBody>) -> impl IntoResponse {
    let requests = body.into_requests();
    info!(requests = requests.len(), "Dispatch requested");

    let results = state
        .engine
        .dispatch_many(requests, &state.shutdown.child_token())
        .await;
    LogSink::new("api").render(&results);
    let report = HttpReportSink::new().render(&results);

    let status = StatusCode::from_u16(report.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(report.body))
}
