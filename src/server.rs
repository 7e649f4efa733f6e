use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::chart::ChartOrchestrator;
use crate::error::ChartError;
use crate::types::{BirthInput, ChartResult};

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChartOrchestrator>,
}

pub fn build_router(state: AppState) -> Router {
    // The method router answers non-POST on the chart route with 405.
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/zodiac", post(zodiac_handler))
        .with_state(state)
}

pub async fn start_server(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

async fn health_handler() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn zodiac_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> (StatusCode, Json<Value>) {
    // Credential check comes first: nothing leaves the process without it.
    let credential = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim()
        .to_string();
    if credential.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "API key is required"})),
        );
    }

    let Some(Json(payload)) = body else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "request body must be a JSON object"})),
        );
    };
    let input: BirthInput = match serde_json::from_value(payload) {
        Ok(input) => input,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"message": format!("invalid birth fields: {e}")})),
            )
        }
    };

    match state.orchestrator.run(&input, &credential).await {
        Ok(result) => (StatusCode::OK, Json(chart_response(&result))),
        Err(e) => error_response(&e),
    }
}

fn error_response(err: &ChartError) -> (StatusCode, Json<Value>) {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status == StatusCode::BAD_REQUEST {
        (status, Json(json!({"message": err.to_string()})))
    } else {
        error!("chart request failed: {err}");
        (
            status,
            Json(json!({
                "message": "Internal Server Error",
                "error": err.to_string(),
                "trace": err.kind(),
            })),
        )
    }
}

/// Response in the legacy wire shape: `az`/`alt` carry ecliptic longitude
/// and latitude (historical field names, kept for compatibility).
fn chart_response(result: &ChartResult) -> Value {
    let mut planet_data = serde_json::Map::new();
    for reading in &result.readings {
        planet_data.insert(
            reading.planet.name().to_string(),
            json!({
                "az": reading.position.longitude,
                "alt": reading.position.latitude,
                "sign": reading.sign.name(),
                "explanation": reading.explanation,
            }),
        );
    }
    json!({
        "planetData": planet_data,
        "holisticReading": result.holistic_reading,
    })
}
