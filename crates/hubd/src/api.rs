use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::engine::Engine;
use crate::engine::EngineError;
use crate::engine::ThermostatCommand;

/// Response for the /v1/ping endpoint
#[derive(Serialize)]
struct PingResponse {
    status: String,
}

/// Response for the /v1/info endpoint
#[derive(Serialize)]
struct InfoResponse {
    version: String,
    hostname: String,
}

/// Response for errors and accepted commands
#[derive(Serialize)]
struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct TemperatureRequest {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct AwayModeRequest {
    on: bool,
}

#[derive(Debug, Deserialize)]
struct HvacModeRequest {
    mode: String,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    version: &'static str,
    engine: Arc<Engine>,
}

fn status(code: StatusCode, status: impl Into<String>) -> Response {
    (
        code,
        Json(StatusResponse {
            status: status.into(),
        }),
    )
        .into_response()
}

/// Handler for GET /v1/ping
#[tracing::instrument]
async fn ping() -> impl IntoResponse {
    tracing::debug!("Handling /v1/ping request");
    (
        StatusCode::OK,
        Json(PingResponse {
            status: "ok".to_string(),
        }),
    )
}

/// Handler for GET /v1/info
#[tracing::instrument(skip(state))]
async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Handling /v1/info request");

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    (
        StatusCode::OK,
        Json(InfoResponse {
            version: state.version.to_string(),
            hostname,
        }),
    )
}

/// Handler for GET /v1/states
#[tracing::instrument(skip(state))]
async fn states(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.engine.state_snapshot();
    (StatusCode::OK, Json((*snapshot).clone()))
}

/// Handler for GET /v1/states/:entity_id
#[tracing::instrument(skip(state))]
async fn entity_state(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
) -> Response {
    match state.engine.state_snapshot().entity_json(&entity_id) {
        Some(json) => (StatusCode::OK, Json(json)).into_response(),
        None => status(
            StatusCode::NOT_FOUND,
            format!("unknown entity: {}", entity_id),
        ),
    }
}

/// Route a command to a thermostat and translate the outcome
fn thermostat_command(
    state: &AppState,
    entity_id: String,
    command: ThermostatCommand,
) -> Response {
    if !state
        .engine
        .state_snapshot()
        .thermostats
        .contains_key(&entity_id)
    {
        return status(
            StatusCode::NOT_FOUND,
            format!("unknown thermostat: {}", entity_id),
        );
    }

    match state.engine.send_thermostat_command(entity_id, command) {
        Ok(()) => status(StatusCode::ACCEPTED, "accepted"),
        Err(e @ EngineError::UnknownEntity(_)) => status(StatusCode::NOT_FOUND, e.to_string()),
        Err(e) => {
            tracing::warn!("Failed to route thermostat command: {}", e);
            status(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

/// Handler for POST /v1/thermostats/:entity_id/temperature
#[tracing::instrument(skip(state))]
async fn set_temperature(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
    Json(request): Json<TemperatureRequest>,
) -> Response {
    thermostat_command(
        &state,
        entity_id,
        ThermostatCommand::SetTemperature(request.temperature),
    )
}

/// Handler for POST /v1/thermostats/:entity_id/away_mode
#[tracing::instrument(skip(state))]
async fn set_away_mode(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
    Json(request): Json<AwayModeRequest>,
) -> Response {
    thermostat_command(&state, entity_id, ThermostatCommand::SetAwayMode(request.on))
}

/// Handler for POST /v1/thermostats/:entity_id/hvac_mode
#[tracing::instrument(skip(state))]
async fn set_hvac_mode(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
    Json(request): Json<HvacModeRequest>,
) -> Response {
    thermostat_command(
        &state,
        entity_id,
        ThermostatCommand::SetHvacMode(request.mode),
    )
}

/// Create the API router with all endpoints
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/ping", get(ping))
        .route("/v1/info", get(info))
        .route("/v1/states", get(states))
        .route("/v1/states/:entity_id", get(entity_state))
        .route(
            "/v1/thermostats/:entity_id/temperature",
            post(set_temperature),
        )
        .route("/v1/thermostats/:entity_id/away_mode", post(set_away_mode))
        .route("/v1/thermostats/:entity_id/hvac_mode", post(set_hvac_mode))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server
///
/// This function will bind to the specified address and serve the API endpoints.
/// It will run until the provided shutdown signal is triggered.
///
/// # Arguments
/// * `listen` - The IP address to listen on (e.g., "127.0.0.1")
/// * `port` - The port to listen on (e.g., 8565)
/// * `engine` - The engine whose state is served and which routes commands
/// * `shutdown_rx` - A oneshot receiver that will trigger graceful shutdown
pub async fn serve(
    listen: String,
    port: u16,
    engine: Arc<Engine>,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let version = env!("CARGO_PKG_VERSION");

    let state = Arc::new(AppState { version, engine });
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", listen, port).parse()?;
    tracing::info!("Starting HTTP API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            tracing::info!("HTTP API server shutting down gracefully");
        })
        .await?;

    Ok(())
}
