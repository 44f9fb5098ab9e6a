use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Json, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{delete, get, post},
};
use futures::Stream;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use application::DeviceForm;
use domain::DomainError;
use domain::device::ActuatorAction;

use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/devices", get(list_devices).post(create_device))
        .route("/api/devices/{id}", delete(delete_device))
        .route("/api/status", get(get_status))
        .route("/api/history", get(get_history))
        .route("/api/actuators/{location}/{action}", post(toggle_actuator))
        .route("/api/events", get(sse_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `DomainError` rendered as `{ "error": ... }` with a matching status code
pub struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::InvalidRecord(_) => StatusCode::BAD_REQUEST,
            DomainError::Remote { .. } | DomainError::PartialWrite { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = %status, error = %self.0, "Request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn list_devices(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.commands.list_devices().await?))
}

async fn create_device(
    State(state): State<Arc<AppState>>,
    Json(form): Json<DeviceForm>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.commands.create_device(form).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn delete_device(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state.commands.delete_device(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.live.current().cards)
}

async fn get_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.live.current().history)
}

async fn toggle_actuator(
    Path((location, action)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let action: ActuatorAction = action.parse()?;
    let written = state.commands.toggle_actuator(&location, action).await?;
    Ok(Json(written))
}

async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.live.subscribe();
    let stream = BroadcastStream::new(rx).map(|msg| match msg {
        Ok(view) => Event::default()
            .event("dashboard")
            .json_data(view)
            .map_err(|_| axum::Error::new("Serialization error")),
        // Lagged: the next view supersedes the ones skipped
        Err(_) => Ok(Event::default().comment("lagged")),
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
