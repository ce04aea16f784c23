use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use super::state::AppState;
use crate::channel::Subchannel;
use crate::error::SseError;
use crate::event::SseEvent;

/// Build the router serving one filtered stream.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/events",
            get(stream_base).post(publish_base).delete(unsubscribe_base),
        )
        .route(
            "/events/:subchannel",
            get(stream_sub).post(publish_sub).delete(unsubscribe_sub),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Request body for publishing an event.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublishRequest {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub provider: String,
    pub healthy: bool,
}

/// Maps `SseError` onto HTTP status codes with a JSON error body.
pub struct ApiError(SseError);

impl From<SseError> for ApiError {
    fn from(err: SseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SseError::InvalidEventType(_)
            | SseError::InvalidSubchannel { .. }
            | SseError::Serialization(_) => StatusCode::BAD_REQUEST,
            SseError::Publish { .. } | SseError::Unsubscribe { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.stream.provider();
    let healthy = provider.health().await.unwrap_or(false);
    Json(HealthResponse {
        provider: provider.name().to_string(),
        healthy,
    })
}

async fn open_stream(state: &AppState, subchannel: Subchannel) -> Result<Response, ApiError> {
    let mut response = state
        .stream
        .stream_with_retry(subchannel, Some(state.headers.as_ref()), state.retry_ms)
        .await?;
    if let Some(interval) = state.keep_alive {
        response = response.with_keep_alive(interval);
    }
    Ok(response.into_response())
}

async fn publish(
    state: &AppState,
    subchannel: Subchannel,
    request: PublishRequest,
) -> Result<StatusCode, ApiError> {
    let event = SseEvent::new(request.event, request.data);
    state.stream.publish(&event, subchannel).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn unsubscribe(state: &AppState, subchannel: Subchannel) -> Result<StatusCode, ApiError> {
    state.stream.unsubscribe(subchannel).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stream_base(State(state): State<AppState>) -> Result<Response, ApiError> {
    open_stream(&state, Subchannel::base()).await
}

async fn stream_sub(
    State(state): State<AppState>,
    Path(subchannel): Path<String>,
) -> Result<Response, ApiError> {
    open_stream(&state, subchannel.into()).await
}

async fn publish_base(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> Result<StatusCode, ApiError> {
    publish(&state, Subchannel::base(), request).await
}

async fn publish_sub(
    State(state): State<AppState>,
    Path(subchannel): Path<String>,
    Json(request): Json<PublishRequest>,
) -> Result<StatusCode, ApiError> {
    publish(&state, subchannel.into(), request).await
}

async fn unsubscribe_base(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    unsubscribe(&state, Subchannel::base()).await
}

async fn unsubscribe_sub(
    State(state): State<AppState>,
    Path(subchannel): Path<String>,
) -> Result<StatusCode, ApiError> {
    unsubscribe(&state, subchannel.into()).await
}
