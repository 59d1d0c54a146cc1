//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};

use crate::{
    domain::{Identity, RoomId, SessionIdFactory, UserId},
    infrastructure::dto::{
        http::{ErrorDto, HistoryQuery, HistoryResponseDto, SendMessageRequestDto, StatsDto},
        websocket::MessageDto,
    },
    ui::state::AppState,
    usecase::{HistoryError, SendMessageError},
};

/// Header carrying the viewer asserted by the auth layer
pub const VIEWER_HEADER: &str = "x-user-id";

type ApiError = (StatusCode, Json<ErrorDto>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorDto {
            error: error.into(),
        }),
    )
}

/// The user asserted in [`VIEWER_HEADER`], if any.
fn user_from_headers(headers: &HeaderMap) -> Result<Option<UserId>, ApiError> {
    let Some(value) = headers.get(VIEWER_HEADER) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "invalid x-user-id header"))?;
    UserId::new(raw)
        .map(Some)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Live session and room counts
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsDto> {
    let stats = state.registry.stats().await;
    Json(StatsDto {
        sessions: stats.sessions,
        rooms: stats.rooms,
    })
}

/// Recent messages of a room, oldest first
pub async fn room_history(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<HistoryQuery>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponseDto>, ApiError> {
    let viewer = user_from_headers(&headers)?;

    match state
        .fetch_history()
        .execute(viewer, &room_id, query.limit)
        .await
    {
        Ok((room_id, messages)) => Ok(Json(HistoryResponseDto {
            room_id: room_id.into_string(),
            messages: messages.iter().map(MessageDto::from).collect(),
        })),
        Err(e @ (HistoryError::Validation(_) | HistoryError::InvalidLimit)) => {
            tracing::debug!("Rejected history request for '{}': {}", room_id, e);
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e @ HistoryError::NotFound(_)) => Err(api_error(StatusCode::NOT_FOUND, e.to_string())),
        Err(HistoryError::Storage(reason)) => {
            tracing::error!("Failed to load history of room '{}': {}", room_id, reason);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "history is temporarily unavailable",
            ))
        }
    }
}

/// Post a message without a WebSocket session.
///
/// The author is the user in [`VIEWER_HEADER`]; without one the request is
/// anonymous and may name its author in the body.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<SendMessageRequestDto>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let Json(request) = body.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
    let room_id =
        RoomId::new(room_id).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let identity = match user_from_headers(&headers)? {
        Some(user_id) => Identity::verified(user_id, None),
        None => Identity::anonymous(&SessionIdFactory::generate()),
    };

    match state
        .send_message()
        .send_as(&identity, room_id, &request.text, request.author_id.as_deref())
        .await
    {
        Ok(outcome) => Ok((StatusCode::CREATED, Json(MessageDto::from(&outcome.message)))),
        Err(e @ SendMessageError::Validation(_)) => {
            tracing::debug!("Rejected message from '{}': {}", identity.id, e);
            Err(api_error(StatusCode::BAD_REQUEST, e.client_message()))
        }
        Err(e @ SendMessageError::Storage(_)) => {
            tracing::error!("Failed to send message from '{}': {}", identity.id, e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.client_message(),
            ))
        }
    }
}
