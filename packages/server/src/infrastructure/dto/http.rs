//! HTTP API DTOs for the chat relay.

use serde::{Deserialize, Serialize};

use super::websocket::MessageDto;

/// Query string of the history endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Room history response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponseDto {
    pub room_id: String,
    pub messages: Vec<MessageDto>,
}

/// Body of `POST /api/rooms/{room_id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequestDto {
    pub text: String,
    /// Only honoured for anonymous requests.
    #[serde(default)]
    pub author_id: Option<String>,
}

/// Live session and room counts
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatsDto {
    pub sessions: usize,
    pub rooms: usize,
}

/// Error body for non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}
