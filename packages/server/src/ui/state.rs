//! Server state shared by every connection.

use axum::http::HeaderValue;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    config::ServerConfig,
    domain::{MessageRepository, OpenAccess, RecoveryCache, RoomAccess, RoomRegistry},
    usecase::{
        ConnectSessionUseCase, DisconnectSessionUseCase, FetchHistoryUseCase, JoinRoomUseCase,
        LeaveRoomUseCase, RoomSequencer, SendMessageUseCase,
    },
};

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// Identity asserted by the auth layer. Absent for anonymous sessions.
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    /// Token from a previous `session` event.
    pub resume_token: Option<String>,
}

/// Shared application state
pub struct AppState {
    /// Repository（データアクセス層の抽象化）
    pub repository: Arc<dyn MessageRepository>,
    pub registry: Arc<RoomRegistry>,
    pub sequencer: Arc<RoomSequencer>,
    pub recovery: Arc<RecoveryCache>,
    /// History read policy for the HTTP API
    pub access: Arc<dyn RoomAccess>,
    pub history_limit: usize,
    pub max_history_limit: usize,
    pub replay_history_on_resume: bool,
    /// CORS origin; `None` allows any.
    pub frontend_url: Option<HeaderValue>,
}

impl AppState {
    pub fn new(repository: Arc<dyn MessageRepository>, config: &ServerConfig) -> Self {
        Self {
            repository,
            registry: Arc::new(RoomRegistry::new()),
            sequencer: Arc::new(RoomSequencer::new()),
            recovery: Arc::new(RecoveryCache::new(config.recovery_window)),
            access: Arc::new(OpenAccess),
            history_limit: config.history_limit,
            max_history_limit: config.max_history_limit,
            replay_history_on_resume: config.replay_history_on_resume,
            frontend_url: config.frontend_url.clone(),
        }
    }

    /// Replace the history read policy.
    pub fn with_access(mut self, access: Arc<dyn RoomAccess>) -> Self {
        self.access = access;
        self
    }

    pub fn join_room(&self) -> JoinRoomUseCase {
        JoinRoomUseCase::new(
            self.repository.clone(),
            self.registry.clone(),
            self.sequencer.clone(),
            self.history_limit,
        )
    }

    pub fn leave_room(&self) -> LeaveRoomUseCase {
        LeaveRoomUseCase::new(self.registry.clone())
    }

    pub fn send_message(&self) -> SendMessageUseCase {
        SendMessageUseCase::new(
            self.repository.clone(),
            self.registry.clone(),
            self.sequencer.clone(),
        )
    }

    pub fn connect_session(&self) -> ConnectSessionUseCase {
        ConnectSessionUseCase::new(
            self.registry.clone(),
            self.recovery.clone(),
            self.join_room(),
            self.replay_history_on_resume,
        )
    }

    pub fn disconnect_session(&self) -> DisconnectSessionUseCase {
        DisconnectSessionUseCase::new(self.registry.clone(), self.recovery.clone())
    }

    pub fn fetch_history(&self) -> FetchHistoryUseCase {
        FetchHistoryUseCase::new(
            self.repository.clone(),
            self.access.clone(),
            self.history_limit,
            self.max_history_limit,
        )
    }
}
