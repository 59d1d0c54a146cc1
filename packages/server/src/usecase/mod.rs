//! UseCase layer: the relay engine.
//!
//! Each use case owns `Arc`s of the shared state it needs and exposes an
//! async `execute`. Sequencing of joins and sends per room lives in
//! [`RoomSequencer`].

pub mod connect_session;
pub mod disconnect_session;
pub mod error;
pub mod fetch_history;
pub mod join_room;
pub mod leave_room;
pub mod report_stats;
pub mod send_message;
pub mod sequencer;

pub use connect_session::{ConnectOutcome, ConnectSessionUseCase};
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{HistoryError, SendMessageError};
pub use fetch_history::{DEFAULT_MAX_HISTORY_LIMIT, FetchHistoryUseCase};
pub use join_room::{DEFAULT_HISTORY_LIMIT, HistoryReplay, JoinOutcome, JoinRoomUseCase};
pub use leave_room::LeaveRoomUseCase;
pub use report_stats::{DEFAULT_STATS_INTERVAL, StatsReporter};
pub use send_message::{SendMessageUseCase, SendOutcome};
pub use sequencer::RoomSequencer;
