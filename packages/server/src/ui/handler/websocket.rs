//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        Query, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::{mpsc, oneshot};

use crate::{
    domain::{
        DeliveryCursor, Identity, OutboundEvent, ResumeToken, RoomId, Session, Timestamp, UserId,
    },
    infrastructure::dto::websocket::{ClientEvent, ServerEvent},
    ui::state::{AppState, ConnectQuery},
    usecase::SendMessageError,
};

/// How long a closing connection waits for its writer to stop
const SEND_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> UserId (Domain Model)
    let verified = match query.user_id {
        Some(raw) => match UserId::try_from(raw.clone()) {
            Ok(id) => Some(Identity::verified(id, query.display_name)),
            Err(e) => {
                tracing::warn!("Invalid user_id '{}': {}", raw, e);
                return Err(StatusCode::BAD_REQUEST);
            }
        },
        None => None,
    };

    let resume_token = query
        .resume_token
        .filter(|t| !t.trim().is_empty())
        .map(ResumeToken::new);

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, verified, resume_token)))
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    verified: Option<Identity>,
    resume_token: Option<ResumeToken>,
) {
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for this session to receive events
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundEvent>();

    let session = state
        .connect_session()
        .execute(verified, tx, resume_token)
        .await
        .session;

    // Spawn a task to receive events from the client
    let recv_session = session.clone();
    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", recv_session.id(), e);
                    return "transport error";
                }
            };

            match msg {
                WsMessage::Text(text) => {
                    handle_client_frame(&recv_state, &recv_session, text.as_str()).await;
                }
                WsMessage::Binary(_) => {
                    recv_session.notify_error("binary frames are not supported");
                }
                WsMessage::Close(_) => {
                    tracing::info!("Session '{}' requested close", recv_session.id());
                    return "client closed";
                }
                // Ping/pong frames are answered by the WebSocket layer
                _ => {}
            }
        }
        "stream ended"
    });

    // Spawn a task to push queued events to this client. It keeps track of
    // how far delivery got so a resume can replay the rest.
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let send_session_id = session.id().clone();
    let mut send_task = tokio::spawn(async move {
        let mut delivered = DeliveryCursor::new();
        loop {
            let event = tokio::select! {
                biased;
                _ = &mut stop_rx => return ("client closed", delivered),
                event = rx.recv() => event,
            };
            let Some(event) = event else {
                return ("outbox closed", delivered);
            };
            let json = match serde_json::to_string(&ServerEvent::from(event.clone())) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to encode event for '{}': {}", send_session_id, e);
                    continue;
                }
            };
            if sender.send(WsMessage::Text(json.into())).await.is_err() {
                return ("send failed", delivered);
            }
            delivered.record(&event);
        }
    });

    // When one side finishes, wind the other one down and wait for it, so
    // nothing can re-register the session after it is disconnected.
    let (reason, delivered) = tokio::select! {
        r = &mut recv_task => {
            let _ = stop_tx.send(());
            let reason = r.unwrap_or("receiver aborted");
            let delivered = match tokio::time::timeout(SEND_DRAIN_TIMEOUT, &mut send_task).await {
                Ok(Ok((_, delivered))) => delivered,
                Ok(Err(_)) => DeliveryCursor::new(),
                Err(_) => {
                    tracing::warn!("Writer of '{}' did not stop in time", session.id());
                    send_task.abort();
                    DeliveryCursor::new()
                }
            };
            (reason, delivered)
        }
        r = &mut send_task => {
            recv_task.abort();
            let _ = (&mut recv_task).await;
            r.unwrap_or(("sender aborted", DeliveryCursor::new()))
        }
    };

    state
        .disconnect_session()
        .execute(&session, reason, delivered)
        .await;
}

async fn handle_client_frame(state: &AppState, session: &Session, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!("Unparseable frame from '{}': {}", session.id(), e);
            session.notify_error(format!("invalid event: {e}"));
            return;
        }
    };

    match event {
        ClientEvent::Join { room_id } => {
            let Some(room_id) = parse_room_id(session, room_id) else {
                return;
            };
            state.join_room().execute(session, room_id).await;
        }
        ClientEvent::JoinChannel { channel_id } => match RoomId::channel(&channel_id) {
            Ok(room_id) => {
                state.join_room().subscribe(session, &room_id).await;
            }
            Err(e) => {
                tracing::debug!("Invalid channel id from '{}': {}", session.id(), e);
                session.notify_error(e.to_string());
            }
        },
        ClientEvent::Leave { room_id } => {
            let Some(room_id) = parse_room_id(session, room_id) else {
                return;
            };
            state.leave_room().execute(session, &room_id).await;
        }
        ClientEvent::Send {
            room_id,
            text,
            author_id,
        } => {
            let Some(room_id) = parse_room_id(session, room_id) else {
                return;
            };
            let result = state
                .send_message()
                .execute(session, room_id, &text, author_id.as_deref())
                .await;
            match result {
                Ok(_) => {}
                Err(e @ SendMessageError::Validation(_)) => {
                    tracing::warn!("Rejected message from '{}': {}", session.id(), e);
                    session.notify_error(e.client_message());
                }
                Err(e @ SendMessageError::Storage(_)) => {
                    tracing::error!("Failed to send message from '{}': {}", session.id(), e);
                    session.notify_error(e.client_message());
                }
            }
        }
        ClientEvent::Ping => {
            session.notify(OutboundEvent::Pong(Timestamp::now()));
        }
    }
}

fn parse_room_id(session: &Session, raw: String) -> Option<RoomId> {
    match RoomId::try_from(raw) {
        Ok(room_id) => Some(room_id),
        Err(e) => {
            tracing::debug!("Invalid room id from '{}': {}", session.id(), e);
            session.notify_error(e.to_string());
            None
        }
    }
}
