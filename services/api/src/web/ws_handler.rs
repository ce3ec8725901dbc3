//! services/api/src/web/ws_handler.rs
//!
//! The live bookings WebSocket. The view is opened before the upgrade so that
//! authorization failures are plain HTTP errors. After the upgrade the socket
//! gets one snapshot followed by every matching change until either side closes
//! or the server shuts down.

use crate::{
    error::{booking_error, HttpError},
    web::{protocol::ServerMessage, rest::BookingQuery, state::AppState},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use counsel_core::{Booking, BookingChange, Subscription, User};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

/// The handler for upgrading HTTP requests to a live bookings connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<BookingQuery>,
) -> Result<Response, HttpError> {
    let (snapshot, changes) = app_state
        .bookings
        .watch_bookings(&user.actor(), query.to_filter()?)
        .await
        .map_err(|e| booking_error("Failed to open live bookings", e))?;

    let shutdown = app_state.shutdown.clone();
    let user_id = user.user_id;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, user_id, snapshot, changes, shutdown)))
}

async fn handle_socket(
    socket: WebSocket,
    user_id: Uuid,
    snapshot: Vec<Booking>,
    mut changes: Subscription<BookingChange>,
    shutdown: CancellationToken,
) {
    info!("Live bookings connection opened for user: {}", user_id);
    let (mut sender, mut receiver) = socket.split();

    let snapshot = ServerMessage::Snapshot {
        bookings: snapshot.into_iter().map(Into::into).collect(),
    };
    if send(&mut sender, &snapshot).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Server shutting down; closing live bookings for user: {}", user_id);
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            change = changes.next() => {
                let Some(change) = change else {
                    debug!("Booking feed closed.");
                    let ended = ServerMessage::Error {
                        message: "Live updates have stopped. Reload to reconnect.".to_string(),
                    };
                    let _ = send(&mut sender, &ended).await;
                    break;
                };
                if send(&mut sender, &ServerMessage::from(change)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    info!("Client disconnected.");
                    break;
                }
                Some(Err(e)) => {
                    error!("WebSocket receive failed: {:?}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    changes.close();
    info!("Live bookings connection closed for user: {}", user_id);
}

/// Serializes and sends one message. An `Err` means the connection is gone.
async fn send(sender: &mut SplitSink<WebSocket, Message>, message: &ServerMessage) -> Result<(), ()> {
    let json = serde_json::to_string(message).map_err(|e| {
        error!("Failed to serialize server message: {:?}", e);
    })?;
    sender.send(Message::Text(json.into())).await.map_err(|e| {
        debug!("Failed to send to WebSocket: {:?}", e);
    })
}
