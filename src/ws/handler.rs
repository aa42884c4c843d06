//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::clients::{Client, ClientSession};
use crate::commands;
use crate::game::Participant;
use crate::util::rate_limit::ClientRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Longest display name accepted at connect time
const MAX_NAME_LEN: usize = 32;

/// How long a kicked client's writer gets to flush the kick notice
const KICK_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Display name shown in chat
    pub name: Option<String>,
    /// Moderator key; grants authority when it matches the server's
    pub mod_key: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let authority = state.is_moderator_key(query.mod_key.as_deref());
    let name = display_name(query.name.as_deref());
    ws.on_upgrade(move |socket| handle_socket(socket, name, authority, state))
}

fn display_name(raw: Option<&str>) -> String {
    let trimmed: String = raw
        .unwrap_or("")
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LEN)
        .collect();
    if trimmed.is_empty() {
        "Anonymous".to_string()
    } else {
        trimmed
    }
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, name: String, authority: bool, state: AppState) {
    let session = state.clients.register(name, authority);
    let player_id = session.client.id();
    info!(player_id = %player_id, authority, "New WebSocket connection");

    session.client.send(ServerMsg::Welcome {
        player_id,
        server_name: state.config.server_name.clone(),
        area: state.clients.area_name(session.client.area()),
        server_time: unix_millis(),
    });

    run_session(socket, session, &state).await;

    // Cleanup on disconnect
    state.clients.unregister(player_id);

    info!(player_id = %player_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(socket: WebSocket, session: ClientSession, state: &AppState) {
    let ClientSession {
        client,
        outbound_rx,
        mut kill_rx,
    } = session;
    let player_id = client.id();
    let (ws_sink, mut ws_stream) = socket.split();

    let writer_handle = tokio::spawn(write_loop(player_id.0, ws_sink, outbound_rx));
    let rate_limiter = ClientRateLimiter::new();

    // Reader loop: WebSocket -> commands / chat
    loop {
        let result = tokio::select! {
            _ = kill_rx.changed() => {
                info!(player_id = %player_id, "Session closed by server");
                break;
            }
            next = ws_stream.next() => match next {
                Some(result) => result,
                None => break,
            },
        };

        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(player_id = %player_id, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => handle_client_msg(msg, &client, state),
                    Err(e) => {
                        warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                        client.send(ServerMsg::Error {
                            code: "bad_message".to_string(),
                            message: "Could not parse message".to_string(),
                        });
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(player_id = %player_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(player_id = %player_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    if client.is_disconnecting() {
        // Let the kick notice reach the client before the socket goes away
        if tokio::time::timeout(KICK_FLUSH_TIMEOUT, writer_handle).await.is_err() {
            debug!(player_id = %player_id, "Writer did not finish flushing");
        }
    } else {
        writer_handle.abort();
    }
}

fn handle_client_msg(msg: ClientMsg, client: &Client, state: &AppState) {
    match msg {
        ClientMsg::Say { text } => {
            let text = text.trim();
            if !text.is_empty() {
                state.clients.say(client, text);
            }
        }
        ClientMsg::Command { text } => {
            commands::dispatch(&text, client, &state.clients, &state.hot_potato);
        }
        ClientMsg::Ping { t } => client.send(ServerMsg::Pong { t }),
    }
}

/// Writer task: outbound queue -> WebSocket. Stops after a kick.
async fn write_loop(
    player_id: u32,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<ServerMsg>,
) {
    while let Some(msg) = outbound_rx.recv().await {
        let is_kick = matches!(msg, ServerMsg::Kicked { .. });

        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
            debug!(player_id, error = %e, "WebSocket send failed");
            break;
        }

        if is_kick {
            let _ = ws_sink.close().await;
            break;
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_are_cleaned() {
        assert_eq!(display_name(None), "Anonymous");
        assert_eq!(display_name(Some("   ")), "Anonymous");
        assert_eq!(display_name(Some("  Maya Fey ")), "Maya Fey");
        assert_eq!(display_name(Some(&"x".repeat(40))).len(), MAX_NAME_LEN);
    }
}
