//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

use crate::game::PlayerId;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// In-character line to everyone in the speaker's area
    Say { text: String },

    /// Slash command, with or without the leading '/'
    Command { text: String },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        player_id: PlayerId,
        server_name: String,
        area: String,
        server_time: u64,
    },

    /// Server-authored notice, either broadcast or private
    System { author: String, message: String },

    /// Area chat
    Chat {
        from: String,
        area: String,
        text: String,
    },

    /// Sender now stands in a different area
    AreaChanged { area: String },

    /// Connection is being closed by the server
    Kicked { reason: String },

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}
