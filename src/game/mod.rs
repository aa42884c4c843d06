//! Hot Potato minigame

pub mod hot_potato;
pub mod punishment;
pub mod resolution;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use hot_potato::{HotPotato, HotPotatoError};
pub use punishment::PunishmentKind;
pub use state::GamePhase;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Connection-scoped player identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into the configured area list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(pub usize);

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connected player as seen by the minigame.
///
/// Every getter reads live state at call time. The side-effecting methods are
/// fire-and-forget and must be safe to call from any task.
pub trait Participant: Send + Sync {
    fn id(&self) -> PlayerId;
    fn display_name(&self) -> String;
    fn area(&self) -> AreaId;
    fn has_authority(&self) -> bool;
    fn send_private(&self, message: &str);
    fn disconnect(&self, reason: &str);
    fn apply_punishment(&self, kind: PunishmentKind, duration: Duration, reason: &str);
}

/// Server-wide services the minigame talks to
pub trait Lobby: Send + Sync + 'static {
    type Client: Participant + 'static;

    /// Deliver a system message to every connected client
    fn broadcast(&self, message: &str);

    /// Live lookup; `None` once the player has disconnected
    fn resolve(&self, id: PlayerId) -> Option<Arc<Self::Client>>;

    /// Best-effort audit trail
    fn record_history(&self, actor: PlayerId, description: &str);
}
