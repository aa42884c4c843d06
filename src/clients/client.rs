//! A single connected client

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::game::{AreaId, Participant, PlayerId, PunishmentKind};
use crate::ws::protocol::ServerMsg;

/// Expiry used when a punishment duration does not fit on the clock
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// A punishment currently distorting the client's speech
#[derive(Debug, Clone)]
pub struct ActivePunishment {
    pub kind: PunishmentKind,
    pub expires_at: Instant,
    pub reason: String,
}

/// Server-side handle for one connection
pub struct Client {
    id: PlayerId,
    name: String,
    authority: bool,
    server_name: Arc<str>,
    area: RwLock<AreaId>,
    outbound: mpsc::Sender<ServerMsg>,
    kill_tx: watch::Sender<bool>,
    punishments: Mutex<Vec<ActivePunishment>>,
}

impl Client {
    pub fn new(
        id: PlayerId,
        name: String,
        authority: bool,
        server_name: Arc<str>,
        area: AreaId,
        outbound: mpsc::Sender<ServerMsg>,
        kill_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            id,
            name,
            authority,
            server_name,
            area: RwLock::new(area),
            outbound,
            kill_tx,
            punishments: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a message without waiting; drops it if the client is backed up
    pub fn send(&self, msg: ServerMsg) {
        match self.outbound.try_send(msg) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(player_id = %self.id, "Outbound queue full, dropping message");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(player_id = %self.id, "Outbound queue closed");
            }
        }
    }

    pub fn send_system(&self, message: &str) {
        self.send(ServerMsg::System {
            author: self.server_name.to_string(),
            message: message.to_string(),
        });
    }

    pub(crate) fn set_area(&self, area: AreaId) {
        *self.area.write() = area;
    }

    /// Unexpired punishments, oldest first. Expired ones are dropped here.
    pub fn active_punishments(&self) -> Vec<ActivePunishment> {
        let mut punishments = self.punishments.lock();
        let now = Instant::now();
        punishments.retain(|p| p.expires_at > now);
        punishments.clone()
    }

    /// Run a chat line through every active punishment
    pub fn distort(&self, text: &str) -> String {
        let active = self.active_punishments();
        if active.is_empty() {
            return text.to_string();
        }

        let mut rng = rand::thread_rng();
        active
            .iter()
            .fold(text.to_string(), |line, p| p.kind.apply(&line, &mut rng))
    }

    pub fn is_disconnecting(&self) -> bool {
        *self.kill_tx.borrow()
    }
}

impl Participant for Client {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn area(&self) -> AreaId {
        *self.area.read()
    }

    fn has_authority(&self) -> bool {
        self.authority
    }

    fn send_private(&self, message: &str) {
        self.send_system(message);
    }

    fn disconnect(&self, reason: &str) {
        info!(player_id = %self.id, reason, "Disconnecting client");
        self.send(ServerMsg::Kicked {
            reason: reason.to_string(),
        });
        self.kill_tx.send_replace(true);
    }

    fn apply_punishment(&self, kind: PunishmentKind, duration: Duration, reason: &str) {
        info!(player_id = %self.id, punishment = %kind, ?duration, reason, "Punishment applied");
        let now = Instant::now();
        let expires_at = now
            .checked_add(duration)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.punishments.lock().push(ActivePunishment {
            kind,
            expires_at,
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> (Client, mpsc::Receiver<ServerMsg>, watch::Receiver<bool>) {
        let (tx, rx) = mpsc::channel(8);
        let (kill_tx, kill_rx) = watch::channel(false);
        let client = Client::new(
            PlayerId(7),
            "Phoenix".to_string(),
            false,
            Arc::from("Test Server"),
            AreaId(0),
            tx,
            kill_tx,
        );
        (client, rx, kill_rx)
    }

    #[tokio::test(start_paused = true)]
    async fn punishments_distort_until_they_expire() {
        let (client, _rx, _kill) = client();
        client.apply_punishment(PunishmentKind::Uppercase, Duration::from_secs(600), "test");

        assert_eq!(client.distort("objection"), "OBJECTION");

        tokio::time::advance(Duration::from_secs(600)).await;
        assert_eq!(client.distort("objection"), "objection");
        assert!(client.active_punishments().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn punishments_stack_in_order() {
        let (client, _rx, _kill) = client();
        client.apply_punishment(PunishmentKind::Uppercase, Duration::from_secs(60), "a");
        client.apply_punishment(PunishmentKind::Backward, Duration::from_secs(60), "b");

        assert_eq!(client.distort("abc"), "CBA");
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_duration_saturates_instead_of_overflowing() {
        let (client, _rx, _kill) = client();
        client.apply_punishment(PunishmentKind::Uppercase, Duration::from_secs(u64::MAX), "long");
        client.apply_punishment(PunishmentKind::Backward, Duration::from_secs(60), "short");

        assert_eq!(client.distort("abc"), "CBA");

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(client.distort("abc"), "ABC");
        assert_eq!(client.active_punishments().len(), 1);
    }

    #[tokio::test]
    async fn disconnect_sends_reason_and_trips_kill_switch() {
        let (client, mut rx, kill) = client();

        client.disconnect("caught");

        assert_eq!(
            rx.try_recv().expect("kick queued"),
            ServerMsg::Kicked {
                reason: "caught".to_string()
            }
        );
        assert!(*kill.borrow());
        assert!(client.is_disconnecting());
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (client, mut rx, _kill) = client();
        for i in 0..20 {
            client.send_private(&format!("line {i}"));
        }

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 8);
    }
}
