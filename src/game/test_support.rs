use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{AreaId, Lobby, Participant, PlayerId, PunishmentKind};

// Recording client: every side effect lands in a vec tests can inspect.
pub(crate) struct FakeClient {
    id: PlayerId,
    area: Mutex<AreaId>,
    authority: bool,
    pub(crate) private: Mutex<Vec<String>>,
    pub(crate) punishments: Mutex<Vec<(PunishmentKind, Duration, String)>>,
    pub(crate) kicked: Mutex<Option<String>>,
}

impl FakeClient {
    pub(crate) fn move_to(&self, area: AreaId) {
        *self.area.lock() = area;
    }

    pub(crate) fn private_messages(&self) -> Vec<String> {
        self.private.lock().clone()
    }

    pub(crate) fn punishment_count(&self) -> usize {
        self.punishments.lock().len()
    }

    pub(crate) fn was_kicked(&self) -> bool {
        self.kicked.lock().is_some()
    }
}

impl Participant for FakeClient {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn display_name(&self) -> String {
        format!("Player{}", self.id)
    }

    fn area(&self) -> AreaId {
        *self.area.lock()
    }

    fn has_authority(&self) -> bool {
        self.authority
    }

    fn send_private(&self, message: &str) {
        self.private.lock().push(message.to_string());
    }

    fn disconnect(&self, reason: &str) {
        *self.kicked.lock() = Some(reason.to_string());
    }

    fn apply_punishment(&self, kind: PunishmentKind, duration: Duration, reason: &str) {
        self.punishments
            .lock()
            .push((kind, duration, reason.to_string()));
    }
}

#[derive(Default)]
pub(crate) struct FakeLobby {
    clients: Mutex<HashMap<PlayerId, Arc<FakeClient>>>,
    pub(crate) broadcasts: Mutex<Vec<String>>,
    pub(crate) history: Mutex<Vec<(PlayerId, String)>>,
}

impl FakeLobby {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn connect(&self, id: u32, area: AreaId, authority: bool) -> Arc<FakeClient> {
        let client = Arc::new(FakeClient {
            id: PlayerId(id),
            area: Mutex::new(area),
            authority,
            private: Mutex::new(Vec::new()),
            punishments: Mutex::new(Vec::new()),
            kicked: Mutex::new(None),
        });
        self.clients.lock().insert(client.id, client.clone());
        client
    }

    pub(crate) fn drop_client(&self, id: u32) {
        self.clients.lock().remove(&PlayerId(id));
    }

    pub(crate) fn broadcast_log(&self) -> Vec<String> {
        self.broadcasts.lock().clone()
    }

    pub(crate) fn last_broadcast(&self) -> Option<String> {
        self.broadcasts.lock().last().cloned()
    }

    pub(crate) fn history_len(&self) -> usize {
        self.history.lock().len()
    }
}

impl Lobby for FakeLobby {
    type Client = FakeClient;

    fn broadcast(&self, message: &str) {
        self.broadcasts.lock().push(message.to_string());
    }

    fn resolve(&self, id: PlayerId) -> Option<Arc<FakeClient>> {
        self.clients.lock().get(&id).cloned()
    }

    fn record_history(&self, actor: PlayerId, description: &str) {
        self.history.lock().push((actor, description.to_string()));
    }
}
