//! Registry of connected clients

use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::game::{AreaId, Lobby, Participant, PlayerId};
use crate::store::HistoryLog;
use crate::ws::protocol::ServerMsg;

use super::Client;

/// Outbound queue depth per client
const OUTBOUND_CAPACITY: usize = 64;

/// What the socket task needs to drive one connection
pub struct ClientSession {
    pub client: Arc<Client>,
    pub outbound_rx: mpsc::Receiver<ServerMsg>,
    pub kill_rx: watch::Receiver<bool>,
}

/// All connected clients, the area list, and the audit history
pub struct ClientRegistry {
    clients: DashMap<PlayerId, Arc<Client>>,
    next_id: AtomicU32,
    server_name: Arc<str>,
    areas: Vec<String>,
    history: HistoryLog,
}

impl ClientRegistry {
    pub fn new(server_name: &str, areas: Vec<String>) -> Self {
        Self {
            clients: DashMap::new(),
            next_id: AtomicU32::new(1),
            server_name: Arc::from(server_name),
            areas,
            history: HistoryLog::default(),
        }
    }

    /// Add a client in the first area. Ids are never reused.
    pub fn register(&self, name: String, authority: bool) -> ClientSession {
        let id = PlayerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (kill_tx, kill_rx) = watch::channel(false);

        let client = Arc::new(Client::new(
            id,
            name,
            authority,
            self.server_name.clone(),
            AreaId(0),
            outbound_tx,
            kill_tx,
        ));
        self.clients.insert(id, client.clone());

        info!(
            player_id = %id,
            name = client.name(),
            authority,
            connected = self.clients.len(),
            "Client registered"
        );

        ClientSession {
            client,
            outbound_rx,
            kill_rx,
        }
    }

    pub fn unregister(&self, id: PlayerId) {
        if self.clients.remove(&id).is_some() {
            info!(player_id = %id, connected = self.clients.len(), "Client unregistered");
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn area_name(&self, area: AreaId) -> String {
        self.areas
            .get(area.0)
            .cloned()
            .unwrap_or_else(|| format!("Area {}", area.0 + 1))
    }

    /// Look an area up by 1-based number or case-insensitive name
    pub fn find_area(&self, query: &str) -> Option<AreaId> {
        let query = query.trim();
        if let Ok(number) = query.parse::<usize>() {
            return (1..=self.areas.len()).contains(&number).then(|| AreaId(number - 1));
        }
        self.areas
            .iter()
            .position(|name| name.eq_ignore_ascii_case(query))
            .map(AreaId)
    }

    /// Client count per area, in area order
    pub fn occupancy(&self) -> Vec<(String, usize)> {
        let mut counts = vec![0usize; self.areas.len()];
        for entry in self.clients.iter() {
            if let Some(count) = counts.get_mut(entry.value().area().0) {
                *count += 1;
            }
        }
        self.areas.iter().cloned().zip(counts).collect()
    }

    /// Deliver a chat line to everyone in the speaker's area
    pub fn say(&self, speaker: &Client, text: &str) {
        let area = speaker.area();
        let msg = ServerMsg::Chat {
            from: speaker.name().to_string(),
            area: self.area_name(area),
            text: speaker.distort(text),
        };

        for entry in self.clients.iter() {
            if entry.value().area() == area {
                entry.value().send(msg.clone());
            }
        }
    }

    pub fn move_client(&self, client: &Client, area: AreaId) {
        client.set_area(area);
        client.send(ServerMsg::AreaChanged {
            area: self.area_name(area),
        });
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }
}

impl Lobby for ClientRegistry {
    type Client = Client;

    fn broadcast(&self, message: &str) {
        let msg = ServerMsg::System {
            author: self.server_name.to_string(),
            message: message.to_string(),
        };
        for entry in self.clients.iter() {
            entry.value().send(msg.clone());
        }
    }

    fn resolve(&self, id: PlayerId) -> Option<Arc<Client>> {
        self.clients.get(&id).map(|c| c.value().clone())
    }

    fn record_history(&self, actor: PlayerId, description: &str) {
        let name = self
            .resolve(actor)
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        self.history.record(actor, &name, description);
    }
}
