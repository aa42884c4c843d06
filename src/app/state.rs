//! Application state shared across routes

use std::sync::Arc;

use crate::clients::ClientRegistry;
use crate::config::Config;
use crate::game::HotPotato;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub clients: Arc<ClientRegistry>,
    pub hot_potato: Arc<HotPotato<ClientRegistry>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Initialize client registry (also the minigame's lobby)
        let clients = Arc::new(ClientRegistry::new(
            &config.server_name,
            config.areas.clone(),
        ));

        // Initialize the minigame with a fixed or fresh seed
        let seed = config.rng_seed.unwrap_or_else(rand::random::<u64>);
        let hot_potato = Arc::new(HotPotato::new(
            clients.clone(),
            config.hot_potato.clone(),
            seed,
        ));

        Self {
            config,
            clients,
            hot_potato,
        }
    }

    /// True when `key` matches the configured moderator key
    pub fn is_moderator_key(&self, key: Option<&str>) -> bool {
        match (&self.config.moderator_key, key) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        }
    }
}
