//! Hot Potato orchestrator
//!
//! One game at a time, in two timed phases:
//! - opt-in: players register with `/hotpotato accept`
//! - active: one secret carrier walks around until the game timer runs out
//!
//! All state lives behind a single lock. Deferred tasks carry the generation
//! they were scheduled for and do nothing if the game they belong to is gone.
//! The lock is never held while talking to clients.

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::HotPotatoConfig;
use crate::util::time::human_duration;

use super::punishment::{random_punishment, PunishmentKind};
use super::resolution::{GameSnapshot, Outcome, Resolution};
use super::state::{GamePhase, GameState};
use super::{Lobby, Participant, PlayerId};

/// Rejected Hot Potato requests. `Display` is the text shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotPotatoError {
    #[error("A Hot Potato game is already in progress.")]
    AlreadyRunning,

    #[error("Hot Potato is on cooldown. Please wait {remaining_secs} seconds.")]
    OnCooldown { remaining_secs: u64 },

    #[error("There is no active Hot Potato game to join right now.")]
    NoActiveInvite,

    #[error("You have already joined the Hot Potato game.")]
    AlreadyJoined,
}

/// What the opt-in timer decided while holding the lock
enum OptInClose {
    Stale,
    Cancelled { players: usize },
    Promoted { carrier: PlayerId, players: usize },
}

/// The server-wide minigame
pub struct HotPotato<L: Lobby> {
    lobby: Arc<L>,
    settings: HotPotatoConfig,
    state: Mutex<GameState>,
    /// Locked after `state` when both are needed, never before
    rng: Mutex<ChaCha8Rng>,
}

impl<L: Lobby> HotPotato<L> {
    pub fn new(lobby: Arc<L>, settings: HotPotatoConfig, seed: u64) -> Self {
        Self {
            lobby,
            settings,
            state: Mutex::new(GameState::new()),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.state.lock().phase()
    }

    pub fn participant_count(&self) -> usize {
        self.state.lock().participants.len()
    }

    /// Seconds until a new game may start, or `None` if it may start now
    pub fn cooldown_remaining(&self) -> Option<u64> {
        self.state.lock().cooldown_remaining(self.settings.cooldown)
    }

    /// Open the opt-in phase and schedule its expiry
    pub fn start_game(self: &Arc<Self>, initiator: &L::Client) -> Result<(), HotPotatoError> {
        let generation = self.state.lock().begin_opt_in(self.settings.cooldown)?;

        info!(player_id = %initiator.id(), generation, "Hot Potato opt-in started");

        self.lobby.broadcast(&self.rules());
        self.lobby
            .record_history(initiator.id(), "Started Hot Potato opt-in");

        let game = Arc::clone(self);
        let wait = self.settings.opt_in_window;
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            game.close_opt_in(generation);
        });

        Ok(())
    }

    /// Register a player for the running opt-in. Returns the participant count.
    pub fn accept_invite(&self, player: &L::Client) -> Result<usize, HotPotatoError> {
        let count = self.state.lock().join(player.id())?;

        info!(player_id = %player.id(), participants = count, "Player joined Hot Potato");

        player.send_private(&format!(
            "🥔 You have joined the Hot Potato game! ({count} participant(s) so far)"
        ));
        self.lobby.broadcast(&format!(
            "🥔 {} joined Hot Potato! ({count} participant(s))",
            player.display_name()
        ));

        Ok(count)
    }

    /// Abort any running game. In-flight timers see the new generation and stop.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let was = state.phase();
        state.reset();
        info!(previous_phase = ?was, generation = state.generation, "Hot Potato reset");
    }

    fn close_opt_in(self: &Arc<Self>, generation: u64) {
        let decision = {
            let mut state = self.state.lock();
            if !state.is_current(generation) || !state.opt_in_active {
                OptInClose::Stale
            } else {
                state.opt_in_active = false;

                let connected: Vec<PlayerId> = state
                    .participants
                    .iter()
                    .copied()
                    .filter(|id| self.lobby.resolve(*id).is_some())
                    .collect();
                state.participants = connected.iter().copied().collect();

                if connected.is_empty() || connected.len() < self.settings.min_participants {
                    state.last_game_end = Some(Instant::now());
                    OptInClose::Cancelled {
                        players: connected.len(),
                    }
                } else {
                    let carrier = connected[self.rng.lock().gen_range(0..connected.len())];
                    state.carrier = Some(carrier);
                    state.game_active = true;
                    OptInClose::Promoted {
                        carrier,
                        players: connected.len(),
                    }
                }
            }
        };

        match decision {
            OptInClose::Stale => {
                debug!(generation, "Ignoring stale opt-in timer");
            }
            OptInClose::Cancelled { players } => {
                info!(generation, players, "Hot Potato cancelled");
                self.lobby.broadcast(&format!(
                    "🥔 Hot Potato cancelled: not enough participants ({players}/{} required).",
                    self.settings.min_participants
                ));
            }
            OptInClose::Promoted { carrier, players } => {
                info!(generation, players, carrier = %carrier, "Hot Potato game started");
                let window = human_duration(self.settings.game_window);
                self.lobby.broadcast(&format!(
                    "🔥 THE HOT POTATO GAME HAS BEGUN! {players} players are in. One of them is \
                     carrying the Hot Potato... The timer has started! Avoid anyone suspicious \
                     for the next {window}!"
                ));

                match self.lobby.resolve(carrier) {
                    Some(client) => client.send_private(&format!(
                        "🥔🔥 YOU have the Hot Potato! Try to be in the same area as other \
                         participants when the timer expires. You have {window}!"
                    )),
                    None => warn!(carrier = %carrier, "Carrier left before being told"),
                }

                let game = Arc::clone(self);
                let wait = self.settings.game_window;
                tokio::spawn(async move {
                    tokio::time::sleep(wait).await;
                    game.resolve_game(generation);
                });
            }
        }
    }

    fn resolve_game(&self, generation: u64) {
        let snapshot = {
            let mut state = self.state.lock();
            if !state.is_current(generation) || !state.game_active {
                debug!(generation, "Ignoring stale game timer");
                return;
            }

            state.game_active = false;
            state.opt_in_active = false;
            state.last_game_end = Some(Instant::now());

            match state.carrier.take() {
                Some(carrier) => GameSnapshot {
                    carrier,
                    participants: state.participants.clone(),
                },
                None => {
                    warn!(generation, "Active game had no carrier");
                    return;
                }
            }
        };

        let resolution = Resolution::evaluate(self.lobby.as_ref(), &snapshot);

        info!(
            generation,
            carrier = %snapshot.carrier,
            affected = resolution.affected.len(),
            outcome = ?resolution.outcome,
            "Hot Potato resolved"
        );

        match resolution.outcome {
            Outcome::CarrierAlone => self.punish_carrier(resolution.carrier.as_deref()),
            Outcome::MassEjection => self.eject_all(snapshot.carrier, &resolution.affected),
            Outcome::MassPunishment => self.punish_all(snapshot.carrier, &resolution.affected),
        }
    }

    fn punish_carrier(&self, carrier: Option<&L::Client>) {
        self.lobby.broadcast(
            "⏰ HOT POTATO TIMER EXPIRED! The carrier was alone, so they get punished! 🥔💀",
        );

        let Some(carrier) = carrier else {
            return;
        };

        let kind = self.draw_punishment();
        carrier.apply_punishment(
            kind,
            self.settings.punishment_duration,
            "Hot Potato: solo carrier penalty",
        );
        carrier.send_private(&format!(
            "💀 You had the Hot Potato and nobody was nearby. You've been punished with '{kind}'!"
        ));
        self.lobby.record_history(
            carrier.id(),
            &format!("Carrier self-punished with {kind} (no victims)"),
        );
    }

    fn eject_all(&self, carrier: PlayerId, affected: &[Arc<L::Client>]) {
        self.lobby.broadcast(&format!(
            "⏰ HOT POTATO TIMER EXPIRED! The carrier was a MODERATOR: {} participant(s) in the \
             same area are being KICKED! 🔨",
            affected.len()
        ));

        for client in affected {
            client.disconnect(
                "Hot Potato: you were caught in the same area as a moderator carrying the Hot Potato!",
            );
        }

        self.lobby.record_history(
            carrier,
            &format!("Mod carrier kicked {} participant(s)", affected.len()),
        );
    }

    fn punish_all(&self, carrier: PlayerId, affected: &[Arc<L::Client>]) {
        self.lobby.broadcast(&format!(
            "⏰ HOT POTATO TIMER EXPIRED! {} participant(s) were caught in the same area as the \
             carrier and received random punishments! 🥔💥",
            affected.len()
        ));

        let duration = human_duration(self.settings.punishment_duration);
        for client in affected {
            let kind = self.draw_punishment();
            client.apply_punishment(kind, self.settings.punishment_duration, "Hot Potato punishment");
            client.send_private(&format!(
                "💥 You were caught with the Hot Potato carrier! You've been punished with \
                 '{kind}' for {duration}."
            ));
            self.lobby.record_history(
                carrier,
                &format!("Punished UID {} with {kind}", client.id()),
            );
        }
    }

    /// Draws share the seeded RNG lock so a fixed seed replays the same punishments
    fn draw_punishment(&self) -> PunishmentKind {
        random_punishment(&mut *self.rng.lock())
    }

    fn rules(&self) -> String {
        let opt_in = human_duration(self.settings.opt_in_window);
        let game = human_duration(self.settings.game_window);
        let cooldown = human_duration(self.settings.cooldown);
        format!(
            "🥔 HOT POTATO EVENT STARTING! 🥔\n\
             Type /hotpotato accept within {opt_in} to join.\n\n\
             📋 HOW TO PLAY:\n\
             • One random participant will secretly be given the \"Hot Potato\".\n\
             • The Hot Potato carrier has a {game} virtual timer.\n\
             • AVOID being in the same area as the carrier when the timer runs out!\n\
             • When time is up, everyone opted-in who is in the same area as the carrier receives a random punishment.\n\
             • If the carrier is a MODERATOR, all participants in the same area will be KICKED from the server instead.\n\
             • If the carrier fails to share their area with anyone, THEY receive the punishment themselves.\n\
             • Players who did not opt in are completely safe and unaffected.\n\
             • Only one Hot Potato game can run at a time ({cooldown} cooldown between games).\n\n\
             Good luck, and watch who you hang around with! 🔥"
        )
    }
}
