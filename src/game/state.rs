//! Shared minigame state and the cooldown gate

use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::Instant;

use super::hot_potato::HotPotatoError;
use super::PlayerId;

/// Coarse phase, derived from the two phase flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Idle,
    OptIn,
    Active,
}

/// Everything the minigame mutates, guarded by one lock in `HotPotato`
#[derive(Debug, Default)]
pub struct GameState {
    pub opt_in_active: bool,
    pub game_active: bool,
    /// Ordered so carrier selection is reproducible for a fixed seed
    pub participants: BTreeSet<PlayerId>,
    pub carrier: Option<PlayerId>,
    pub last_game_end: Option<Instant>,
    /// Bumped on every new opt-in and every reset; deferred tasks compare it
    pub generation: u64,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GamePhase {
        if self.opt_in_active {
            GamePhase::OptIn
        } else if self.game_active {
            GamePhase::Active
        } else {
            GamePhase::Idle
        }
    }

    /// Remaining cooldown in whole seconds, or `None` when a game may start.
    ///
    /// Whole seconds are truncated and one is added, so the displayed value is
    /// never zero while the gate is closed.
    pub fn cooldown_remaining(&self, cooldown: Duration) -> Option<u64> {
        let ended = self.last_game_end?;
        let elapsed = ended.elapsed();
        if elapsed < cooldown {
            Some((cooldown - elapsed).as_secs() + 1)
        } else {
            None
        }
    }

    /// Enter the opt-in phase, returning the new generation
    pub fn begin_opt_in(&mut self, cooldown: Duration) -> Result<u64, HotPotatoError> {
        if self.opt_in_active || self.game_active {
            return Err(HotPotatoError::AlreadyRunning);
        }
        if let Some(remaining_secs) = self.cooldown_remaining(cooldown) {
            return Err(HotPotatoError::OnCooldown { remaining_secs });
        }

        self.opt_in_active = true;
        self.game_active = false;
        self.participants = BTreeSet::new();
        self.carrier = None;
        self.generation += 1;
        Ok(self.generation)
    }

    /// Register a participant, returning the new participant count
    pub fn join(&mut self, player: PlayerId) -> Result<usize, HotPotatoError> {
        if !self.opt_in_active {
            return Err(HotPotatoError::NoActiveInvite);
        }
        if !self.participants.insert(player) {
            return Err(HotPotatoError::AlreadyJoined);
        }
        Ok(self.participants.len())
    }

    /// True when a deferred task scheduled at `generation` may still act
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Abort whatever is running; pending timers become no-ops
    pub fn reset(&mut self) {
        self.opt_in_active = false;
        self.game_active = false;
        self.participants.clear();
        self.carrier = None;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    const COOLDOWN: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn no_cooldown_before_first_game() {
        let state = GameState::new();
        assert_eq!(state.cooldown_remaining(COOLDOWN), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_starts_full_and_expires() {
        let mut state = GameState::new();
        state.last_game_end = Some(Instant::now());

        let remaining = state.cooldown_remaining(COOLDOWN).expect("cooldown active");
        assert!((300..=301).contains(&remaining), "remaining = {remaining}");

        tokio::time::advance(Duration::from_millis(299_500)).await;
        assert_eq!(state.cooldown_remaining(COOLDOWN), Some(1));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(state.cooldown_remaining(COOLDOWN), None);
    }

    #[tokio::test(start_paused = true)]
    async fn begin_rejected_while_cooling_down() {
        let mut state = GameState::new();
        state.last_game_end = Some(Instant::now());
        tokio::time::advance(Duration::from_secs(60)).await;

        let err = assert_err!(state.begin_opt_in(COOLDOWN));
        assert_eq!(err, HotPotatoError::OnCooldown { remaining_secs: 241 });
        assert_eq!(state.phase(), GamePhase::Idle);
        assert_eq!(state.generation, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn begin_clears_previous_round() {
        let mut state = GameState::new();
        state.participants.insert(PlayerId(9));
        state.carrier = Some(PlayerId(9));

        let generation = assert_ok!(state.begin_opt_in(COOLDOWN));
        assert_eq!(generation, 1);
        assert!(state.participants.is_empty());
        assert_eq!(state.carrier, None);
        assert_eq!(state.phase(), GamePhase::OptIn);
    }

    #[tokio::test(start_paused = true)]
    async fn begin_rejected_in_either_phase() {
        let mut state = GameState::new();
        state.opt_in_active = true;
        assert_eq!(state.begin_opt_in(COOLDOWN), Err(HotPotatoError::AlreadyRunning));

        state.opt_in_active = false;
        state.game_active = true;
        assert_eq!(state.begin_opt_in(COOLDOWN), Err(HotPotatoError::AlreadyRunning));
        assert!(!(state.opt_in_active && state.game_active));
    }

    #[test]
    fn joining_twice_is_idempotent() {
        let mut state = GameState::new();
        state.opt_in_active = true;

        assert_eq!(state.join(PlayerId(42)), Ok(1));
        assert_eq!(state.join(PlayerId(42)), Err(HotPotatoError::AlreadyJoined));
        assert_eq!(state.participants.len(), 1);
    }

    #[test]
    fn joining_without_invite_is_rejected() {
        let mut state = GameState::new();
        assert_eq!(state.join(PlayerId(1)), Err(HotPotatoError::NoActiveInvite));

        state.game_active = true;
        assert_eq!(state.join(PlayerId(1)), Err(HotPotatoError::NoActiveInvite));
        assert!(state.participants.is_empty());
    }

    #[test]
    fn reset_invalidates_generation() {
        let mut state = GameState::new();
        state.opt_in_active = true;
        state.generation = 4;
        state.participants.insert(PlayerId(1));

        state.reset();

        assert_eq!(state.phase(), GamePhase::Idle);
        assert!(!state.is_current(4));
        assert!(state.is_current(5));
        assert!(state.participants.is_empty());
    }
}
