//! Game-end resolution: who is caught, and what happens to them

use std::collections::BTreeSet;
use std::sync::Arc;

use super::{Lobby, Participant, PlayerId};

/// Copy of the state taken under the lock when the active phase ends
#[derive(Debug, Clone)]
pub struct GameSnapshot {
    pub carrier: PlayerId,
    pub participants: BTreeSet<PlayerId>,
}

/// Which consequence fires. Exactly one per completed game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nobody shared the carrier's area; the carrier pays
    CarrierAlone,
    /// Carrier holds authority; everyone caught is disconnected
    MassEjection,
    /// Everyone caught gets their own random punishment
    MassPunishment,
}

impl Outcome {
    pub fn decide(affected_count: usize, carrier_has_authority: bool) -> Self {
        if affected_count == 0 {
            Outcome::CarrierAlone
        } else if carrier_has_authority {
            Outcome::MassEjection
        } else {
            Outcome::MassPunishment
        }
    }
}

/// Live view of a snapshot, resolved against currently connected clients
pub struct Resolution<C> {
    /// `None` when the carrier disconnected before the timer ran out
    pub carrier: Option<Arc<C>>,
    pub affected: Vec<Arc<C>>,
    pub outcome: Outcome,
}

impl<C: Participant> Resolution<C> {
    /// Evaluate areas as they are now, not where players were at promotion.
    pub fn evaluate<L>(lobby: &L, snapshot: &GameSnapshot) -> Self
    where
        L: Lobby<Client = C>,
    {
        let carrier = lobby.resolve(snapshot.carrier);

        let affected: Vec<Arc<C>> = match &carrier {
            Some(carrier_client) => {
                let carrier_area = carrier_client.area();
                snapshot
                    .participants
                    .iter()
                    .filter(|id| **id != snapshot.carrier)
                    .filter_map(|id| lobby.resolve(*id))
                    .filter(|client| client.area() == carrier_area)
                    .collect()
            }
            None => Vec::new(),
        };

        let carrier_has_authority = carrier.as_ref().is_some_and(|c| c.has_authority());
        let outcome = Outcome::decide(affected.len(), carrier_has_authority);

        Self {
            carrier,
            affected,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::FakeLobby;
    use crate::game::AreaId;

    fn snapshot(carrier: u32, participants: &[u32]) -> GameSnapshot {
        GameSnapshot {
            carrier: PlayerId(carrier),
            participants: participants.iter().copied().map(PlayerId).collect(),
        }
    }

    fn ids<C: Participant>(clients: &[Arc<C>]) -> Vec<PlayerId> {
        clients.iter().map(|c| c.id()).collect()
    }

    #[test]
    fn outcome_branches_are_exclusive() {
        assert_eq!(Outcome::decide(0, false), Outcome::CarrierAlone);
        assert_eq!(Outcome::decide(0, true), Outcome::CarrierAlone);
        assert_eq!(Outcome::decide(3, true), Outcome::MassEjection);
        assert_eq!(Outcome::decide(1, false), Outcome::MassPunishment);
    }

    #[test]
    fn carrier_is_never_in_its_own_affected_set() {
        let lobby = FakeLobby::new();
        lobby.connect(1, AreaId(0), false);
        lobby.connect(2, AreaId(0), false);

        let resolution = Resolution::evaluate(&lobby, &snapshot(1, &[1, 2]));

        assert_eq!(ids(&resolution.affected), vec![PlayerId(2)]);
        assert_eq!(resolution.outcome, Outcome::MassPunishment);
    }

    #[test]
    fn only_co_located_participants_are_affected() {
        let lobby = FakeLobby::new();
        lobby.connect(1, AreaId(2), false);
        lobby.connect(2, AreaId(2), false);
        lobby.connect(3, AreaId(0), false);
        // Shares the area but never opted in
        lobby.connect(4, AreaId(2), false);

        let resolution = Resolution::evaluate(&lobby, &snapshot(1, &[1, 2, 3]));

        assert_eq!(ids(&resolution.affected), vec![PlayerId(2)]);
    }

    #[test]
    fn areas_are_read_at_resolution_time() {
        let lobby = FakeLobby::new();
        let carrier = lobby.connect(1, AreaId(0), false);
        let other = lobby.connect(2, AreaId(1), false);

        carrier.move_to(AreaId(3));
        other.move_to(AreaId(3));

        let resolution = Resolution::evaluate(&lobby, &snapshot(1, &[1, 2]));
        assert_eq!(ids(&resolution.affected), vec![PlayerId(2)]);
    }

    #[test]
    fn disconnected_participants_are_skipped() {
        let lobby = FakeLobby::new();
        lobby.connect(1, AreaId(0), false);
        lobby.connect(2, AreaId(0), false);

        let resolution = Resolution::evaluate(&lobby, &snapshot(1, &[1, 2, 3]));
        assert_eq!(ids(&resolution.affected), vec![PlayerId(2)]);
    }

    #[test]
    fn unreachable_carrier_affects_nobody() {
        let lobby = FakeLobby::new();
        lobby.connect(2, AreaId(0), false);
        lobby.connect(3, AreaId(0), false);

        let resolution = Resolution::evaluate(&lobby, &snapshot(1, &[1, 2, 3]));

        assert!(resolution.carrier.is_none());
        assert!(resolution.affected.is_empty());
        assert_eq!(resolution.outcome, Outcome::CarrierAlone);
    }

    #[test]
    fn authority_carrier_with_company_ejects() {
        let lobby = FakeLobby::new();
        lobby.connect(1, AreaId(0), true);
        lobby.connect(2, AreaId(0), false);

        let resolution = Resolution::evaluate(&lobby, &snapshot(1, &[1, 2]));
        assert_eq!(resolution.outcome, Outcome::MassEjection);
    }
}
