use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::models::player::PlayerId;

/// Identifies what an open phase action asks its participants for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    MatchmakerPairing,
    WerwolfAttack,
    SeerInspection,
    WitchHeal,
    WitchPoison,
    MayorElection,
    VillageExecution,
    NextMayorChoice,
    HunterShot,
}

/// Parameters for opening a phase action.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub kind: ActionKind,
    /// The minimum amount of players to select per participant.
    pub minimum: usize,
    /// The maximum amount of players to select per participant.
    pub maximum: usize,
    /// Players a selection may be drawn from.
    pub votable: Vec<PlayerId>,
    /// Players who have to answer before the action completes.
    pub participants: Vec<PlayerId>,
}

/// A synchronization point asking a set of participants to each pick some
/// players. Knows nothing about game rules; the opener interprets the
/// outcome once every participant has answered.
#[derive(Debug)]
pub struct PhaseAction {
    pub kind: ActionKind,
    pub minimum: usize,
    pub maximum: usize,
    pub votable: Vec<PlayerId>,
    pub participants: Vec<PlayerId>,
    votes: HashMap<PlayerId, Vec<PlayerId>>,
    completed: Option<oneshot::Sender<()>>,
}

impl PhaseAction {
    pub(crate) fn new(spec: ActionSpec) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let action = PhaseAction {
            kind: spec.kind,
            minimum: spec.minimum,
            maximum: spec.maximum,
            votable: spec.votable,
            participants: spec.participants,
            votes: HashMap::new(),
            completed: Some(tx),
        };
        (action, rx)
    }

    /// Records a participant's selection. Overwriting an earlier submission
    /// is permitted (last write wins). Returns `false` without any state
    /// change when the voter is no participant, the selection size is out of
    /// bounds, a selected player is not votable or appears twice.
    pub fn submit(&mut self, voter: PlayerId, selection: Vec<PlayerId>) -> bool {
        if !self.participants.contains(&voter) {
            return false;
        }
        if selection.len() < self.minimum || selection.len() > self.maximum {
            return false;
        }
        if selection.iter().any(|p| !self.votable.contains(p)) {
            return false;
        }
        if selection
            .iter()
            .enumerate()
            .any(|(i, p)| selection[i + 1..].contains(p))
        {
            return false;
        }

        self.votes.insert(voter, selection);
        true
    }

    /// Complete exactly when every participant has submitted and every
    /// submission meets the minimum size.
    pub fn is_complete(&self) -> bool {
        self.participants
            .iter()
            .all(|p| self.votes.get(p).is_some_and(|s| s.len() >= self.minimum))
    }

    /// Releases the opener awaiting this action. Fires at most once.
    pub(crate) fn signal_completion(&mut self) {
        if let Some(tx) = self.completed.take() {
            let _ = tx.send(());
        }
    }

    pub fn votes(&self) -> &HashMap<PlayerId, Vec<PlayerId>> {
        &self.votes
    }

    /// Unweighted tally snapshot plus the current abstention count.
    pub fn tally(&self) -> (HashMap<PlayerId, u32>, u32) {
        let mut tally: HashMap<PlayerId, u32> = HashMap::new();
        let mut abstentions = 0;
        for selection in self.votes.values() {
            if selection.is_empty() {
                abstentions += 1;
            }
            for target in selection {
                *tally.entry(*target).or_default() += 1;
            }
        }
        (tally, abstentions)
    }

    /// Tallies all submissions into a single outcome. Voters listed in
    /// `double_weight` contribute weight 2 per selected target, everyone
    /// else weight 1; an empty selection feeds the abstain tally instead.
    /// Yields `None` (no consensus) when more than one target ties for the
    /// highest tally or the abstain tally reaches it.
    pub fn resolve(&self, double_weight: &[PlayerId]) -> Option<PlayerId> {
        let mut tally: HashMap<PlayerId, u32> = HashMap::new();
        let mut abstain = 0u32;
        for (voter, selection) in &self.votes {
            let weight = if double_weight.contains(voter) { 2 } else { 1 };
            if selection.is_empty() {
                abstain += weight;
            }
            for target in selection {
                *tally.entry(*target).or_default() += weight;
            }
        }

        let best = tally.values().copied().max()?;
        if abstain >= best {
            return None;
        }
        let mut top = tally.iter().filter(|(_, count)| **count == best);
        let winner = *top.next()?.0;
        if top.next().is_some() {
            return None;
        }
        Some(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(minimum: usize, maximum: usize, votable: &[u32], participants: &[u32]) -> PhaseAction {
        let (action, _rx) = PhaseAction::new(ActionSpec {
            kind: ActionKind::VillageExecution,
            minimum,
            maximum,
            votable: votable.to_vec(),
            participants: participants.to_vec(),
        });
        action
    }

    #[test]
    fn rejects_submissions_outside_bounds() {
        let mut action = action(1, 1, &[1, 2, 3], &[1, 2, 3]);
        assert!(!action.submit(1, vec![]));
        assert!(!action.submit(1, vec![2, 3]));
        assert!(action.submit(1, vec![2]));
    }

    #[test]
    fn rejects_non_votable_and_duplicate_selections() {
        let mut action = action(0, 2, &[1, 2], &[1, 2]);
        assert!(!action.submit(1, vec![4]));
        assert!(!action.submit(1, vec![2, 2]));
        assert!(action.submit(1, vec![1, 2]));
    }

    #[test]
    fn rejects_non_participants() {
        let mut action = action(0, 1, &[1, 2, 3], &[1, 2]);
        assert!(!action.submit(3, vec![1]));
        assert!(action.votes().is_empty());
    }

    #[test]
    fn overwriting_a_submission_wins() {
        let mut action = action(0, 1, &[1, 2, 3], &[1]);
        assert!(action.submit(1, vec![2]));
        assert!(action.submit(1, vec![3]));
        assert_eq!(action.votes()[&1], vec![3]);
    }

    #[test]
    fn completes_only_when_everyone_meets_the_minimum() {
        let mut action = action(1, 1, &[1, 2, 3], &[1, 2]);
        assert!(!action.is_complete());
        action.submit(1, vec![3]);
        assert!(!action.is_complete());
        action.submit(2, vec![3]);
        assert!(action.is_complete());
    }

    #[test]
    fn zero_minimum_counts_abstentions_as_answers() {
        let mut action = action(0, 1, &[1, 2], &[1, 2]);
        action.submit(1, vec![]);
        action.submit(2, vec![]);
        assert!(action.is_complete());
    }

    #[test]
    fn resolves_to_the_strict_majority() {
        let mut action = action(0, 1, &[1, 2, 3], &[1, 2, 3]);
        action.submit(1, vec![3]);
        action.submit(2, vec![3]);
        action.submit(3, vec![1]);
        assert_eq!(action.resolve(&[]), Some(3));
    }

    #[test]
    fn ties_yield_no_consensus() {
        let mut action = action(0, 1, &[1, 2], &[1, 2]);
        action.submit(1, vec![2]);
        action.submit(2, vec![1]);
        assert_eq!(action.resolve(&[]), None);
    }

    #[test]
    fn abstentions_can_block_the_outcome() {
        let mut action = action(0, 1, &[1, 2, 3], &[1, 2, 3]);
        action.submit(1, vec![3]);
        action.submit(2, vec![]);
        action.submit(3, vec![]);
        assert_eq!(action.resolve(&[]), None);
    }

    #[test]
    fn double_weight_breaks_a_tie() {
        let mut action = action(0, 1, &[1, 2, 3], &[1, 2, 3]);
        action.submit(1, vec![2]);
        action.submit(2, vec![1]);
        action.submit(3, vec![]);
        assert_eq!(action.resolve(&[1]), Some(2));
    }

    #[test]
    fn resolve_without_any_votes_yields_no_consensus() {
        let action = action(0, 1, &[1, 2], &[1, 2]);
        assert_eq!(action.resolve(&[]), None);
    }
}
