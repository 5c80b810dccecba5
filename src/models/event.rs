use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::player::{CauseOfDeath, PlayerId};
use crate::models::role::RoleKind;
use crate::phase_action::ActionKind;
use crate::session::GameState;

/// What a single finalized death looks like from the outside. Both fields
/// are censored independently: the cause is only ever disclosed when
/// transitioning into night, the role only when the true cause is part of
/// the configured reveal-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathRecord {
    pub cause: Option<CauseOfDeath>,
    pub role: Option<RoleKind>,
}

/// All deaths finalized during one day/night transition.
pub type DeathReport = HashMap<PlayerId, DeathRecord>;

/// Events pushed outward by a session, consumed by the coordinator for
/// delivery to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GameEvent {
    /// The game owner or the mayor changed.
    MetadataChanged {
        owner: PlayerId,
        mayor: Option<PlayerId>,
    },
    /// The session entered a new state together with everyone who died
    /// during the previous one.
    StateChanged {
        state: GameState,
        deaths: DeathReport,
    },
    /// One or more players are requested to make a selection.
    PhaseActionOpened {
        kind: ActionKind,
        minimum: usize,
        maximum: usize,
        votable: Vec<PlayerId>,
        participants: Vec<PlayerId>,
    },
    /// A previously opened action closed. `result` carries display
    /// parameters; `None` means nothing should be shown.
    PhaseActionCompleted {
        kind: ActionKind,
        participants: Vec<PlayerId>,
        result: Option<Vec<String>>,
    },
    /// Tally snapshot of the open action. Only emitted for actions with
    /// more than one participant.
    VotesUpdated {
        kind: ActionKind,
        tally: HashMap<PlayerId, u32>,
        abstentions: u32,
    },
}
