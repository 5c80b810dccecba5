use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::models::player::CauseOfDeath;
use crate::models::role::RoleKind;

/// Immutable rule configuration supplied when a match is started.
///
/// Role counts do not have to sum up to the player count: any player left
/// without a role from the pool becomes a plain villager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOptions {
    pub werwolves: usize,
    pub seers: usize,
    pub witches: usize,
    pub hunters: usize,
    /// Whether a single matchmaker takes part in the match.
    pub matchmaker: bool,
    /// When enabled the witch's house explodes on her death and takes her
    /// seating neighbors with her.
    pub exploding_witch_home: bool,
    /// When enabled a dying hunter has to shoot someone.
    pub hunter_must_kill: bool,
    /// When enabled a dying mayor hands the office over to a player of
    /// their choice instead of simply vacating it.
    pub mayor_names_successor: bool,
    /// The order in which role night actions are executed.
    pub night_execution_order: Vec<RoleKind>,
    /// Causes of death for which the victim's true role is disclosed.
    pub reveal_role_for_causes: Vec<CauseOfDeath>,
}

impl Default for GameOptions {
    fn default() -> Self {
        GameOptions {
            werwolves: 1,
            seers: 0,
            witches: 1,
            hunters: 0,
            matchmaker: true,
            exploding_witch_home: false,
            hunter_must_kill: false,
            mayor_names_successor: true,
            night_execution_order: vec![
                RoleKind::Matchmaker,
                RoleKind::Werwolf,
                RoleKind::Seer,
                RoleKind::Witch,
            ],
            reveal_role_for_causes: vec![CauseOfDeath::Execution, CauseOfDeath::HouseExplosion],
        }
    }
}

impl GameOptions {
    /// Basic consistency check. Anything beyond this is the caller's concern.
    pub fn validate(&self) -> Result<(), GameError> {
        for (i, kind) in self.night_execution_order.iter().enumerate() {
            if self.night_execution_order[i + 1..].contains(kind) {
                return Err(GameError::InvalidOptions(format!(
                    "duplicate entry {kind} in the night execution order"
                )));
            }
        }
        Ok(())
    }
}

/// Server-side lobby limits consumed by the coordinator, not by the
/// session loop itself.
#[derive(Debug, Clone)]
pub struct LobbyOptions {
    pub max_players: usize,
    /// Whether listing all running sessions is permitted.
    pub allow_view_all: bool,
}

impl Default for LobbyOptions {
    fn default() -> Self {
        LobbyOptions {
            max_players: 9,
            allow_view_all: true,
        }
    }
}
