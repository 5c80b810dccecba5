use serde::{Deserialize, Serialize};

use super::role::{Role, RoleKind};

pub type PlayerId = u32;

/// The status a player is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerStatus {
    /// The player is normally alive.
    Alive,
    /// The player was selected by someone (werwolf, witch, ...) to die
    /// but the death is not finalized yet.
    PendingDeath,
    /// The player is dead for the rest of the match.
    Dead,
}

/// Why a player died. Absence of a cause is modeled as `Option<CauseOfDeath>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CauseOfDeath {
    /// Torn apart by the werwolves during the night.
    WerwolfAttack,
    /// Executed by the village vote during the day.
    Execution,
    /// Poisoned by the witch.
    WitchPoison,
    /// Died in the explosion of the witch's house.
    HouseExplosion,
    /// Shot by a dying hunter.
    HunterShot,
    /// Died of heartbreak after the loved one's death.
    Heartbreak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Only `None` while the match hasn't started yet.
    pub role: Option<Role>,
    pub status: PlayerStatus,
    #[serde(skip)]
    pub(crate) pending_cause: Option<CauseOfDeath>,
    /// bcrypt hash of the secret credential handed out on join.
    #[serde(skip)]
    pub(crate) auth_hash: String,
}

impl Player {
    pub(crate) fn new(id: PlayerId, name: String, auth_hash: String) -> Self {
        Player {
            id,
            name,
            role: None,
            status: PlayerStatus::Alive,
            pending_cause: None,
            auth_hash,
        }
    }

    /// Whether this player can still be selected or act. Players who are
    /// merely marked for death count as alive until finalization.
    pub fn is_alive(&self) -> bool {
        self.status != PlayerStatus::Dead
    }

    pub fn role_kind(&self) -> Option<RoleKind> {
        self.role.as_ref().map(|r| r.kind)
    }

    /// Marks the player for death. No-op unless the player is fully alive.
    pub(crate) fn kill(&mut self, cause: CauseOfDeath) -> bool {
        if self.status != PlayerStatus::Alive {
            return false;
        }
        self.status = PlayerStatus::PendingDeath;
        self.pending_cause = Some(cause);
        true
    }

    /// Reverts a pending death (witch's healing potion).
    pub(crate) fn revive(&mut self) -> bool {
        if self.status != PlayerStatus::PendingDeath {
            return false;
        }
        self.status = PlayerStatus::Alive;
        self.pending_cause = None;
        true
    }

    /// Finalizes a pending death and extracts the stored cause.
    pub(crate) fn finalize_death(&mut self) -> Option<CauseOfDeath> {
        self.status = PlayerStatus::Dead;
        self.pending_cause.take()
    }
}
