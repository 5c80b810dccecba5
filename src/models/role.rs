use std::fmt;

use serde::{Deserialize, Serialize};

/// The immutable variant tag of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    Villager,
    Werwolf,
    Seer,
    Witch,
    Hunter,
    Matchmaker,
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleKind::Villager => write!(f, "Villager"),
            RoleKind::Werwolf => write!(f, "Werwolf"),
            RoleKind::Seer => write!(f, "Seer"),
            RoleKind::Witch => write!(f, "Witch"),
            RoleKind::Hunter => write!(f, "Hunter"),
            RoleKind::Matchmaker => write!(f, "Matchmaker"),
        }
    }
}

/// A role instance owned by exactly one player for the whole match:
/// the variant tag plus its one-time capability charges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub kind: RoleKind,
    /// Whether the witch still holds her healing potion.
    pub can_heal: bool,
    /// Whether the witch still holds her poison.
    pub can_poison: bool,
    /// Whether the matchmaker has already paired two players.
    pub paired: bool,
}

impl Role {
    pub fn new(kind: RoleKind) -> Self {
        Role {
            kind,
            can_heal: kind == RoleKind::Witch,
            can_poison: kind == RoleKind::Witch,
            paired: false,
        }
    }
}
