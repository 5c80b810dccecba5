//! Role behavior dispatch: every role variant implements up to three hooks
//! (night, day, death), default no-op. The werwolves' night action is a
//! joint session-level action and therefore driven by the game loop, not
//! dispatched here.

use std::sync::Arc;

use crate::error::GameError;
use crate::models::player::PlayerId;
use crate::models::role::RoleKind;
use crate::session::GameSession;

mod hunter;
mod matchmaker;
mod seer;
mod witch;

pub(crate) async fn night_hook(
    session: &Arc<GameSession>,
    player: PlayerId,
) -> Result<(), GameError> {
    match role_kind_of(session, player).await {
        Some(RoleKind::Seer) => seer::on_night(session, player).await,
        Some(RoleKind::Witch) => witch::on_night(session, player).await,
        Some(RoleKind::Matchmaker) => matchmaker::on_night(session, player).await,
        _ => Ok(()),
    }
}

/// Unused by the current roles; reserved extension point.
pub(crate) async fn day_hook(
    _session: &Arc<GameSession>,
    _player: PlayerId,
) -> Result<(), GameError> {
    Ok(())
}

/// Fires while a player transitions toward death, before finalization.
pub(crate) async fn death_hook(
    session: &Arc<GameSession>,
    player: PlayerId,
) -> Result<(), GameError> {
    match role_kind_of(session, player).await {
        Some(RoleKind::Hunter) => hunter::on_death(session, player).await,
        Some(RoleKind::Witch) => witch::on_death(session, player).await,
        _ => Ok(()),
    }
}

async fn role_kind_of(session: &Arc<GameSession>, player: PlayerId) -> Option<RoleKind> {
    let inner = session.inner.lock().await;
    inner.player(player).and_then(|p| p.role_kind())
}
