use std::sync::Arc;

use tracing::trace;

use crate::error::GameError;
use crate::models::player::{CauseOfDeath, PlayerId, PlayerStatus};
use crate::phase_action::{ActionKind, ActionSpec};
use crate::session::GameSession;

/// The witch acts last and sees the night's victims as pending deaths.
/// She may spend her single healing potion to revert one of them, then
/// her single poison to mark any other living player.
pub(crate) async fn on_night(
    session: &Arc<GameSession>,
    player: PlayerId,
) -> Result<(), GameError> {
    let (can_heal, can_poison) = {
        let inner = session.inner.lock().await;
        match inner.player(player).and_then(|p| p.role.as_ref()) {
            Some(role) => (role.can_heal, role.can_poison),
            None => return Ok(()),
        }
    };

    if can_heal {
        offer_heal(session, player).await?;
    }
    if can_poison {
        offer_poison(session, player).await?;
    }
    Ok(())
}

async fn offer_heal(session: &Arc<GameSession>, player: PlayerId) -> Result<(), GameError> {
    let spec = {
        let inner = session.inner.lock().await;
        let dying: Vec<PlayerId> = inner
            .players
            .iter()
            .filter(|p| p.status == PlayerStatus::PendingDeath)
            .map(|p| p.id)
            .collect();
        // Nothing to revert, nothing to offer.
        if dying.is_empty() {
            return Ok(());
        }
        ActionSpec {
            kind: ActionKind::WitchHeal,
            minimum: 0,
            maximum: 1,
            votable: dying,
            participants: vec![player],
        }
    };

    session
        .request_action(spec, |action, inner| {
            if let Some(target) = action.resolve(&[]) {
                inner.revive(target);
                if let Some(role) = inner.player_mut(player).and_then(|p| p.role.as_mut()) {
                    role.can_heal = false;
                }
                trace!("Witch ({player}) used her healing potion on {target}");
            }
            None
        })
        .await
}

async fn offer_poison(session: &Arc<GameSession>, player: PlayerId) -> Result<(), GameError> {
    let spec = {
        let inner = session.inner.lock().await;
        let votable: Vec<PlayerId> = inner
            .living_players()
            .filter(|p| p.id != player)
            .map(|p| p.id)
            .collect();
        ActionSpec {
            kind: ActionKind::WitchPoison,
            minimum: 0,
            maximum: 1,
            votable,
            participants: vec![player],
        }
    };

    session
        .request_action(spec, |action, inner| {
            if let Some(target) = action.resolve(&[]) {
                inner.kill(target, CauseOfDeath::WitchPoison);
                if let Some(role) = inner.player_mut(player).and_then(|p| p.role.as_mut()) {
                    role.can_poison = false;
                }
                trace!("Witch ({player}) poisoned {target}");
            }
            None
        })
        .await
}

/// A dying witch may take her seating neighbors with her when her home
/// is configured to explode.
pub(crate) async fn on_death(
    session: &Arc<GameSession>,
    player: PlayerId,
) -> Result<(), GameError> {
    let mut inner = session.inner.lock().await;
    if !inner.options.exploding_witch_home {
        return Ok(());
    }
    if let Some((previous, next)) = inner.seat_neighbors(player) {
        inner.kill(previous, CauseOfDeath::HouseExplosion);
        inner.kill(next, CauseOfDeath::HouseExplosion);
    }
    Ok(())
}
