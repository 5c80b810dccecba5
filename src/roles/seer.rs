use std::sync::Arc;

use tracing::trace;

use crate::error::GameError;
use crate::models::player::PlayerId;
use crate::phase_action::{ActionKind, ActionSpec};
use crate::session::GameSession;

/// The seer picks one living player and privately learns their true role
/// through the action's result payload.
pub(crate) async fn on_night(
    session: &Arc<GameSession>,
    player: PlayerId,
) -> Result<(), GameError> {
    let spec = {
        let inner = session.inner.lock().await;
        let votable: Vec<PlayerId> = inner
            .living_players()
            .filter(|p| p.id != player)
            .map(|p| p.id)
            .collect();
        ActionSpec {
            kind: ActionKind::SeerInspection,
            minimum: 1,
            maximum: 1,
            votable,
            participants: vec![player],
        }
    };

    session
        .request_action(spec, |action, inner| {
            let target = action.resolve(&[])?;
            let seen = inner.player(target)?;
            let role = seen.role_kind()?;
            trace!(
                "Seer ({}) saw role of {} ({}): {}",
                player,
                seen.name,
                seen.id,
                role
            );
            Some(vec![seen.name.clone(), role.to_string()])
        })
        .await
}
