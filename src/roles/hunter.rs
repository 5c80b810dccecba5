use std::sync::Arc;

use crate::error::GameError;
use crate::models::player::{CauseOfDeath, PlayerId, PlayerStatus};
use crate::phase_action::{ActionKind, ActionSpec};
use crate::session::GameSession;

/// A dying hunter fires one last shot. Whether the shot may be withheld
/// depends on the session options.
pub(crate) async fn on_death(
    session: &Arc<GameSession>,
    player: PlayerId,
) -> Result<(), GameError> {
    let spec = {
        let inner = session.inner.lock().await;
        let votable: Vec<PlayerId> = inner
            .players
            .iter()
            .filter(|p| p.status == PlayerStatus::Alive && p.id != player)
            .map(|p| p.id)
            .collect();
        if votable.is_empty() {
            return Ok(());
        }
        ActionSpec {
            kind: ActionKind::HunterShot,
            minimum: usize::from(inner.options.hunter_must_kill),
            maximum: 1,
            votable,
            participants: vec![player],
        }
    };

    session
        .request_action(spec, |action, inner| {
            let victim = action.resolve(&[])?;
            let name = inner.player(victim).map(|p| p.name.clone())?;
            inner.kill(victim, CauseOfDeath::HunterShot);
            Some(vec![name])
        })
        .await
}
