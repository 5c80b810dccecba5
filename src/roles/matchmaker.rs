use std::sync::Arc;

use tracing::trace;

use crate::error::GameError;
use crate::models::player::{PlayerId, PlayerStatus};
use crate::phase_action::{ActionKind, ActionSpec};
use crate::session::GameSession;

/// In their one-and-only acting night the matchmaker pairs two players
/// (possibly including themselves) as lovers.
pub(crate) async fn on_night(
    session: &Arc<GameSession>,
    player: PlayerId,
) -> Result<(), GameError> {
    let spec = {
        let inner = session.inner.lock().await;
        let already_paired = inner
            .player(player)
            .and_then(|p| p.role.as_ref())
            .map_or(true, |role| role.paired);
        if already_paired {
            return Ok(());
        }
        // Players already marked for death cannot be paired.
        let votable: Vec<PlayerId> = inner
            .players
            .iter()
            .filter(|p| p.status == PlayerStatus::Alive)
            .map(|p| p.id)
            .collect();
        ActionSpec {
            kind: ActionKind::MatchmakerPairing,
            minimum: 2,
            maximum: 2,
            votable,
            participants: vec![player],
        }
    };

    session
        .request_action(spec, |action, inner| {
            let selection = action.votes().get(&player)?;
            let (&first, &second) = (selection.first()?, selection.get(1)?);
            inner.pair_lovers(first, second);
            if let Some(role) = inner.player_mut(player).and_then(|p| p.role.as_mut()) {
                role.paired = true;
            }
            trace!("Matchmaker ({player}) paired {first} and {second}");
            None
        })
        .await
}
