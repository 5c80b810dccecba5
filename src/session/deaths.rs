use std::sync::Arc;

use crate::error::GameError;
use crate::models::event::{DeathRecord, DeathReport, GameEvent};
use crate::models::player::{CauseOfDeath, PlayerId, PlayerStatus};
use crate::phase_action::{ActionKind, ActionSpec};
use crate::roles;
use crate::session::{GameSession, GameState};

use super::game_loop::absorb_hook_failure;

/// Turns every pending death into a finalized one and advances the session
/// into `next_state`, emitting a single censored death report.
///
/// Runs as a fixed-point loop: on-death hooks and cascades (hunter shot,
/// exploding witch house, heartbreak) may mark further players for death,
/// which are then processed in another pass until none remain.
pub(crate) async fn resolve(
    session: &Arc<GameSession>,
    next_state: GameState,
) -> Result<(), GameError> {
    let mut report = DeathReport::new();

    loop {
        let pending: Vec<PlayerId> = {
            let inner = session.inner.lock().await;
            inner
                .players
                .iter()
                .filter(|p| p.status == PlayerStatus::PendingDeath)
                .map(|p| p.id)
                .collect()
        };
        if pending.is_empty() {
            break;
        }

        for player in pending {
            absorb_hook_failure(roles::death_hook(session, player).await)?;
            absorb_hook_failure(handle_dying_mayor(session, player).await)?;

            let mut inner = session.inner.lock().await;
            if let Some(&lover) = inner.lovers.get(&player) {
                inner.kill(lover, CauseOfDeath::Heartbreak);
            }

            let reveal_for = inner.options.reveal_role_for_causes.clone();
            let Some(victim) = inner.player_mut(player) else {
                continue;
            };
            let cause = victim.finalize_death();
            let role = victim.role_kind();
            report.insert(
                player,
                DeathRecord {
                    // Causes are never disclosed when entering the day.
                    cause: if next_state == GameState::Night {
                        cause
                    } else {
                        None
                    },
                    role: cause.filter(|c| reveal_for.contains(c)).and(role),
                },
            );
        }
    }

    let mut inner = session.inner.lock().await;
    inner.state = next_state;
    session.emit(GameEvent::StateChanged {
        state: next_state,
        deaths: report,
    });
    Ok(())
}

/// A dead mayor immediately vacates the office. When configured, the dying
/// mayor instead names a successor among the untouched players.
async fn handle_dying_mayor(session: &Arc<GameSession>, player: PlayerId) -> Result<(), GameError> {
    let (is_mayor, names_successor) = {
        let inner = session.inner.lock().await;
        (
            inner.mayor == Some(player),
            inner.options.mayor_names_successor,
        )
    };
    if !is_mayor {
        return Ok(());
    }

    if names_successor {
        let spec = {
            let inner = session.inner.lock().await;
            let votable: Vec<PlayerId> = inner
                .players
                .iter()
                .filter(|p| p.status == PlayerStatus::Alive && p.id != player)
                .map(|p| p.id)
                .collect();
            ActionSpec {
                kind: ActionKind::NextMayorChoice,
                minimum: 0,
                maximum: 1,
                votable,
                participants: vec![player],
            }
        };
        session
            .request_action(spec, |action, inner| {
                inner.mayor = action.resolve(&[]);
                session.emit(GameEvent::MetadataChanged {
                    owner: inner.owner.unwrap_or_default(),
                    mayor: inner.mayor,
                });
                None
            })
            .await
    } else {
        let mut inner = session.inner.lock().await;
        inner.mayor = None;
        session.emit(GameEvent::MetadataChanged {
            owner: inner.owner.unwrap_or_default(),
            mayor: None,
        });
        Ok(())
    }
}
