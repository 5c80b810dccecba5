use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::GameError;
use crate::models::event::{DeathReport, GameEvent};
use crate::models::player::{CauseOfDeath, PlayerId};
use crate::models::role::RoleKind;
use crate::phase_action::{ActionKind, ActionSpec};
use crate::roles;
use crate::session::{GameSession, GameState};

/// Drives one session through its endless night/day alternation until the
/// cancellation token fires. Match-end detection is deliberately not part
/// of the loop; disposing the session is the only way out.
pub(crate) async fn run(session: Arc<GameSession>, cancel: CancellationToken) {
    {
        let mut inner = session.inner.lock().await;
        inner.state = GameState::Night;
        session.emit(GameEvent::StateChanged {
            state: GameState::Night,
            deaths: DeathReport::new(),
        });
        info!(
            "Game {} started with {} players",
            session.id(),
            inner.players.len()
        );
    }

    while !cancel.is_cancelled() {
        if run_night(&session).await.is_err() {
            break;
        }
        if super::deaths::resolve(&session, GameState::Day).await.is_err() {
            break;
        }
        if run_day(&session).await.is_err() {
            break;
        }
        if super::deaths::resolve(&session, GameState::Night).await.is_err() {
            break;
        }
    }
    info!("Game loop of game {} ended", session.id());
}

/// Lets every living player act in the configured night execution order.
/// The werwolves act exactly once as one joint action.
async fn run_night(session: &Arc<GameSession>) -> Result<(), GameError> {
    let schedule = {
        let inner = session.inner.lock().await;
        let order = &inner.options.night_execution_order;
        let mut acting: Vec<(PlayerId, RoleKind)> = inner
            .living_players()
            .filter_map(|p| p.role_kind().map(|kind| (p.id, kind)))
            .collect();
        acting.sort_by_key(|(_, kind)| {
            order
                .iter()
                .position(|entry| entry == kind)
                .map_or(-1, |index| index as isize)
        });
        acting
    };

    let mut werwolves_acted = false;
    for (player, kind) in schedule {
        let still_alive = {
            let inner = session.inner.lock().await;
            inner.player(player).is_some_and(|p| p.is_alive())
        };
        if !still_alive {
            continue;
        }

        if kind == RoleKind::Werwolf {
            // One joint multi-participant action, not a per-wolf hook.
            if werwolves_acted {
                continue;
            }
            werwolves_acted = true;
            absorb_hook_failure(run_werwolf_attack(session).await)?;
        } else {
            absorb_hook_failure(roles::night_hook(session, player).await)?;
        }
    }
    Ok(())
}

/// All living werwolves vote on a shared allow-list that excludes
/// themselves; the resolved target is marked for death.
async fn run_werwolf_attack(session: &Arc<GameSession>) -> Result<(), GameError> {
    let spec = {
        let inner = session.inner.lock().await;
        let werwolves: Vec<PlayerId> = inner
            .living_players()
            .filter(|p| p.role_kind() == Some(RoleKind::Werwolf))
            .map(|p| p.id)
            .collect();
        if werwolves.is_empty() {
            return Ok(());
        }
        let votable: Vec<PlayerId> = inner
            .living_players()
            .filter(|p| !werwolves.contains(&p.id))
            .map(|p| p.id)
            .collect();
        ActionSpec {
            kind: ActionKind::WerwolfAttack,
            minimum: 1,
            maximum: 1,
            votable,
            participants: werwolves,
        }
    };

    session
        .request_action(spec, |action, inner| match action.resolve(&[]) {
            Some(victim) => {
                let name = inner
                    .player(victim)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                inner.kill(victim, CauseOfDeath::WerwolfAttack);
                Some(vec![name])
            }
            // An empty result signals that no one was chosen.
            None => Some(Vec::new()),
        })
        .await
}

/// Mayor election (only while the office is vacant), the village execution
/// vote with the mayor's submission double-weighted, then the day hooks of
/// all scheduled roles.
async fn run_day(session: &Arc<GameSession>) -> Result<(), GameError> {
    let (needs_mayor, living) = {
        let inner = session.inner.lock().await;
        let living: Vec<PlayerId> = inner.living_players().map(|p| p.id).collect();
        (inner.mayor.is_none(), living)
    };

    if needs_mayor {
        let spec = ActionSpec {
            kind: ActionKind::MayorElection,
            minimum: 0,
            maximum: 1,
            votable: living.clone(),
            participants: living.clone(),
        };
        absorb_hook_failure(
            session
                .request_action(spec, |action, inner| {
                    if let Some(new_mayor) = action.resolve(&[]) {
                        inner.mayor = Some(new_mayor);
                        session.emit(GameEvent::MetadataChanged {
                            owner: inner.owner.unwrap_or_default(),
                            mayor: inner.mayor,
                        });
                        let name = inner
                            .player(new_mayor)
                            .map(|p| p.name.clone())
                            .unwrap_or_default();
                        info!("Game {}: {} was elected mayor", session.id(), name);
                        Some(vec![name])
                    } else {
                        Some(Vec::new())
                    }
                })
                .await,
        )?;
    }

    let living: Vec<PlayerId> = {
        let inner = session.inner.lock().await;
        inner.living_players().map(|p| p.id).collect()
    };
    let spec = ActionSpec {
        kind: ActionKind::VillageExecution,
        minimum: 0,
        maximum: 1,
        votable: living.clone(),
        participants: living,
    };
    absorb_hook_failure(
        session
            .request_action(spec, |action, inner| {
                let double_weight: Vec<PlayerId> = inner.mayor.into_iter().collect();
                if let Some(victim) = action.resolve(&double_weight) {
                    inner.kill(victim, CauseOfDeath::Execution);
                }
                None
            })
            .await,
    )?;

    // Reserved extension point; no current role acts during the day.
    let schedule = {
        let inner = session.inner.lock().await;
        let order = &inner.options.night_execution_order;
        let mut acting: Vec<(PlayerId, usize)> = inner
            .living_players()
            .filter_map(|p| {
                let kind = p.role_kind()?;
                order.iter().position(|entry| *entry == kind).map(|index| (p.id, index))
            })
            .collect();
        acting.sort_by_key(|(_, index)| *index);
        acting
    };
    for (player, _) in schedule {
        absorb_hook_failure(roles::day_hook(session, player).await)?;
    }
    Ok(())
}

/// A failing role hook must not terminate the session: log it and treat
/// the in-flight action as having produced no result. Cancellation is the
/// only error that unwinds the loop.
pub(crate) fn absorb_hook_failure(result: Result<(), GameError>) -> Result<(), GameError> {
    match result {
        Err(GameError::Disposed) => Err(GameError::Disposed),
        Err(err) => {
            warn!("role hook failed, continuing: {err}");
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}
