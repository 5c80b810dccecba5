use std::collections::HashMap;
use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

use crate::error::{GameError, MIN_PLAYERS};
use crate::models::event::{DeathReport, GameEvent};
use crate::models::options::GameOptions;
use crate::models::player::{CauseOfDeath, Player, PlayerId};
use crate::models::role::{Role, RoleKind};
use crate::phase_action::{ActionSpec, PhaseAction};
use crate::utils::auth::{self, AuthError};

mod deaths;
mod game_loop;

pub type SessionId = u32;

const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Different states a session can be in, ordered by progression. Everything
/// past [`GameState::Locked`] means the match is running; from then on day
/// and night alternate indefinitely until the session is disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameState {
    /// The session hasn't been set up internally.
    NotInitialized,
    /// Waiting for players; the owner may start at any time.
    Preparation,
    /// The session is locked and no one can join.
    Locked,
    /// Day time: the village votes publicly.
    Day,
    /// Night time: roles act in secret.
    Night,
}

/// A whole game session. Owns the players, the phase loop and the outward
/// event channel; the unit of concurrency (one independent loop per session).
///
/// All mutation goes through the single per-session lock. At most one
/// [`PhaseAction`] is open at any instant.
pub struct GameSession {
    id: SessionId,
    password_hash: Option<String>,
    max_players: usize,
    events: broadcast::Sender<GameEvent>,
    pub(crate) inner: Mutex<SessionInner>,
}

pub(crate) struct SessionInner {
    pub(crate) state: GameState,
    /// All players in seating order.
    pub(crate) players: Vec<Player>,
    pub(crate) owner: Option<PlayerId>,
    pub(crate) mayor: Option<PlayerId>,
    /// Symmetric pairing map; a death on either side triggers heartbreak.
    pub(crate) lovers: HashMap<PlayerId, PlayerId>,
    pub(crate) options: GameOptions,
    pub(crate) running_action: Option<PhaseAction>,
    pub(crate) cancel: CancellationToken,
    game_loop: Option<JoinHandle<()>>,
    next_player_id: PlayerId,
    disposed: bool,
}

impl GameSession {
    /// Creates a fresh, not yet initialized session.
    pub fn new(
        id: SessionId,
        password: Option<&str>,
        max_players: usize,
    ) -> Result<Arc<Self>, AuthError> {
        let password_hash = match password.filter(|p| !p.is_empty()) {
            Some(password) => Some(auth::hash_password(password)?),
            None => None,
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Arc::new(GameSession {
            id,
            password_hash,
            max_players,
            events,
            inner: Mutex::new(SessionInner {
                state: GameState::NotInitialized,
                players: Vec::new(),
                owner: None,
                mayor: None,
                lovers: HashMap::new(),
                options: GameOptions::default(),
                running_action: None,
                cancel: CancellationToken::new(),
                game_loop: None,
                next_player_id: 0,
                disposed: false,
            }),
        }))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Whether joining requires a password.
    pub fn is_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Subscribes to the outward event channel of this session.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Seeds the player list with the owner and enters preparation.
    /// Also re-arms a previously disposed session.
    pub async fn initialize(&self, owner_name: &str) -> Result<(PlayerId, String), GameError> {
        let mut inner = self.inner.lock().await;
        if inner.state != GameState::NotInitialized {
            return Err(GameError::AlreadyInitialized);
        }

        inner.disposed = false;
        inner.cancel = CancellationToken::new();
        inner.players.clear();
        inner.lovers.clear();
        inner.mayor = None;

        let (owner, token) = inner.create_player(owner_name)?;
        inner.owner = Some(owner);
        inner.state = GameState::Preparation;
        self.emit_state(&inner);

        info!(
            "Game {} initialized. Owner is {} ({})",
            self.id, owner_name, owner
        );
        Ok((owner, token))
    }

    /// Checks a join attempt against the optional password commitment.
    pub async fn verify_password(&self, password: Option<&str>) -> Result<bool, GameError> {
        let inner = self.inner.lock().await;
        ensure_initialized(&inner)?;

        match &self.password_hash {
            None => Ok(true),
            Some(hash) => Ok(auth::verify_password(password.unwrap_or(""), hash)),
        }
    }

    /// Resolves a caller-supplied credential to the claimed player.
    pub async fn verify_player_token(&self, player: PlayerId, token: &str) -> bool {
        let inner = self.inner.lock().await;
        inner
            .player(player)
            .is_some_and(|p| auth::verify_token(token, &p.auth_hash))
    }

    /// Adds a player and returns their id together with the one-time
    /// credential. Capacity and name checks are the coordinator's concern.
    pub async fn add_player(&self, name: &str) -> Result<(PlayerId, String), GameError> {
        let mut inner = self.inner.lock().await;
        ensure_initialized(&inner)?;

        let (id, token) = inner.create_player(name)?;
        info!("Player {} ({}) joined game {}", name, id, self.id);
        Ok((id, token))
    }

    /// Removes a player. Removing the owner transfers ownership to the
    /// lowest-id remaining player, or tears the session down when no one
    /// is left.
    pub async fn remove_player(&self, player: PlayerId) -> Result<bool, GameError> {
        let mut inner = self.inner.lock().await;
        ensure_initialized(&inner)?;

        let Some(position) = inner.players.iter().position(|p| p.id == player) else {
            return Ok(false);
        };
        let removed = inner.players.remove(position);
        info!(
            "Player {} ({}) left game {}",
            removed.name, removed.id, self.id
        );

        if inner.owner == Some(player) {
            if let Some(new_owner) = inner.players.iter().map(|p| p.id).min() {
                inner.owner = Some(new_owner);
                self.emit(GameEvent::MetadataChanged {
                    owner: new_owner,
                    mayor: inner.mayor,
                });
                info!(
                    "Game owner left game {}. New owner {} selected",
                    self.id, new_owner
                );
            } else {
                self.dispose_locked(&mut inner);
                info!(
                    "Game owner left game {}. No one is left -> disposing session",
                    self.id
                );
            }
        }
        Ok(true)
    }

    /// Flips between preparation and locked. Returns `false` once the
    /// match has started.
    pub async fn toggle_lock(&self) -> Result<bool, GameError> {
        let mut inner = self.inner.lock().await;
        ensure_initialized(&inner)?;

        if inner.state > GameState::Locked {
            return Ok(false);
        }
        inner.state = if inner.state == GameState::Locked {
            GameState::Preparation
        } else {
            GameState::Locked
        };
        self.emit_state(&inner);
        trace!("Toggled game {} to {:?}", self.id, inner.state);
        Ok(true)
    }

    /// Randomizes the seating order. Only meaningful before the start.
    pub async fn shuffle_players(&self) -> Result<(), GameError> {
        let mut inner = self.inner.lock().await;
        ensure_initialized(&inner)?;
        inner.players.shuffle(&mut rand::thread_rng());
        Ok(())
    }

    /// Assigns roles and launches the night/day loop as an independent,
    /// cancellable task.
    pub async fn start(self: &Arc<Self>, options: GameOptions) -> Result<(), GameError> {
        options.validate()?;

        let mut inner = self.inner.lock().await;
        ensure_initialized(&inner)?;
        // The loop task advances the state on its own; the handle is the
        // authoritative started-marker under this lock.
        if inner.state > GameState::Locked || inner.game_loop.is_some() {
            return Err(GameError::AlreadyStarted);
        }
        if inner.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }

        inner.assign_roles(&options);
        inner.options = options;

        let session = Arc::clone(self);
        let cancel = inner.cancel.clone();
        inner.game_loop = Some(tokio::spawn(async move {
            game_loop::run(session, cancel).await;
        }));
        Ok(())
    }

    /// Forwards a selection to the currently open phase action. No-op
    /// (returns `false`) when none is open or the submission is invalid.
    pub async fn register_vote(&self, player: PlayerId, selection: Vec<PlayerId>) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.disposed {
            return false;
        }
        let Some(action) = inner.running_action.as_mut() else {
            return false;
        };
        if !action.submit(player, selection) {
            return false;
        }

        if action.participants.len() > 1 {
            let (tally, abstentions) = action.tally();
            let kind = action.kind;
            self.emit(GameEvent::VotesUpdated {
                kind,
                tally,
                abstentions,
            });
        }
        if action.is_complete() {
            action.signal_completion();
        }
        true
    }

    /// Cancels the loop cooperatively and invalidates all further mutation
    /// until the session is re-initialized or discarded. The loop task is
    /// not awaited; it observes the cancellation at its next await-point.
    pub async fn dispose(&self) {
        let mut inner = self.inner.lock().await;
        self.dispose_locked(&mut inner);
    }

    fn dispose_locked(&self, inner: &mut SessionInner) {
        inner.cancel.cancel();
        inner.game_loop.take();
        inner.state = GameState::NotInitialized;
        inner.disposed = true;
    }

    pub async fn state(&self) -> GameState {
        self.inner.lock().await.state
    }

    /// Snapshot of all players in seating order.
    pub async fn players(&self) -> Vec<Player> {
        self.inner.lock().await.players.clone()
    }

    pub async fn owner(&self) -> Option<PlayerId> {
        self.inner.lock().await.owner
    }

    pub async fn mayor(&self) -> Option<PlayerId> {
        self.inner.lock().await.mayor
    }

    /// Opens a phase action, suspends until it completes or the session is
    /// cancelled and interprets the outcome under the lock. Exactly one
    /// completion event is emitted per opened action; a cancelled action
    /// closes with no result.
    pub(crate) async fn request_action<F>(
        self: &Arc<Self>,
        spec: ActionSpec,
        interpret: F,
    ) -> Result<(), GameError>
    where
        F: FnOnce(&PhaseAction, &mut SessionInner) -> Option<Vec<String>>,
    {
        let (mut completion, cancel) = {
            let mut inner = self.inner.lock().await;
            if inner.disposed {
                return Err(GameError::Disposed);
            }
            debug_assert!(
                inner.running_action.is_none(),
                "only one phase action may be open per session"
            );

            let (action, completion) = PhaseAction::new(spec);
            self.emit(GameEvent::PhaseActionOpened {
                kind: action.kind,
                minimum: action.minimum,
                maximum: action.maximum,
                votable: action.votable.clone(),
                participants: action.participants.clone(),
            });
            inner.running_action = Some(action);
            (completion, inner.cancel.clone())
        };

        let cancelled = tokio::select! {
            _ = &mut completion => false,
            _ = cancel.cancelled() => true,
        };

        let mut inner = self.inner.lock().await;
        let Some(action) = inner.running_action.take() else {
            return Ok(());
        };
        let result = if cancelled {
            None
        } else {
            interpret(&action, &mut inner)
        };
        self.emit(GameEvent::PhaseActionCompleted {
            kind: action.kind,
            participants: action.participants,
            result,
        });

        if cancelled {
            Err(GameError::Disposed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn emit(&self, event: GameEvent) {
        // No receivers is fine; nobody may be listening yet.
        let _ = self.events.send(event);
    }

    fn emit_state(&self, inner: &SessionInner) {
        self.emit(GameEvent::StateChanged {
            state: inner.state,
            deaths: DeathReport::new(),
        });
    }
}

impl SessionInner {
    fn create_player(&mut self, name: &str) -> Result<(PlayerId, String), GameError> {
        let id = self.next_player_id;
        self.next_player_id += 1;
        let (token, hash) = auth::issue_token()?;
        self.players.push(Player::new(id, name.to_string(), hash));
        Ok((id, token))
    }

    pub(crate) fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn living_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_alive())
    }

    /// Marks a player for death. Only fully alive players can be marked.
    pub(crate) fn kill(&mut self, target: PlayerId, cause: CauseOfDeath) {
        if let Some(player) = self.player_mut(target) {
            if player.kill(cause) {
                trace!(
                    "Player {} ({}) was killed: {:?}",
                    player.name,
                    player.id,
                    cause
                );
            }
        }
    }

    /// Reverts a pending death (the witch's healing potion).
    pub(crate) fn revive(&mut self, target: PlayerId) {
        if let Some(player) = self.player_mut(target) {
            if player.revive() {
                trace!("Player {} ({}) was saved", player.name, player.id);
            }
        }
    }

    /// Records a symmetric love pairing.
    pub(crate) fn pair_lovers(&mut self, first: PlayerId, second: PlayerId) {
        self.lovers.insert(first, second);
        self.lovers.insert(second, first);
    }

    /// The seating neighbors immediately before and after a player,
    /// wrapping around at the ends of the seating order.
    pub(crate) fn seat_neighbors(&self, player: PlayerId) -> Option<(PlayerId, PlayerId)> {
        let count = self.players.len();
        if count < 2 {
            return None;
        }
        let position = self.players.iter().position(|p| p.id == player)?;
        let previous = self.players[(position + count - 1) % count].id;
        let next = self.players[(position + 1) % count].id;
        Some((previous, next))
    }

    /// Distributes roles over all players. The werwolf quota is taken off
    /// the shuffled seating first so it is guaranteed even under unlucky
    /// shuffles; the remaining special roles are pooled, shuffled and dealt
    /// one-to-one. Leftover players become plain villagers.
    fn assign_roles(&mut self, options: &GameOptions) {
        let mut rng = rand::thread_rng();
        let mut order: Vec<usize> = (0..self.players.len()).collect();
        order.shuffle(&mut rng);

        let werwolves = options.werwolves.min(order.len());
        for &index in &order[..werwolves] {
            self.players[index].role = Some(Role::new(RoleKind::Werwolf));
        }

        let mut pool: Vec<RoleKind> = Vec::new();
        pool.extend(std::iter::repeat(RoleKind::Seer).take(options.seers));
        pool.extend(std::iter::repeat(RoleKind::Witch).take(options.witches));
        pool.extend(std::iter::repeat(RoleKind::Hunter).take(options.hunters));
        if options.matchmaker {
            pool.push(RoleKind::Matchmaker);
        }
        pool.shuffle(&mut rng);

        for (&index, kind) in order[werwolves..].iter().zip(pool) {
            self.players[index].role = Some(Role::new(kind));
        }
        for player in &mut self.players {
            if player.role.is_none() {
                player.role = Some(Role::new(RoleKind::Villager));
            }
        }
    }
}

fn ensure_initialized(inner: &SessionInner) -> Result<(), GameError> {
    if inner.disposed {
        return Err(GameError::Disposed);
    }
    if inner.state == GameState::NotInitialized {
        return Err(GameError::NotInitialized);
    }
    Ok(())
}

impl PartialEq for GameSession {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GameSession {}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("protected", &self.is_protected())
            .finish()
    }
}
