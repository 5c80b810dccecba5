use std::sync::Arc;

use rand::Rng;
use tracing::info;

use crate::error::GameError;
use crate::models::options::LobbyOptions;
use crate::models::player::PlayerId;
use crate::session::{GameSession, SessionId};
use crate::store::{InMemorySessionStore, SessionStore};
use crate::utils::auth::AuthError;

const MAX_PLAYER_NAME_LENGTH: usize = 32;

/// Errors raised at the lobby boundary, before a request ever reaches a
/// session's own state machine.
#[derive(Debug, thiserror::Error)]
pub enum GameManagerError {
    #[error("the player name is empty, too long or already taken")]
    InvalidPlayerName,
    #[error("wrong password")]
    WrongPassword,
    #[error("the game is full")]
    SessionFull,
    #[error("no game with that id exists")]
    SessionNotFound,
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// The lobby-level coordinator: creates sessions under fresh ids, checks
/// join attempts against password, capacity and name rules and hands out
/// session handles. Everything in-match is the session's own business.
pub struct GameManager {
    store: Arc<dyn SessionStore>,
    lobby: LobbyOptions,
}

impl GameManager {
    pub fn new(lobby: LobbyOptions) -> Self {
        GameManager {
            store: Arc::new(InMemorySessionStore::new()),
            lobby,
        }
    }

    /// Builds a coordinator on top of a caller-supplied store backend.
    pub fn with_store(store: Arc<dyn SessionStore>, lobby: LobbyOptions) -> Self {
        GameManager { store, lobby }
    }

    /// Creates and initializes a session under a fresh six-digit id and
    /// seats the creator as its owner. Returns the session handle together
    /// with the owner's id and one-time credential.
    pub async fn create_game(
        &self,
        owner_name: &str,
        password: Option<&str>,
    ) -> Result<(Arc<GameSession>, PlayerId, String), GameManagerError> {
        if !is_player_name_valid(owner_name) {
            return Err(GameManagerError::InvalidPlayerName);
        }

        let session = loop {
            let id: SessionId = rand::thread_rng().gen_range(100_000..1_000_000);
            let session = GameSession::new(id, password, self.lobby.max_players)?;
            // add() re-checks under the store lock, so a lost race simply
            // rolls another id.
            if self.store.add(Arc::clone(&session)).await {
                break session;
            }
        };

        let (owner, token) = session.initialize(owner_name).await?;
        info!("Created game {}", session.id());
        Ok((session, owner, token))
    }

    /// Admits a player into a running lobby. Fails on a wrong password, a
    /// full or started session or an unusable name.
    pub async fn join_game(
        &self,
        id: SessionId,
        name: &str,
        password: Option<&str>,
    ) -> Result<(Arc<GameSession>, PlayerId, String), GameManagerError> {
        let session = self.get_game(id).await?;
        if !session.verify_password(password).await? {
            return Err(GameManagerError::WrongPassword);
        }

        let players = session.players().await;
        if players.len() >= session.max_players() {
            return Err(GameManagerError::SessionFull);
        }
        if !is_player_name_valid(name) || players.iter().any(|p| p.name == name) {
            return Err(GameManagerError::InvalidPlayerName);
        }

        let (player, token) = session.add_player(name).await?;
        Ok((session, player, token))
    }

    pub async fn get_game(&self, id: SessionId) -> Result<Arc<GameSession>, GameManagerError> {
        self.store
            .get(id)
            .await
            .ok_or(GameManagerError::SessionNotFound)
    }

    /// All stored sessions, or nothing when listing is disabled for this
    /// lobby.
    pub async fn list_games(&self) -> Vec<Arc<GameSession>> {
        if !self.lobby.allow_view_all {
            return Vec::new();
        }
        self.store.list_all().await
    }

    /// Disposes and unregisters a session.
    pub async fn remove_game(&self, id: SessionId) -> bool {
        if let Ok(session) = self.get_game(id).await {
            session.dispose().await;
        }
        let removed = self.store.remove(id).await;
        if removed {
            info!("Removed game {}", id);
        }
        removed
    }
}

impl Default for GameManager {
    fn default() -> Self {
        GameManager::new(LobbyOptions::default())
    }
}

/// Whether a name is usable at all. Uniqueness within a session is checked
/// separately on join.
pub fn is_player_name_valid(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed.len() <= MAX_PLAYER_NAME_LENGTH && trimmed == name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_names_must_be_trimmed_and_bounded() {
        assert!(is_player_name_valid("Anna"));
        assert!(!is_player_name_valid(""));
        assert!(!is_player_name_valid("  "));
        assert!(!is_player_name_valid(" Anna"));
        assert!(!is_player_name_valid(&"x".repeat(MAX_PLAYER_NAME_LENGTH + 1)));
    }
}
