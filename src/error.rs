/// Minimum amount of players required to start a match.
pub const MIN_PLAYERS: usize = 3;

/// Errors raised by the session state machine on illegal transitions.
///
/// Invalid vote submissions are deliberately not part of this taxonomy:
/// `register_vote` rejects them silently by returning `false`.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("the game has already been initialized")]
    AlreadyInitialized,
    #[error("the game has already been started")]
    AlreadyStarted,
    #[error("the game has not been initialized yet")]
    NotInitialized,
    #[error("the game session has been disposed")]
    Disposed,
    #[error("at least {MIN_PLAYERS} players are required to start a game")]
    NotEnoughPlayers,
    #[error("invalid game options: {0}")]
    InvalidOptions(String),
    #[error("failed to issue player credentials: {0}")]
    Credential(#[from] crate::utils::auth::AuthError),
}
