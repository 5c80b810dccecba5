use std::collections::HashSet;
use std::time::Duration;

use tokio::time::timeout;

use werwolf_engine::error::GameError;
use werwolf_engine::models::event::GameEvent;
use werwolf_engine::models::options::GameOptions;
use werwolf_engine::models::role::RoleKind;
use werwolf_engine::session::{GameSession, GameState};

const WAIT: Duration = Duration::from_secs(5);

async fn session_with_players(names: &[&str]) -> std::sync::Arc<GameSession> {
    let session = GameSession::new(1, None, 9).unwrap();
    session.initialize(names[0]).await.unwrap();
    for name in &names[1..] {
        session.add_player(name).await.unwrap();
    }
    session
}

/// Starts the match and blocks until the loop task has entered the night.
async fn start_and_wait(session: &std::sync::Arc<GameSession>, options: GameOptions) {
    let mut rx = session.subscribe();
    session.start(options).await.unwrap();
    loop {
        let event = timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for the game to start")
            .expect("event channel closed");
        if let GameEvent::StateChanged {
            state: GameState::Night,
            ..
        } = event
        {
            return;
        }
    }
}

#[tokio::test]
async fn initialize_seats_the_owner() {
    let session = GameSession::new(1, None, 9).unwrap();
    assert_eq!(session.state().await, GameState::NotInitialized);

    let (owner, token) = session.initialize("Anna").await.unwrap();
    assert_eq!(session.state().await, GameState::Preparation);
    assert_eq!(session.owner().await, Some(owner));
    assert!(session.verify_player_token(owner, &token).await);
    assert!(!session.verify_player_token(owner, "not-the-token").await);
}

#[tokio::test]
async fn initializing_twice_fails() {
    let session = GameSession::new(1, None, 9).unwrap();
    session.initialize("Anna").await.unwrap();
    assert!(matches!(
        session.initialize("Ben").await,
        Err(GameError::AlreadyInitialized)
    ));
}

#[tokio::test]
async fn removing_the_owner_transfers_ownership_to_the_lowest_id() {
    let session = session_with_players(&["Anna", "Ben", "Clara"]).await;
    let owner = session.owner().await.unwrap();

    assert!(session.remove_player(owner).await.unwrap());
    let players: Vec<_> = session.players().await;
    let lowest = players.iter().map(|p| p.id).min().unwrap();
    assert_eq!(session.owner().await, Some(lowest));

    // Removing an unknown player is a no-op.
    assert!(!session.remove_player(999).await.unwrap());
}

#[tokio::test]
async fn removing_the_last_player_disposes_the_session() {
    let session = session_with_players(&["Anna"]).await;
    let owner = session.owner().await.unwrap();
    assert!(session.remove_player(owner).await.unwrap());

    assert!(matches!(
        session.add_player("Ben").await,
        Err(GameError::Disposed)
    ));

    // A disposed session can be re-armed.
    let (new_owner, _) = session.initialize("Dana").await.unwrap();
    assert_eq!(session.owner().await, Some(new_owner));
    assert_eq!(session.state().await, GameState::Preparation);
}

#[tokio::test]
async fn lock_toggles_until_the_match_starts() {
    let session = session_with_players(&["Anna", "Ben", "Clara"]).await;
    assert!(session.toggle_lock().await.unwrap());
    assert_eq!(session.state().await, GameState::Locked);
    assert!(session.toggle_lock().await.unwrap());
    assert_eq!(session.state().await, GameState::Preparation);

    start_and_wait(&session, GameOptions::default()).await;
    assert!(!session.toggle_lock().await.unwrap());

    session.dispose().await;
}

#[tokio::test]
async fn starting_requires_enough_players() {
    let session = session_with_players(&["Anna", "Ben"]).await;
    assert!(matches!(
        session.start(GameOptions::default()).await,
        Err(GameError::NotEnoughPlayers)
    ));
}

#[tokio::test]
async fn starting_twice_fails() {
    let session = session_with_players(&["Anna", "Ben", "Clara"]).await;
    start_and_wait(&session, GameOptions::default()).await;

    assert!(matches!(
        session.start(GameOptions::default()).await,
        Err(GameError::AlreadyStarted)
    ));
    session.dispose().await;
}

#[tokio::test]
async fn starting_twice_in_quick_succession_fails() {
    let session = session_with_players(&["Anna", "Ben", "Clara"]).await;
    // No waiting in between: the second call races the spawned loop task
    // and must still be rejected.
    session.start(GameOptions::default()).await.unwrap();
    assert!(matches!(
        session.start(GameOptions::default()).await,
        Err(GameError::AlreadyStarted)
    ));
    session.dispose().await;
}

#[tokio::test]
async fn starting_rejects_a_duplicate_night_order() {
    let session = session_with_players(&["Anna", "Ben", "Clara"]).await;
    let options = GameOptions {
        night_execution_order: vec![RoleKind::Werwolf, RoleKind::Werwolf],
        ..GameOptions::default()
    };
    assert!(matches!(
        session.start(options).await,
        Err(GameError::InvalidOptions(_))
    ));
}

#[tokio::test]
async fn every_player_gets_a_role_and_quotas_are_met() {
    let session =
        session_with_players(&["Anna", "Ben", "Clara", "Dana", "Emil", "Fritz"]).await;
    let options = GameOptions {
        werwolves: 2,
        seers: 1,
        witches: 1,
        hunters: 1,
        matchmaker: true,
        ..GameOptions::default()
    };
    start_and_wait(&session, options).await;

    let players = session.players().await;
    let count = |kind: RoleKind| players.iter().filter(|p| p.role_kind() == Some(kind)).count();
    assert!(players.iter().all(|p| p.role.is_some()));
    assert_eq!(count(RoleKind::Werwolf), 2);
    assert_eq!(count(RoleKind::Seer), 1);
    assert_eq!(count(RoleKind::Witch), 1);
    assert_eq!(count(RoleKind::Hunter), 1);
    assert_eq!(count(RoleKind::Matchmaker), 1);
    assert_eq!(count(RoleKind::Villager), 0);

    session.dispose().await;
}

#[tokio::test]
async fn shuffling_keeps_the_same_players() {
    let session = session_with_players(&["Anna", "Ben", "Clara", "Dana"]).await;
    let before: HashSet<_> = session.players().await.iter().map(|p| p.id).collect();
    session.shuffle_players().await.unwrap();
    let after: HashSet<_> = session.players().await.iter().map(|p| p.id).collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn voting_without_an_open_action_is_rejected() {
    let session = session_with_players(&["Anna", "Ben", "Clara"]).await;
    assert!(!session.register_vote(0, vec![1]).await);
}

#[tokio::test]
async fn password_protection() {
    let session = GameSession::new(1, Some("hunt3r2"), 9).unwrap();
    assert!(session.is_protected());
    session.initialize("Anna").await.unwrap();

    assert!(session.verify_password(Some("hunt3r2")).await.unwrap());
    assert!(!session.verify_password(Some("wrong")).await.unwrap());
    assert!(!session.verify_password(None).await.unwrap());

    let open = GameSession::new(2, None, 9).unwrap();
    open.initialize("Ben").await.unwrap();
    assert!(open.verify_password(None).await.unwrap());
}
