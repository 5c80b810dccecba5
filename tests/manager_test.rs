use werwolf_engine::error::GameError;
use werwolf_engine::manager::{GameManager, GameManagerError};
use werwolf_engine::models::options::LobbyOptions;
use werwolf_engine::session::GameState;

#[tokio::test]
async fn creating_and_joining_a_game() {
    let manager = GameManager::default();
    let (session, owner, _) = manager.create_game("Anna", None).await.unwrap();
    assert!((100_000..1_000_000).contains(&session.id()));
    assert_eq!(session.owner().await, Some(owner));
    assert_eq!(session.state().await, GameState::Preparation);

    let (joined, ben, token) = manager.join_game(session.id(), "Ben", None).await.unwrap();
    assert_eq!(joined.id(), session.id());
    assert!(session.verify_player_token(ben, &token).await);
    assert_eq!(session.players().await.len(), 2);
}

#[tokio::test]
async fn joining_an_unknown_game_fails() {
    let manager = GameManager::default();
    assert!(matches!(
        manager.join_game(123_456, "Anna", None).await,
        Err(GameManagerError::SessionNotFound)
    ));
}

#[tokio::test]
async fn player_names_are_checked_at_the_door() {
    let manager = GameManager::default();
    assert!(matches!(
        manager.create_game("   ", None).await,
        Err(GameManagerError::InvalidPlayerName)
    ));

    let (session, _, _) = manager.create_game("Anna", None).await.unwrap();
    assert!(matches!(
        manager.join_game(session.id(), "", None).await,
        Err(GameManagerError::InvalidPlayerName)
    ));
    // Names are unique within one session.
    assert!(matches!(
        manager.join_game(session.id(), "Anna", None).await,
        Err(GameManagerError::InvalidPlayerName)
    ));
}

#[tokio::test]
async fn joining_checks_the_password() {
    let manager = GameManager::default();
    let (session, _, _) = manager.create_game("Anna", Some("s3cret")).await.unwrap();
    assert!(session.is_protected());

    assert!(matches!(
        manager.join_game(session.id(), "Ben", Some("wrong")).await,
        Err(GameManagerError::WrongPassword)
    ));
    assert!(matches!(
        manager.join_game(session.id(), "Ben", None).await,
        Err(GameManagerError::WrongPassword)
    ));
    manager
        .join_game(session.id(), "Ben", Some("s3cret"))
        .await
        .unwrap();
}

#[tokio::test]
async fn a_full_lobby_rejects_further_players() {
    let manager = GameManager::new(LobbyOptions {
        max_players: 2,
        allow_view_all: true,
    });
    let (session, _, _) = manager.create_game("Anna", None).await.unwrap();
    manager.join_game(session.id(), "Ben", None).await.unwrap();

    assert!(matches!(
        manager.join_game(session.id(), "Clara", None).await,
        Err(GameManagerError::SessionFull)
    ));
}

#[tokio::test]
async fn listing_respects_the_lobby_configuration() {
    let manager = GameManager::default();
    let (session, _, _) = manager.create_game("Anna", None).await.unwrap();
    let listed = manager.list_games().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), session.id());

    let hidden = GameManager::new(LobbyOptions {
        max_players: 9,
        allow_view_all: false,
    });
    hidden.create_game("Ben", None).await.unwrap();
    assert!(hidden.list_games().await.is_empty());
}

#[tokio::test]
async fn removing_a_game_disposes_it() {
    let manager = GameManager::default();
    let (session, _, _) = manager.create_game("Anna", None).await.unwrap();
    let id = session.id();

    assert!(manager.remove_game(id).await);
    assert!(matches!(
        manager.get_game(id).await,
        Err(GameManagerError::SessionNotFound)
    ));
    assert!(matches!(
        session.add_player("Ben").await,
        Err(GameError::Disposed)
    ));

    assert!(!manager.remove_game(id).await);
}
