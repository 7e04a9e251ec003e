use std::collections::HashSet;

use potluck_api::domain::types::{DrinkChange, GameSession, User};
use potluck_api::error::ApiError;
use potluck_api::realtime::{ConnectionBroadcaster, MessageKind};
use potluck_api::usecase::game::{
    AddPlayerUseCase, CreateDrinkUseCase, CreateGameSessionUseCase, CreateTeamUseCase,
    DeleteGameSessionUseCase, DeleteTeamUseCase, RemovePlayerUseCase, SetPlayerDrinkInput,
    SetPlayerDrinkUseCase, SubscribeGameSessionUseCase,
};
use uuid::Uuid;

use crate::helpers::{MockGameRepo, SharedStore, shared_store, test_user};

async fn session_for(store: &SharedStore, owner: &User) -> GameSession {
    CreateGameSessionUseCase {
        games: MockGameRepo::new(store),
    }
    .execute(owner.id, "Friday night", &[])
    .await
    .unwrap()
}

async fn drink(store: &SharedStore, name: &str) -> Uuid {
    CreateDrinkUseCase {
        games: MockGameRepo::new(store),
    }
    .execute(name, None)
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn should_deliver_snapshot_first_then_updates() {
    let store = shared_store();
    let owner = test_user("host@example.com");
    let session = session_for(&store, &owner).await;
    let broadcaster = ConnectionBroadcaster::new();

    let mut sub = SubscribeGameSessionUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(session.id)
    .await
    .unwrap();

    let first = sub.receiver.recv().await.unwrap();
    assert_eq!(first.kind, MessageKind::Snapshot);
    assert_eq!(first.payload["players"].as_array().unwrap().len(), 0);

    AddPlayerUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(session.id, "Sam", None)
    .await
    .unwrap();

    let update = sub.receiver.recv().await.unwrap();
    assert_eq!(update.kind, MessageKind::Update);
    assert_eq!(update.payload["players"][0]["name"], "Sam");
}

#[tokio::test]
async fn should_report_drink_added_alongside_snapshot() {
    let store = shared_store();
    let owner = test_user("host@example.com");
    let session = session_for(&store, &owner).await;
    let beer = drink(&store, "Beer").await;
    let broadcaster = ConnectionBroadcaster::new();

    let mut sub = SubscribeGameSessionUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(session.id)
    .await
    .unwrap();
    sub.receiver.recv().await.unwrap();

    let player = AddPlayerUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(session.id, "Sam", None)
    .await
    .unwrap();
    sub.receiver.recv().await.unwrap();

    let uc = SetPlayerDrinkUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    };
    let input = |amount| SetPlayerDrinkInput {
        session_id: session.id,
        player_id: player.id,
        drink_id: beer,
        amount,
    };

    assert_eq!(uc.execute(input(2)).await.unwrap(), DrinkChange::Added);

    let mut kinds = HashSet::new();
    for _ in 0..2 {
        let message = sub.receiver.recv().await.unwrap();
        if message.kind == MessageKind::DrinkAdded {
            assert_eq!(message.payload["amount"], 2);
        }
        kinds.insert(message.kind);
    }
    assert_eq!(
        kinds,
        HashSet::from([MessageKind::DrinkAdded, MessageKind::Update])
    );

    assert_eq!(uc.execute(input(2)).await.unwrap(), DrinkChange::Unchanged);
    assert_eq!(uc.execute(input(5)).await.unwrap(), DrinkChange::Updated);
    assert_eq!(uc.execute(input(0)).await.unwrap(), DrinkChange::Removed);
    assert_eq!(uc.execute(input(-1)).await.unwrap(), DrinkChange::Unchanged);
    assert!(store.lock().unwrap().player_drinks.is_empty());
}

#[tokio::test]
async fn should_reject_unknown_drink_and_foreign_player() {
    let store = shared_store();
    let owner = test_user("host@example.com");
    let here = session_for(&store, &owner).await;
    let elsewhere = session_for(&store, &owner).await;
    let beer = drink(&store, "Beer").await;
    let broadcaster = ConnectionBroadcaster::new();

    let player = AddPlayerUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(elsewhere.id, "Sam", None)
    .await
    .unwrap();

    let uc = SetPlayerDrinkUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    };
    let foreign = uc
        .execute(SetPlayerDrinkInput {
            session_id: here.id,
            player_id: player.id,
            drink_id: beer,
            amount: 1,
        })
        .await;
    assert!(matches!(foreign, Err(ApiError::PlayerNotFound)), "got {foreign:?}");

    let unknown = uc
        .execute(SetPlayerDrinkInput {
            session_id: elsewhere.id,
            player_id: player.id,
            drink_id: Uuid::now_v7(),
            amount: 1,
        })
        .await;
    assert!(matches!(unknown, Err(ApiError::DrinkNotFound)), "got {unknown:?}");

    let removed = RemovePlayerUseCase {
        games: MockGameRepo::new(&store),
        broadcaster,
    }
    .execute(here.id, player.id)
    .await;
    assert!(matches!(removed, Err(ApiError::PlayerNotFound)), "got {removed:?}");
}

#[tokio::test]
async fn should_only_let_owner_or_superuser_delete_session() {
    let store = shared_store();
    let owner = test_user("host@example.com");
    let guest = test_user("guest@example.com");
    let mut admin = test_user("admin@example.com");
    admin.is_superuser = true;
    let broadcaster = ConnectionBroadcaster::new();
    let uc = DeleteGameSessionUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    };

    let session = session_for(&store, &owner).await;
    let result = uc.execute(&guest, session.id).await;
    assert!(matches!(result, Err(ApiError::Forbidden)), "got {result:?}");

    let mut sub = SubscribeGameSessionUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(session.id)
    .await
    .unwrap();
    sub.receiver.recv().await.unwrap();

    uc.execute(&owner, session.id).await.unwrap();
    let farewell = sub.receiver.recv().await.unwrap();
    assert_eq!(farewell.kind, MessageKind::Update);
    assert_eq!(farewell.payload["deleted"], true);

    let other = session_for(&store, &owner).await;
    uc.execute(&admin, other.id).await.unwrap();
    assert!(store.lock().unwrap().sessions.is_empty());
}

#[tokio::test]
async fn should_report_missing_session() {
    let store = shared_store();
    let broadcaster = ConnectionBroadcaster::new();

    let added = AddPlayerUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(Uuid::now_v7(), "Sam", None)
    .await;
    assert!(matches!(added, Err(ApiError::GameSessionNotFound)), "got {added:?}");

    let subscribed = SubscribeGameSessionUseCase {
        games: MockGameRepo::new(&store),
        broadcaster,
    }
    .execute(Uuid::now_v7())
    .await;
    assert!(matches!(subscribed, Err(ApiError::GameSessionNotFound)));
}

#[tokio::test]
async fn should_reject_duplicate_drink_name() {
    let store = shared_store();
    drink(&store, "Beer").await;

    let result = CreateDrinkUseCase {
        games: MockGameRepo::new(&store),
    }
    .execute("Beer", Some("again".to_owned()))
    .await;
    assert!(matches!(result, Err(ApiError::DrinkAlreadyExists)), "got {result:?}");
}

// ── Teams ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_session_with_initial_teams() {
    let store = shared_store();
    let owner = test_user("host@example.com");
    let session = CreateGameSessionUseCase {
        games: MockGameRepo::new(&store),
    }
    .execute(owner.id, "Quiz", &["Red".to_owned(), " Blue ".to_owned()])
    .await
    .unwrap();

    let names: Vec<&str> = session.teams.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Red", "Blue"]);
    assert!(session.teams.iter().all(|t| t.game_session_id == session.id));
    assert_eq!(store.lock().unwrap().teams.len(), 2);

    let blank = CreateGameSessionUseCase {
        games: MockGameRepo::new(&store),
    }
    .execute(owner.id, "Quiz", &["  ".to_owned()])
    .await;
    assert!(matches!(blank, Err(ApiError::InvalidInput(_))), "got {blank:?}");
}

#[tokio::test]
async fn should_push_team_changes_to_subscribers() {
    let store = shared_store();
    let owner = test_user("host@example.com");
    let session = session_for(&store, &owner).await;
    let broadcaster = ConnectionBroadcaster::new();

    let mut sub = SubscribeGameSessionUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(session.id)
    .await
    .unwrap();
    sub.receiver.recv().await.unwrap();

    let team = CreateTeamUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(session.id, "Red")
    .await
    .unwrap();
    let update = sub.receiver.recv().await.unwrap();
    assert_eq!(update.kind, MessageKind::Update);
    assert_eq!(update.payload["teams"][0]["name"], "Red");

    let player = AddPlayerUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(session.id, "Sam", Some(team.id))
    .await
    .unwrap();
    let update = sub.receiver.recv().await.unwrap();
    assert_eq!(update.payload["players"][0]["team_id"], team.id.to_string());

    DeleteTeamUseCase {
        games: MockGameRepo::new(&store),
        broadcaster,
    }
    .execute(session.id, team.id)
    .await
    .unwrap();
    let update = sub.receiver.recv().await.unwrap();
    assert_eq!(update.payload["teams"].as_array().unwrap().len(), 0);
    assert!(update.payload["players"][0]["team_id"].is_null());

    let store = store.lock().unwrap();
    assert_eq!(store.players[0].id, player.id);
    assert_eq!(store.players[0].team_id, None);
}

#[tokio::test]
async fn should_reject_team_from_another_session() {
    let store = shared_store();
    let owner = test_user("host@example.com");
    let here = session_for(&store, &owner).await;
    let elsewhere = session_for(&store, &owner).await;
    let broadcaster = ConnectionBroadcaster::new();

    let team = CreateTeamUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(elsewhere.id, "Red")
    .await
    .unwrap();

    let added = AddPlayerUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(here.id, "Sam", Some(team.id))
    .await;
    assert!(matches!(added, Err(ApiError::TeamNotFound)), "got {added:?}");

    let deleted = DeleteTeamUseCase {
        games: MockGameRepo::new(&store),
        broadcaster: broadcaster.clone(),
    }
    .execute(here.id, team.id)
    .await;
    assert!(matches!(deleted, Err(ApiError::TeamNotFound)), "got {deleted:?}");
    assert_eq!(store.lock().unwrap().teams.len(), 1);

    let orphan = CreateTeamUseCase {
        games: MockGameRepo::new(&store),
        broadcaster,
    }
    .execute(Uuid::now_v7(), "Blue")
    .await;
    assert!(matches!(orphan, Err(ApiError::GameSessionNotFound)), "got {orphan:?}");
}
