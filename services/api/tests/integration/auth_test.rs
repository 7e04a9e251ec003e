use potluck_api::error::ApiError;
use potluck_api::password::verify_password;
use potluck_api::usecase::auth::{
    AuthorizeUseCase, LoginInput, LoginUseCase, LogoutUseCase, RefreshTokenUseCase,
};
use potluck_api::usecase::user::{CreateUserInput, CreateUserUseCase};
use potluck_api::usecase::user_permission::{RevokeScopeUseCase, ScopeGrant};
use potluck_auth_types::token::{now_secs, validate_access_token, validate_refresh_token};
use potluck_domain::scope::{GAMES_READ, RECIPES_READ};
use potluck_testing::auth::{MockAuth, TEST_JWT_SECRET};

use crate::helpers::{
    MockRefreshTokenRepo, MockUserRepo, SharedStore, TEST_PASSWORD, active_refresh_tokens,
    seed_membership, seed_role, seed_user, shared_store, test_role, test_user,
};

fn login_uc(store: &SharedStore) -> LoginUseCase<MockUserRepo, MockRefreshTokenRepo> {
    LoginUseCase {
        users: MockUserRepo::new(store),
        tokens: MockRefreshTokenRepo::new(store),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
        access_token_ttl_secs: 3600,
        refresh_token_ttl_secs: 7 * 24 * 3600,
    }
}

fn refresh_uc(store: &SharedStore) -> RefreshTokenUseCase<MockUserRepo, MockRefreshTokenRepo> {
    RefreshTokenUseCase {
        users: MockUserRepo::new(store),
        tokens: MockRefreshTokenRepo::new(store),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
        access_token_ttl_secs: 3600,
        refresh_token_ttl_secs: 7 * 24 * 3600,
    }
}

fn authorize_uc(store: &SharedStore) -> AuthorizeUseCase<MockUserRepo> {
    AuthorizeUseCase {
        users: MockUserRepo::new(store),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    }
}

fn credentials(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.to_owned(),
        password: password.to_owned(),
    }
}

#[tokio::test]
async fn should_issue_token_carrying_effective_scopes() {
    let store = shared_store();
    let mut user = test_user("alice@example.com");
    user.custom_scopes.insert(GAMES_READ.to_owned());
    let role = test_role("Readers", &[RECIPES_READ]);
    seed_user(&store, &user);
    seed_role(&store, &role);
    seed_membership(&store, user.id, role.id);

    let out = login_uc(&store)
        .execute(credentials("Alice@Example.com", TEST_PASSWORD))
        .await
        .unwrap();

    let info = validate_access_token(&out.access_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(info.user_id, user.id);
    assert_eq!(info.auth_version, 1);
    assert_eq!(info.scopes, vec![GAMES_READ.to_owned(), RECIPES_READ.to_owned()]);
    assert!(out.access_token_exp > now_secs());
}

#[tokio::test]
async fn should_not_distinguish_unknown_email_from_wrong_password() {
    let store = shared_store();
    seed_user(&store, &test_user("alice@example.com"));
    let uc = login_uc(&store);

    let wrong_password = uc
        .execute(credentials("alice@example.com", "not the password"))
        .await;
    assert!(matches!(wrong_password, Err(ApiError::InvalidCredentials)));

    let unknown = uc.execute(credentials("bob@example.com", TEST_PASSWORD)).await;
    assert!(matches!(unknown, Err(ApiError::InvalidCredentials)));
}

#[tokio::test]
async fn should_refuse_inactive_user() {
    let store = shared_store();
    let mut user = test_user("alice@example.com");
    user.is_active = false;
    seed_user(&store, &user);

    let result = login_uc(&store)
        .execute(credentials("alice@example.com", TEST_PASSWORD))
        .await;
    assert!(matches!(result, Err(ApiError::InactiveUser)), "got {result:?}");
}

#[tokio::test]
async fn should_reject_token_issued_before_revocation() {
    let store = shared_store();
    let mut user = test_user("alice@example.com");
    user.custom_scopes.insert(GAMES_READ.to_owned());
    seed_user(&store, &user);

    let token = login_uc(&store)
        .execute(credentials("alice@example.com", TEST_PASSWORD))
        .await
        .unwrap()
        .access_token;
    let resolved = authorize_uc(&store).execute(&token).await.unwrap();
    assert_eq!(resolved.id, user.id);

    RevokeScopeUseCase {
        users: MockUserRepo::new(&store),
    }
    .execute(ScopeGrant {
        user_email: "alice@example.com".to_owned(),
        scope: GAMES_READ.to_owned(),
    })
    .await
    .unwrap();

    let result = authorize_uc(&store).execute(&token).await;
    assert!(matches!(result, Err(ApiError::StaleAuthVersion)), "got {result:?}");

    let fresh = login_uc(&store)
        .execute(credentials("alice@example.com", TEST_PASSWORD))
        .await
        .unwrap()
        .access_token;
    let resolved = authorize_uc(&store).execute(&fresh).await.unwrap();
    assert!(resolved.custom_scopes.is_empty());
}

#[tokio::test]
async fn should_reject_expired_and_orphaned_tokens() {
    let store = shared_store();
    let user = test_user("alice@example.com");
    seed_user(&store, &user);
    let uc = authorize_uc(&store);

    let expired = MockAuth::new(user.id, 1).expired_token();
    let result = uc.execute(&expired).await;
    assert!(matches!(result, Err(ApiError::TokenExpired)), "got {result:?}");

    let orphan = MockAuth::new(uuid::Uuid::now_v7(), 1).token();
    let result = uc.execute(&orphan).await;
    assert!(matches!(result, Err(ApiError::InvalidToken)), "got {result:?}");
}

#[tokio::test]
async fn should_resolve_scopes_from_storage_not_token() {
    let store = shared_store();
    let user = test_user("alice@example.com");
    seed_user(&store, &user);

    let token = MockAuth::new(user.id, 1)
        .with_scopes(&[RECIPES_READ])
        .token();
    let resolved = authorize_uc(&store).execute(&token).await.unwrap();
    assert!(resolved.custom_scopes.is_empty());
    assert!(resolved.roles.is_empty());
}

#[tokio::test]
async fn should_create_user_with_hashed_password() {
    let store = shared_store();
    let uc = CreateUserUseCase {
        users: MockUserRepo::new(&store),
    };

    let user = uc
        .execute(CreateUserInput {
            email: " Carol@Example.com ".to_owned(),
            password: TEST_PASSWORD.to_owned(),
            full_name: Some("Carol".to_owned()),
            is_superuser: false,
        })
        .await
        .unwrap();

    assert_eq!(user.email, "carol@example.com");
    assert_eq!(user.auth_version, 1);
    assert_ne!(user.hashed_password, TEST_PASSWORD);
    assert!(verify_password(TEST_PASSWORD, &user.hashed_password).unwrap());

    let duplicate = uc
        .execute(CreateUserInput {
            email: "carol@example.com".to_owned(),
            password: TEST_PASSWORD.to_owned(),
            full_name: None,
            is_superuser: false,
        })
        .await;
    assert!(matches!(duplicate, Err(ApiError::UserAlreadyExists)));
}

#[tokio::test]
async fn should_reject_short_password() {
    let store = shared_store();
    let result = CreateUserUseCase {
        users: MockUserRepo::new(&store),
    }
    .execute(CreateUserInput {
        email: "dave@example.com".to_owned(),
        password: "short".to_owned(),
        full_name: None,
        is_superuser: false,
    })
    .await;

    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    assert!(store.lock().unwrap().users.is_empty());
}

// ── Refresh tokens ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_store_refresh_token_on_login() {
    let store = shared_store();
    let user = test_user("alice@example.com");
    seed_user(&store, &user);

    let out = login_uc(&store)
        .execute(credentials("alice@example.com", TEST_PASSWORD))
        .await
        .unwrap();

    let info = validate_refresh_token(&out.refresh_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(info.user_id, user.id);
    assert!(out.refresh_token_exp > out.access_token_exp);
    assert_eq!(active_refresh_tokens(&store, user.id), 1);
    assert!(
        !store
            .lock()
            .unwrap()
            .refresh_tokens
            .iter()
            .any(|t| t.token_hash == out.refresh_token),
        "only the hash is stored"
    );
}

#[tokio::test]
async fn should_rotate_refresh_token_and_reject_reuse() {
    let store = shared_store();
    let user = test_user("alice@example.com");
    seed_user(&store, &user);
    let first = login_uc(&store)
        .execute(credentials("alice@example.com", TEST_PASSWORD))
        .await
        .unwrap()
        .refresh_token;

    let out = refresh_uc(&store).execute(&first).await.unwrap();
    assert_eq!(out.user_id, user.id);
    assert_ne!(out.refresh_token, first);
    let resolved = authorize_uc(&store).execute(&out.access_token).await.unwrap();
    assert_eq!(resolved.id, user.id);
    assert_eq!(active_refresh_tokens(&store, user.id), 1);

    let reused = refresh_uc(&store).execute(&first).await;
    assert!(matches!(reused, Err(ApiError::RefreshTokenRevoked)), "got {reused:?}");

    refresh_uc(&store).execute(&out.refresh_token).await.unwrap();
}

#[tokio::test]
async fn should_not_accept_access_token_as_refresh_token() {
    let store = shared_store();
    seed_user(&store, &test_user("alice@example.com"));
    let access = login_uc(&store)
        .execute(credentials("alice@example.com", TEST_PASSWORD))
        .await
        .unwrap()
        .access_token;

    let result = refresh_uc(&store).execute(&access).await;
    assert!(matches!(result, Err(ApiError::InvalidToken)), "got {result:?}");
}

#[tokio::test]
async fn should_revoke_refresh_token_on_logout() {
    let store = shared_store();
    let user = test_user("alice@example.com");
    seed_user(&store, &user);
    let token = login_uc(&store)
        .execute(credentials("alice@example.com", TEST_PASSWORD))
        .await
        .unwrap()
        .refresh_token;
    let logout = LogoutUseCase {
        tokens: MockRefreshTokenRepo::new(&store),
    };

    assert!(logout.execute(Some(&token)).await.unwrap());
    assert!(!logout.execute(Some(&token)).await.unwrap());
    assert!(!logout.execute(None).await.unwrap());
    assert_eq!(active_refresh_tokens(&store, user.id), 0);

    let result = refresh_uc(&store).execute(&token).await;
    assert!(matches!(result, Err(ApiError::RefreshTokenRevoked)), "got {result:?}");
}

#[tokio::test]
async fn should_refuse_refresh_for_deactivated_user() {
    let store = shared_store();
    let user = test_user("alice@example.com");
    seed_user(&store, &user);
    let token = login_uc(&store)
        .execute(credentials("alice@example.com", TEST_PASSWORD))
        .await
        .unwrap()
        .refresh_token;
    store.lock().unwrap().users[0].is_active = false;

    let result = refresh_uc(&store).execute(&token).await;
    assert!(matches!(result, Err(ApiError::InactiveUser)), "got {result:?}");
    assert_eq!(active_refresh_tokens(&store, user.id), 1);
}
