use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::permission::effective_scopes;
use crate::domain::types::User;
use crate::error::ApiError;
use crate::handlers::auth::CurrentUser;
use crate::handlers::scopes::Operation;
use crate::state::AppState;
use crate::usecase::user::{
    CreateUserInput, CreateUserUseCase, DeleteMeUseCase, DeleteUserUseCase, GetUserUseCase,
    UpdateMeInput, UpdateMeUseCase, UpdatePasswordUseCase, UpdateUserInput, UpdateUserUseCase,
};

#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub roles: Vec<String>,
    pub custom_scopes: Vec<String>,
    #[serde(serialize_with = "potluck_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            roles: user.roles.into_iter().map(|r| r.name).collect(),
            custom_scopes: user.custom_scopes.into_iter().collect(),
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct UserMessage {
    pub message: &'static str,
}

// ── POST /users ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Superusers are only created through the admin CLI.
pub async fn create_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    current.require(Operation::CreateUser)?;
    let usecase = CreateUserUseCase {
        users: state.user_repo(),
    };
    let user = usecase
        .execute(CreateUserInput {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            is_superuser: false,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

// ── GET /users/me ────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub effective_scopes: Vec<String>,
}

pub async fn get_me(current: CurrentUser) -> Json<MeResponse> {
    let CurrentUser(user) = current;
    let effective_scopes = effective_scopes(&user).into_iter().collect();
    Json(MeResponse {
        user: user.into(),
        effective_scopes,
    })
}

// ── PATCH /users/me ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

pub async fn update_me(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let usecase = UpdateMeUseCase {
        users: state.user_repo(),
    };
    let user = usecase
        .execute(
            &current.0,
            UpdateMeInput {
                email: body.email,
                full_name: body.full_name,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

// ── PATCH /users/me/password ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn update_password_me(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<Json<UserMessage>, ApiError> {
    let usecase = UpdatePasswordUseCase {
        users: state.user_repo(),
    };
    usecase
        .execute(&current.0, &body.current_password, &body.new_password)
        .await?;
    Ok(Json(UserMessage {
        message: "Password updated successfully",
    }))
}

// ── DELETE /users/me ─────────────────────────────────────────────────────────

pub async fn delete_me(
    current: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<UserMessage>, ApiError> {
    let usecase = DeleteMeUseCase {
        users: state.user_repo(),
    };
    usecase.execute(&current.0).await?;
    Ok(Json(UserMessage {
        message: "User deleted successfully",
    }))
}

// ── /users/{user_id} ─────────────────────────────────────────────────────────

pub async fn get_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let usecase = GetUserUseCase {
        users: state.user_repo(),
    };
    Ok(Json(usecase.execute(&current.0, user_id).await?.into()))
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
}

pub async fn update_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    current.require(Operation::UpdateUser)?;
    let usecase = UpdateUserUseCase {
        users: state.user_repo(),
    };
    let user = usecase
        .execute(
            &current.0,
            user_id,
            UpdateUserInput {
                email: body.email,
                password: body.password,
                full_name: body.full_name,
                is_active: body.is_active,
                is_superuser: body.is_superuser,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

pub async fn delete_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserMessage>, ApiError> {
    current.require(Operation::DeleteUser)?;
    let usecase = DeleteUserUseCase {
        users: state.user_repo(),
    };
    usecase.execute(&current.0, user_id).await?;
    Ok(Json(UserMessage {
        message: "User deleted successfully",
    }))
}
