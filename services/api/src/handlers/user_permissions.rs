use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::handlers::auth::CurrentUser;
use crate::handlers::roles::RoleResponse;
use crate::handlers::scopes::Operation;
use crate::handlers::users::UserResponse;
use crate::state::AppState;
use crate::usecase::user_permission::{
    AssignRoleUseCase, GetUserPermissionsUseCase, GrantScopeUseCase, RemoveRoleUseCase,
    RevokeScopeUseCase, RoleAssignment, ScopeGrant,
};

#[derive(Deserialize)]
pub struct RoleAssignmentRequest {
    pub user_email: String,
    pub role_name: String,
}

#[derive(Deserialize)]
pub struct ScopeGrantRequest {
    pub user_email: String,
    pub scope: String,
}

/// `changed` is `false` when the request was a no-op.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub changed: bool,
}

// ── POST /user-permissions/assign-role ───────────────────────────────────────

pub async fn assign_role(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<RoleAssignmentRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    current.require(Operation::AssignRole)?;
    let usecase = AssignRoleUseCase {
        users: state.user_repo(),
        roles: state.role_repo(),
    };
    let message = format!("role '{}' assigned to user '{}'", body.role_name, body.user_email);
    let changed = usecase
        .execute(RoleAssignment {
            user_email: body.user_email,
            role_name: body.role_name,
        })
        .await?;
    Ok(Json(MessageResponse { message, changed }))
}

// ── POST /user-permissions/remove-role ───────────────────────────────────────

pub async fn remove_role(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<RoleAssignmentRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    current.require(Operation::RemoveRole)?;
    let usecase = RemoveRoleUseCase {
        users: state.user_repo(),
        roles: state.role_repo(),
    };
    let message = format!("role '{}' removed from user '{}'", body.role_name, body.user_email);
    let changed = usecase
        .execute(RoleAssignment {
            user_email: body.user_email,
            role_name: body.role_name,
        })
        .await?;
    Ok(Json(MessageResponse { message, changed }))
}

// ── POST /user-permissions/grant-scope ───────────────────────────────────────

pub async fn grant_scope(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<ScopeGrantRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    current.require(Operation::GrantScope)?;
    let usecase = GrantScopeUseCase {
        users: state.user_repo(),
    };
    let message = format!("scope '{}' granted to user '{}'", body.scope, body.user_email);
    let changed = usecase
        .execute(ScopeGrant {
            user_email: body.user_email,
            scope: body.scope,
        })
        .await?;
    Ok(Json(MessageResponse { message, changed }))
}

// ── POST /user-permissions/revoke-scope ──────────────────────────────────────

pub async fn revoke_scope(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<ScopeGrantRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    current.require(Operation::RevokeScope)?;
    let usecase = RevokeScopeUseCase {
        users: state.user_repo(),
    };
    let message = format!("scope '{}' revoked from user '{}'", body.scope, body.user_email);
    let changed = usecase
        .execute(ScopeGrant {
            user_email: body.user_email,
            scope: body.scope,
        })
        .await?;
    Ok(Json(MessageResponse { message, changed }))
}

// ── GET /user-permissions/{email} ────────────────────────────────────────────

#[derive(Serialize)]
pub struct UserPermissionsResponse {
    pub user: UserResponse,
    pub roles: Vec<RoleResponse>,
    pub custom_scopes: Vec<String>,
    pub effective_scopes: Vec<String>,
}

pub async fn get_user_permissions(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<UserPermissionsResponse>, ApiError> {
    current.require(Operation::GetUserPermissions)?;
    let usecase = GetUserPermissionsUseCase {
        users: state.user_repo(),
    };
    let permissions = usecase.execute(&email).await?;
    let user = permissions.user;
    Ok(Json(UserPermissionsResponse {
        roles: user.roles.iter().cloned().map(Into::into).collect(),
        custom_scopes: user.custom_scopes.iter().cloned().collect(),
        effective_scopes: permissions.effective_scopes.into_iter().collect(),
        user: user.into(),
    }))
}
