use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use potluck_domain::role_template::RoleTemplate;

use crate::domain::types::Role;
use crate::error::ApiError;
use crate::handlers::auth::CurrentUser;
use crate::handlers::scopes::Operation;
use crate::state::AppState;
use crate::usecase::role::{
    CreateRoleFromTemplateUseCase, CreateRoleInput, CreateRoleUseCase, DeleteRoleUseCase,
    GetRoleUseCase, ListRolesUseCase, RoleWrite, UpdateRoleInput, UpdateRoleScopesUseCase,
    UpdateRoleUseCase, list_available_scopes, list_templates,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub scopes: Vec<String>,
    #[serde(serialize_with = "potluck_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            scopes: role.scopes.into_iter().collect(),
            created_at: role.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct RoleWriteResponse {
    #[serde(flatten)]
    pub role: RoleResponse,
    /// Users whose outstanding tokens were invalidated by this write.
    pub invalidated_users: u64,
}

impl From<RoleWrite> for RoleWriteResponse {
    fn from(write: RoleWrite) -> Self {
        Self {
            role: write.role.into(),
            invalidated_users: write.bumped_users,
        }
    }
}

// ── GET /roles ───────────────────────────────────────────────────────────────

pub async fn list_roles(
    current: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    current.require(Operation::ListRoles)?;
    let usecase = ListRolesUseCase {
        roles: state.role_repo(),
    };
    let roles = usecase.execute().await?;
    Ok(Json(roles.into_iter().map(Into::into).collect()))
}

// ── GET /roles/{role_id} ─────────────────────────────────────────────────────

pub async fn get_role(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
) -> Result<Json<RoleResponse>, ApiError> {
    current.require(Operation::GetRole)?;
    let usecase = GetRoleUseCase {
        roles: state.role_repo(),
    };
    Ok(Json(usecase.execute(role_id).await?.into()))
}

// ── POST /roles ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

pub async fn create_role(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleResponse>), ApiError> {
    current.require(Operation::CreateRole)?;
    let usecase = CreateRoleUseCase {
        roles: state.role_repo(),
    };
    let role = usecase
        .execute(CreateRoleInput {
            name: body.name,
            description: body.description,
            scopes: body.scopes,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(role.into())))
}

// ── PUT /roles/{role_id} ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub scopes: Option<Vec<String>>,
}

pub async fn update_role(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<Json<RoleWriteResponse>, ApiError> {
    current.require(Operation::UpdateRole)?;
    let usecase = UpdateRoleUseCase {
        roles: state.role_repo(),
    };
    let write = usecase
        .execute(
            role_id,
            UpdateRoleInput {
                name: body.name,
                description: body.description,
                scopes: body.scopes,
            },
        )
        .await?;
    Ok(Json(write.into()))
}

// ── PUT /roles/{role_id}/scopes ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateRoleScopesRequest {
    pub scopes: Vec<String>,
}

pub async fn update_role_scopes(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
    Json(body): Json<UpdateRoleScopesRequest>,
) -> Result<Json<RoleWriteResponse>, ApiError> {
    current.require(Operation::UpdateRole)?;
    let usecase = UpdateRoleScopesUseCase {
        roles: state.role_repo(),
    };
    let write = usecase.execute(role_id, body.scopes).await?;
    Ok(Json(write.into()))
}

// ── DELETE /roles/{role_id} ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct DeleteRoleResponse {
    pub invalidated_users: u64,
}

pub async fn delete_role(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
) -> Result<Json<DeleteRoleResponse>, ApiError> {
    current.require(Operation::DeleteRole)?;
    let usecase = DeleteRoleUseCase {
        roles: state.role_repo(),
    };
    let invalidated_users = usecase.execute(role_id).await?;
    Ok(Json(DeleteRoleResponse { invalidated_users }))
}

// ── GET /roles/templates ─────────────────────────────────────────────────────

pub async fn list_role_templates(
    current: CurrentUser,
) -> Result<Json<BTreeMap<&'static str, RoleTemplate>>, ApiError> {
    current.require(Operation::ListRoleTemplates)?;
    Ok(Json(list_templates().iter().map(|t| (t.key, *t)).collect()))
}

// ── POST /roles/from-template/{template_key} ─────────────────────────────────

pub async fn create_role_from_template(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(template_key): Path<String>,
) -> Result<Json<RoleWriteResponse>, ApiError> {
    current.require(Operation::CreateRoleFromTemplate)?;
    let usecase = CreateRoleFromTemplateUseCase {
        roles: state.role_repo(),
    };
    Ok(Json(usecase.execute(&template_key).await?.into()))
}

// ── GET /roles/scopes/available ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct ScopesResponse {
    pub scopes: Vec<String>,
}

pub async fn list_scopes(current: CurrentUser) -> Result<Json<ScopesResponse>, ApiError> {
    current.require(Operation::ListAvailableScopes)?;
    Ok(Json(ScopesResponse {
        scopes: list_available_scopes().into_iter().collect(),
    }))
}
