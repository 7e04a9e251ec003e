use std::collections::BTreeSet;

use chrono::Utc;
use uuid::Uuid;

use potluck_domain::role_template::{ROLE_TEMPLATES, RoleTemplate, find_template};
use potluck_domain::scope::all_scopes;

use crate::domain::permission::validate_scopes;
use crate::domain::repository::RoleRepository;
use crate::domain::types::{Role, RolePatch};
use crate::error::ApiError;

/// A stored role plus how many users had their auth version bumped by the
/// write that produced it.
#[derive(Debug, Clone)]
pub struct RoleWrite {
    pub role: Role,
    pub bumped_users: u64,
}

pub fn list_templates() -> &'static [RoleTemplate] {
    ROLE_TEMPLATES
}

pub fn list_available_scopes() -> BTreeSet<String> {
    all_scopes()
}

// ── ListRoles / GetRole ──────────────────────────────────────────────────────

pub struct ListRolesUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> ListRolesUseCase<R> {
    pub async fn execute(&self) -> Result<Vec<Role>, ApiError> {
        self.roles.list().await
    }
}

pub struct GetRoleUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> GetRoleUseCase<R> {
    pub async fn execute(&self, role_id: Uuid) -> Result<Role, ApiError> {
        self.roles
            .find_by_id(role_id)
            .await?
            .ok_or(ApiError::RoleNotFound)
    }
}

// ── CreateRole ───────────────────────────────────────────────────────────────

pub struct CreateRoleInput {
    pub name: String,
    pub description: Option<String>,
    pub scopes: Vec<String>,
}

pub struct CreateRoleUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> CreateRoleUseCase<R> {
    pub async fn execute(&self, input: CreateRoleInput) -> Result<Role, ApiError> {
        let name = checked_name(&input.name)?;
        validate_scopes(&input.scopes)?;
        let role = Role {
            id: Uuid::now_v7(),
            name,
            description: input.description,
            scopes: input.scopes.into_iter().collect(),
            created_at: Utc::now(),
        };
        self.roles.create(&role).await?;
        Ok(role)
    }
}

// ── UpdateRole ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct UpdateRoleInput {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Replaces the whole scope set.
    pub scopes: Option<Vec<String>>,
}

pub struct UpdateRoleUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> UpdateRoleUseCase<R> {
    pub async fn execute(&self, role_id: Uuid, input: UpdateRoleInput) -> Result<RoleWrite, ApiError> {
        apply_role_update(&self.roles, role_id, input).await
    }
}

pub struct UpdateRoleScopesUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> UpdateRoleScopesUseCase<R> {
    pub async fn execute(&self, role_id: Uuid, scopes: Vec<String>) -> Result<RoleWrite, ApiError> {
        let input = UpdateRoleInput {
            scopes: Some(scopes),
            ..Default::default()
        };
        apply_role_update(&self.roles, role_id, input).await
    }
}

async fn apply_role_update<R: RoleRepository>(
    roles: &R,
    role_id: Uuid,
    input: UpdateRoleInput,
) -> Result<RoleWrite, ApiError> {
    if let Some(scopes) = &input.scopes {
        validate_scopes(scopes)?;
    }
    let patch = RolePatch {
        name: input.name.as_deref().map(checked_name).transpose()?,
        description: input.description,
        scopes: input.scopes.map(|scopes| scopes.into_iter().collect()),
    };
    // Read, compare and write happen under the repository's row lock.
    let (role, bumped_users) = roles.update(role_id, &patch).await?;
    if patch.scopes.is_some() {
        tracing::info!(role_id = %role.id, bumped_users, "role scopes written");
    }
    Ok(RoleWrite { role, bumped_users })
}

// ── DeleteRole ───────────────────────────────────────────────────────────────

pub struct DeleteRoleUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> DeleteRoleUseCase<R> {
    /// Returns the number of former holders whose tokens were invalidated.
    pub async fn execute(&self, role_id: Uuid) -> Result<u64, ApiError> {
        let bumped_users = self.roles.delete(role_id).await?;
        tracing::info!(%role_id, bumped_users, "role deleted");
        Ok(bumped_users)
    }
}

// ── Templates ────────────────────────────────────────────────────────────────

pub struct CreateRoleFromTemplateUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> CreateRoleFromTemplateUseCase<R> {
    pub async fn execute(&self, template_key: &str) -> Result<RoleWrite, ApiError> {
        let template = find_template(template_key)
            .ok_or_else(|| ApiError::TemplateNotFound(template_key.to_owned()))?;
        upsert_template(&self.roles, template).await
    }
}

pub struct InitializeDefaultRolesUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> InitializeDefaultRolesUseCase<R> {
    pub async fn execute(&self) -> Result<Vec<RoleWrite>, ApiError> {
        let mut written = Vec::with_capacity(ROLE_TEMPLATES.len());
        for template in ROLE_TEMPLATES {
            written.push(upsert_template(&self.roles, template).await?);
        }
        Ok(written)
    }
}

async fn upsert_template<R: RoleRepository>(
    roles: &R,
    template: &RoleTemplate,
) -> Result<RoleWrite, ApiError> {
    let role = Role {
        id: Uuid::now_v7(),
        name: template.name.to_owned(),
        description: Some(template.description.to_owned()),
        scopes: template.scopes.iter().map(|s| (*s).to_owned()).collect(),
        created_at: Utc::now(),
    };
    let (role, bumped_users) = roles.upsert_by_name(&role).await?;
    tracing::info!(template = template.key, role_id = %role.id, bumped_users, "role template applied");
    Ok(RoleWrite { role, bumped_users })
}

fn checked_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("role name must not be empty".into()));
    }
    Ok(name.to_owned())
}
