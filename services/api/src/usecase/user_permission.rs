use std::collections::BTreeSet;

use crate::domain::permission::{effective_scopes, validate_scopes};
use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::types::{Role, User};
use crate::error::ApiError;

/// Role memberships are addressed by user email and role name.
pub struct RoleAssignment {
    pub user_email: String,
    pub role_name: String,
}

pub struct ScopeGrant {
    pub user_email: String,
    pub scope: String,
}

async fn user_by_email<U: UserRepository>(users: &U, email: &str) -> Result<User, ApiError> {
    users
        .find_by_email(&email.trim().to_lowercase())
        .await?
        .ok_or(ApiError::UserNotFound)
}

async fn role_by_name<R: RoleRepository>(roles: &R, name: &str) -> Result<Role, ApiError> {
    roles
        .find_by_name(name)
        .await?
        .ok_or(ApiError::RoleNotFound)
}

// ── AssignRole ───────────────────────────────────────────────────────────────

pub struct AssignRoleUseCase<U: UserRepository, R: RoleRepository> {
    pub users: U,
    pub roles: R,
}

impl<U: UserRepository, R: RoleRepository> AssignRoleUseCase<U, R> {
    /// Idempotent. Returns `true` if the user did not hold the role before.
    pub async fn execute(&self, input: RoleAssignment) -> Result<bool, ApiError> {
        let user = user_by_email(&self.users, &input.user_email).await?;
        let role = role_by_name(&self.roles, &input.role_name).await?;
        self.users.add_role(user.id, role.id).await
    }
}

// ── RemoveRole ───────────────────────────────────────────────────────────────

pub struct RemoveRoleUseCase<U: UserRepository, R: RoleRepository> {
    pub users: U,
    pub roles: R,
}

impl<U: UserRepository, R: RoleRepository> RemoveRoleUseCase<U, R> {
    /// Idempotent. An actual removal bumps the user's auth version.
    pub async fn execute(&self, input: RoleAssignment) -> Result<bool, ApiError> {
        let user = user_by_email(&self.users, &input.user_email).await?;
        let role = role_by_name(&self.roles, &input.role_name).await?;
        let removed = self.users.remove_role(user.id, role.id).await?;
        if removed {
            tracing::info!(user_id = %user.id, role_id = %role.id, "role removed from user");
        }
        Ok(removed)
    }
}

// ── GrantScope / RevokeScope ─────────────────────────────────────────────────

pub struct GrantScopeUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GrantScopeUseCase<U> {
    pub async fn execute(&self, input: ScopeGrant) -> Result<bool, ApiError> {
        validate_scopes([input.scope.as_str()])?;
        let user = user_by_email(&self.users, &input.user_email).await?;
        self.users.grant_custom_scope(user.id, &input.scope).await
    }
}

pub struct RevokeScopeUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> RevokeScopeUseCase<U> {
    /// Revoking a scope the user doesn't hold is a successful no-op.
    pub async fn execute(&self, input: ScopeGrant) -> Result<bool, ApiError> {
        let user = user_by_email(&self.users, &input.user_email).await?;
        let revoked = self
            .users
            .revoke_custom_scope(user.id, &input.scope)
            .await?;
        if revoked {
            tracing::info!(user_id = %user.id, scope = %input.scope, "custom scope revoked");
        }
        Ok(revoked)
    }
}

// ── GetUserPermissions ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UserPermissions {
    pub user: User,
    pub effective_scopes: BTreeSet<String>,
}

pub struct GetUserPermissionsUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetUserPermissionsUseCase<U> {
    pub async fn execute(&self, email: &str) -> Result<UserPermissions, ApiError> {
        let user = user_by_email(&self.users, email).await?;
        let effective_scopes = effective_scopes(&user);
        Ok(UserPermissions {
            user,
            effective_scopes,
        })
    }
}
