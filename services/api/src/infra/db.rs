use std::collections::BTreeSet;

use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel as _, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    UpdateMany,
};
use uuid::Uuid;

use potluck_api_schema::{refresh_tokens, roles, user_roles, users};

use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::types::{Role, RolePatch, User, UserPatch};
use crate::error::{ApiError, from_txn, on_unique_violation};

// ── Auth versioning ──────────────────────────────────────────────────────────

/// `UPDATE users SET auth_version = auth_version + 1
///  WHERE id IN (SELECT user_id FROM user_roles WHERE role_id = …)`.
pub(crate) fn bump_for_role_users_stmt(role_id: Uuid) -> UpdateMany<users::Entity> {
    users::Entity::update_many()
        .col_expr(
            users::Column::AuthVersion,
            Expr::col(users::Column::AuthVersion).add(1),
        )
        .filter(
            users::Column::Id.in_subquery(
                Query::select()
                    .column(user_roles::Column::UserId)
                    .from(user_roles::Entity)
                    .and_where(Expr::col(user_roles::Column::RoleId).eq(role_id))
                    .to_owned(),
            ),
        )
}

/// Bump `auth_version` for every holder of `role_id` in one statement.
///
/// Must run on the caller's transaction so the bump commits or rolls back
/// together with the role change that triggered it.
pub(crate) async fn bump_for_role_users<C: ConnectionTrait>(
    conn: &C,
    role_id: Uuid,
) -> Result<u64, DbErr> {
    let result = bump_for_role_users_stmt(role_id).exec(conn).await?;
    Ok(result.rows_affected)
}

async fn bump_user<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> Result<(), DbErr> {
    users::Entity::update_many()
        .col_expr(
            users::Column::AuthVersion,
            Expr::col(users::Column::AuthVersion).add(1),
        )
        .filter(users::Column::Id.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn revoke_refresh_tokens_for<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<u64, DbErr> {
    let result = refresh_tokens::Entity::update_many()
        .col_expr(refresh_tokens::Column::RevokedAt, Expr::value(Utc::now()))
        .filter(refresh_tokens::Column::UserId.eq(user_id))
        .filter(refresh_tokens::Column::RevokedAt.is_null())
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl DbUserRepository {
    async fn with_roles(&self, model: users::Model) -> Result<User, ApiError> {
        let role_ids: Vec<Uuid> = user_roles::Entity::find()
            .filter(user_roles::Column::UserId.eq(model.id))
            .all(&self.db)
            .await
            .context("list user roles")?
            .into_iter()
            .map(|m| m.role_id)
            .collect();
        let roles = if role_ids.is_empty() {
            Vec::new()
        } else {
            roles::Entity::find()
                .filter(roles::Column::Id.is_in(role_ids))
                .order_by_asc(roles::Column::Name)
                .all(&self.db)
                .await
                .context("load user roles")?
                .into_iter()
                .map(role_from_model)
                .collect()
        };
        Ok(user_from_model(model, roles))
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        match model {
            Some(m) => Ok(Some(self.with_roles(m).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        match model {
            Some(m) => Ok(Some(self.with_roles(m).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            full_name: Set(user.full_name.clone()),
            hashed_password: Set(user.hashed_password.clone()),
            is_active: Set(user.is_active),
            is_superuser: Set(user.is_superuser),
            custom_scopes: Set(scopes_to_json(&user.custom_scopes)),
            auth_version: Set(user.auth_version),
            created_at: Set(user.created_at),
        }
        .insert(&self.db)
        .await
        .map_err(|e| on_unique_violation(e, ApiError::UserAlreadyExists, "create user"))?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<User, ApiError> {
        let model = self
            .db
            .transaction::<_, users::Model, ApiError>(|txn| {
                let patch = patch.clone();
                Box::pin(async move {
                    let model = users::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock user for update")?
                        .ok_or(ApiError::UserNotFound)?;
                    let revoke = patch.revokes_sessions(model.is_active, model.is_superuser);
                    let next_version = model.auth_version + 1;

                    let mut am = model.clone().into_active_model();
                    if let Some(email) = patch.email.filter(|e| *e != model.email) {
                        am.email = Set(email);
                    }
                    if let Some(full_name) = patch.full_name {
                        am.full_name = Set(Some(full_name));
                    }
                    if let Some(hashed) = patch.hashed_password {
                        am.hashed_password = Set(hashed);
                    }
                    if let Some(active) = patch.is_active {
                        am.is_active = Set(active);
                    }
                    if let Some(superuser) = patch.is_superuser {
                        am.is_superuser = Set(superuser);
                    }
                    if revoke {
                        am.auth_version = Set(next_version);
                    }
                    if !am.is_changed() {
                        return Ok(model);
                    }

                    let stored = am.update(txn).await.map_err(|e| {
                        on_unique_violation(e, ApiError::UserAlreadyExists, "update user")
                    })?;
                    if revoke {
                        let revoked = revoke_refresh_tokens_for(txn, id)
                            .await
                            .context("revoke refresh tokens")?;
                        tracing::info!(user_id = %id, revoked, "user sessions revoked");
                    }
                    Ok(stored)
                })
            })
            .await
            .map_err(from_txn)?;
        self.with_roles(model).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected > 0)
    }

    async fn add_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, ApiError> {
        let membership = user_roles::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id),
        };
        let inserted = user_roles::Entity::insert(membership)
            .on_conflict(
                OnConflict::columns([user_roles::Column::UserId, user_roles::Column::RoleId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("add user role")?;
        Ok(inserted > 0)
    }

    async fn remove_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, ApiError> {
        self.db
            .transaction::<_, bool, ApiError>(|txn| {
                Box::pin(async move {
                    let result = user_roles::Entity::delete_many()
                        .filter(user_roles::Column::UserId.eq(user_id))
                        .filter(user_roles::Column::RoleId.eq(role_id))
                        .exec(txn)
                        .await
                        .context("remove user role")?;
                    let removed = result.rows_affected > 0;
                    if removed {
                        bump_user(txn, user_id)
                            .await
                            .context("bump auth version after role removal")?;
                    }
                    Ok(removed)
                })
            })
            .await
            .map_err(from_txn)
    }

    async fn grant_custom_scope(&self, user_id: Uuid, scope: &str) -> Result<bool, ApiError> {
        let scope = scope.to_owned();
        self.db
            .transaction::<_, bool, ApiError>(|txn| {
                Box::pin(async move {
                    let model = users::Entity::find_by_id(user_id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock user for scope grant")?
                        .ok_or(ApiError::UserNotFound)?;
                    let mut scopes = scopes_from_json(&model.custom_scopes);
                    if !scopes.insert(scope) {
                        return Ok(false);
                    }
                    let mut am = model.into_active_model();
                    am.custom_scopes = Set(scopes_to_json(&scopes));
                    am.update(txn).await.context("grant custom scope")?;
                    Ok(true)
                })
            })
            .await
            .map_err(from_txn)
    }

    async fn revoke_custom_scope(&self, user_id: Uuid, scope: &str) -> Result<bool, ApiError> {
        let scope = scope.to_owned();
        self.db
            .transaction::<_, bool, ApiError>(|txn| {
                Box::pin(async move {
                    let model = users::Entity::find_by_id(user_id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock user for scope revoke")?
                        .ok_or(ApiError::UserNotFound)?;
                    let mut scopes = scopes_from_json(&model.custom_scopes);
                    if !scopes.remove(&scope) {
                        return Ok(false);
                    }
                    let next_version = model.auth_version + 1;
                    let mut am = model.into_active_model();
                    am.custom_scopes = Set(scopes_to_json(&scopes));
                    am.auth_version = Set(next_version);
                    am.update(txn).await.context("revoke custom scope")?;
                    Ok(true)
                })
            })
            .await
            .map_err(from_txn)
    }
}

fn user_from_model(model: users::Model, roles: Vec<Role>) -> User {
    User {
        id: model.id,
        custom_scopes: scopes_from_json(&model.custom_scopes),
        email: model.email,
        full_name: model.full_name,
        hashed_password: model.hashed_password,
        is_active: model.is_active,
        is_superuser: model.is_superuser,
        roles,
        auth_version: model.auth_version,
        created_at: model.created_at,
    }
}

// ── Role repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRoleRepository {
    pub db: DatabaseConnection,
}

impl RoleRepository for DbRoleRepository {
    async fn list(&self) -> Result<Vec<Role>, ApiError> {
        let models = roles::Entity::find()
            .order_by_asc(roles::Column::Name)
            .all(&self.db)
            .await
            .context("list roles")?;
        Ok(models.into_iter().map(role_from_model).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, ApiError> {
        let model = roles::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find role by id")?;
        Ok(model.map(role_from_model))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, ApiError> {
        let model = roles::Entity::find()
            .filter(roles::Column::Name.eq(name))
            .one(&self.db)
            .await
            .context("find role by name")?;
        Ok(model.map(role_from_model))
    }

    async fn create(&self, role: &Role) -> Result<(), ApiError> {
        role_active_model(role)
            .insert(&self.db)
            .await
            .map_err(|e| on_unique_violation(e, ApiError::RoleAlreadyExists, "create role"))?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &RolePatch) -> Result<(Role, u64), ApiError> {
        self.db
            .transaction::<_, (Role, u64), ApiError>(|txn| {
                let patch = patch.clone();
                Box::pin(async move {
                    let model = roles::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock role for update")?
                        .ok_or(ApiError::RoleNotFound)?;
                    // Compared against the locked row, not an earlier read.
                    let new_scopes = patch
                        .scopes
                        .filter(|scopes| *scopes != scopes_from_json(&model.scopes));

                    let mut am = model.clone().into_active_model();
                    if let Some(name) = patch.name.filter(|n| *n != model.name) {
                        let taken = roles::Entity::find()
                            .filter(roles::Column::Name.eq(name.as_str()))
                            .one(txn)
                            .await
                            .context("check role name")?
                            .is_some();
                        if taken {
                            return Err(ApiError::RoleAlreadyExists);
                        }
                        am.name = Set(name);
                    }
                    if let Some(description) = patch.description {
                        am.description = Set(Some(description));
                    }
                    if let Some(scopes) = &new_scopes {
                        am.scopes = Set(scopes_to_json(scopes));
                    }
                    if !am.is_changed() {
                        return Ok((role_from_model(model), 0));
                    }

                    let stored = am.update(txn).await.map_err(|e| {
                        on_unique_violation(e, ApiError::RoleAlreadyExists, "update role")
                    })?;
                    let bumped = if new_scopes.is_some() {
                        bump_for_role_users(txn, id)
                            .await
                            .context("bump role holders")?
                    } else {
                        0
                    };
                    Ok((role_from_model(stored), bumped))
                })
            })
            .await
            .map_err(from_txn)
    }

    async fn delete(&self, id: Uuid) -> Result<u64, ApiError> {
        self.db
            .transaction::<_, u64, ApiError>(|txn| {
                Box::pin(async move {
                    roles::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock role for delete")?
                        .ok_or(ApiError::RoleNotFound)?;
                    let bumped = bump_for_role_users(txn, id)
                        .await
                        .context("bump role holders before delete")?;
                    user_roles::Entity::delete_many()
                        .filter(user_roles::Column::RoleId.eq(id))
                        .exec(txn)
                        .await
                        .context("delete role memberships")?;
                    roles::Entity::delete_by_id(id)
                        .exec(txn)
                        .await
                        .context("delete role")?;
                    Ok(bumped)
                })
            })
            .await
            .map_err(from_txn)
    }

    async fn upsert_by_name(&self, role: &Role) -> Result<(Role, u64), ApiError> {
        self.db
            .transaction::<_, (Role, u64), ApiError>(|txn| {
                let role = role.clone();
                Box::pin(async move {
                    let existing = roles::Entity::find()
                        .filter(roles::Column::Name.eq(role.name.as_str()))
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock role for upsert")?;

                    let Some(existing) = existing else {
                        role_active_model(&role).insert(txn).await.map_err(|e| {
                            on_unique_violation(
                                e,
                                ApiError::RoleAlreadyExists,
                                "insert role from template",
                            )
                        })?;
                        return Ok((role, 0));
                    };

                    let mut am = existing.into_active_model();
                    am.description = Set(role.description.clone());
                    am.scopes = Set(scopes_to_json(&role.scopes));
                    let stored = am.update(txn).await.context("overwrite role from template")?;
                    let bumped = bump_for_role_users(txn, stored.id)
                        .await
                        .context("bump role holders after template upsert")?;
                    Ok((role_from_model(stored), bumped))
                })
            })
            .await
            .map_err(from_txn)
    }
}

fn role_active_model(role: &Role) -> roles::ActiveModel {
    roles::ActiveModel {
        id: Set(role.id),
        name: Set(role.name.clone()),
        description: Set(role.description.clone()),
        scopes: Set(scopes_to_json(&role.scopes)),
        created_at: Set(role.created_at),
    }
}

fn role_from_model(model: roles::Model) -> Role {
    Role {
        id: model.id,
        scopes: scopes_from_json(&model.scopes),
        name: model.name,
        description: model.description,
        created_at: model.created_at,
    }
}

// ── JSON scope columns ───────────────────────────────────────────────────────

/// Non-string array entries are ignored.
fn scopes_from_json(value: &serde_json::Value) -> BTreeSet<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

fn scopes_to_json(scopes: &BTreeSet<String>) -> serde_json::Value {
    serde_json::Value::from(scopes.iter().cloned().collect::<Vec<_>>())
}
