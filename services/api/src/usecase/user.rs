use std::collections::BTreeSet;

use chrono::Utc;
use uuid::Uuid;

use potluck_domain::scope::USERS_READ;

use crate::domain::permission::has_scope;
use crate::domain::repository::UserRepository;
use crate::domain::types::{User, UserPatch};
use crate::error::ApiError;
use crate::password::{hash_password, verify_password};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 40;

fn checked_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    if !is_plausible_email(&email) {
        return Err(ApiError::InvalidInput(format!("invalid email: {email}")));
    }
    Ok(email)
}

fn checked_password(password: &str) -> Result<(), ApiError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(ApiError::InvalidInput(format!(
            "password must be {MIN_PASSWORD_LEN} to {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

// ── CreateUser ───────────────────────────────────────────────────────────────

pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub is_superuser: bool,
}

pub struct CreateUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> CreateUserUseCase<U> {
    pub async fn execute(&self, input: CreateUserInput) -> Result<User, ApiError> {
        let email = checked_email(&input.email)?;
        checked_password(&input.password)?;
        let user = User {
            id: Uuid::now_v7(),
            email,
            full_name: input.full_name,
            hashed_password: hash_password(&input.password)?,
            is_active: true,
            is_superuser: input.is_superuser,
            roles: Vec::new(),
            custom_scopes: BTreeSet::new(),
            auth_version: 1,
            created_at: Utc::now(),
        };
        self.users.create(&user).await?;
        tracing::info!(user_id = %user.id, is_superuser = user.is_superuser, "user created");
        Ok(user)
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

// ── Own account ──────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct UpdateMeInput {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

pub struct UpdateMeUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> UpdateMeUseCase<U> {
    /// `UserAlreadyExists` if the new email belongs to another account.
    pub async fn execute(&self, me: &User, input: UpdateMeInput) -> Result<User, ApiError> {
        let patch = UserPatch {
            email: input.email.as_deref().map(checked_email).transpose()?,
            full_name: input.full_name,
            ..Default::default()
        };
        self.users.update(me.id, &patch).await
    }
}

pub struct UpdatePasswordUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> UpdatePasswordUseCase<U> {
    /// The change bumps the caller's auth version and revokes their refresh
    /// tokens, so every session has to sign in again.
    pub async fn execute(
        &self,
        me: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        if !verify_password(current_password, &me.hashed_password)? {
            return Err(ApiError::IncorrectPassword);
        }
        if current_password == new_password {
            return Err(ApiError::InvalidInput(
                "new password cannot be the same as the current one".into(),
            ));
        }
        checked_password(new_password)?;
        let patch = UserPatch {
            hashed_password: Some(hash_password(new_password)?),
            ..Default::default()
        };
        self.users.update(me.id, &patch).await?;
        tracing::info!(user_id = %me.id, "password changed");
        Ok(())
    }
}

pub struct DeleteMeUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> DeleteMeUseCase<U> {
    /// Superusers cannot delete themselves.
    pub async fn execute(&self, me: &User) -> Result<(), ApiError> {
        if me.is_superuser {
            return Err(ApiError::Forbidden);
        }
        if !self.users.delete(me.id).await? {
            return Err(ApiError::UserNotFound);
        }
        tracing::info!(user_id = %me.id, "user deleted own account");
        Ok(())
    }
}

// ── Other accounts ───────────────────────────────────────────────────────────

pub struct GetUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetUserUseCase<U> {
    /// Anyone may read their own account; other accounts need `users:read`.
    pub async fn execute(&self, caller: &User, user_id: Uuid) -> Result<User, ApiError> {
        if caller.id != user_id && !has_scope(caller, USERS_READ) {
            return Err(ApiError::Forbidden);
        }
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

#[derive(Default)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
}

pub struct UpdateUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> UpdateUserUseCase<U> {
    /// Requires `users:update` at the edge. Changing `is_superuser`, or
    /// touching a superuser account at all, additionally needs a superuser.
    pub async fn execute(
        &self,
        caller: &User,
        user_id: Uuid,
        input: UpdateUserInput,
    ) -> Result<User, ApiError> {
        let target = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if (input.is_superuser.is_some() || target.is_superuser) && !caller.is_superuser {
            return Err(ApiError::Forbidden);
        }
        let hashed_password = match input.password.as_deref() {
            Some(password) => {
                checked_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };
        let patch = UserPatch {
            email: input.email.as_deref().map(checked_email).transpose()?,
            full_name: input.full_name,
            hashed_password,
            is_active: input.is_active,
            is_superuser: input.is_superuser,
        };
        let user = self.users.update(user_id, &patch).await?;
        tracing::info!(
            user_id = %user.id,
            updated_by = %caller.id,
            is_active = user.is_active,
            is_superuser = user.is_superuser,
            "user updated"
        );
        Ok(user)
    }
}

pub struct DeleteUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> DeleteUserUseCase<U> {
    /// Nobody deletes themselves here, and only superusers delete superusers.
    pub async fn execute(&self, caller: &User, user_id: Uuid) -> Result<(), ApiError> {
        if caller.id == user_id {
            return Err(ApiError::Forbidden);
        }
        let target = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if target.is_superuser && !caller.is_superuser {
            return Err(ApiError::Forbidden);
        }
        if !self.users.delete(user_id).await? {
            return Err(ApiError::UserNotFound);
        }
        tracing::info!(%user_id, deleted_by = %caller.id, "user deleted");
        Ok(())
    }
}
