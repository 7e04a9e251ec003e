use chrono::{DateTime, Utc};
use uuid::Uuid;

use potluck_auth_types::token::{
    IssuedToken, hash_token, issue_access_token, issue_refresh_token, validate_access_token,
    validate_refresh_token,
};

use crate::domain::permission::effective_scopes;
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::domain::types::{RefreshTokenRecord, User};
use crate::error::ApiError;
use crate::password::verify_password;

fn access_token_for(user: &User, ttl_secs: u64, secret: &str) -> Result<IssuedToken, ApiError> {
    let scopes = effective_scopes(user).into_iter().collect();
    Ok(issue_access_token(
        user.id,
        scopes,
        user.auth_version,
        ttl_secs,
        secret,
    )?)
}

/// Sign a refresh token for `user_id` and build the record that tracks it.
fn refresh_token_for(
    user_id: Uuid,
    ttl_secs: u64,
    secret: &str,
) -> Result<(IssuedToken, RefreshTokenRecord), ApiError> {
    let issued = issue_refresh_token(user_id, ttl_secs, secret)?;
    let now = Utc::now();
    let expires_at = i64::try_from(issued.exp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(now);
    let record = RefreshTokenRecord {
        id: Uuid::now_v7(),
        user_id,
        token_hash: hash_token(&issued.token),
        expires_at,
        revoked_at: None,
        created_at: now,
    };
    Ok((issued, record))
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
    pub refresh_token_exp: u64,
}

pub struct LoginUseCase<U: UserRepository, T: RefreshTokenRepository> {
    pub users: U,
    pub tokens: T,
    pub jwt_secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
}

impl<U: UserRepository, T: RefreshTokenRepository> LoginUseCase<U, T> {
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, ApiError> {
        let email = input.email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;
        if !verify_password(&input.password, &user.hashed_password)? {
            return Err(ApiError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(ApiError::InactiveUser);
        }

        let access = access_token_for(&user, self.access_token_ttl_secs, &self.jwt_secret)?;
        let (refresh, record) =
            refresh_token_for(user.id, self.refresh_token_ttl_secs, &self.jwt_secret)?;
        self.tokens.store(&record).await?;
        tracing::info!(user_id = %user.id, "access token issued");
        Ok(LoginOutput {
            user,
            access_token: access.token,
            access_token_exp: access.exp,
            refresh_token: refresh.token,
            refresh_token_exp: refresh.exp,
        })
    }
}

// ── Refresh ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RefreshOutput {
    pub user_id: Uuid,
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
    pub refresh_token_exp: u64,
}

/// Trade a live refresh token for a new access token. The presented refresh
/// token is revoked and replaced by a new one; presenting it again fails.
pub struct RefreshTokenUseCase<U: UserRepository, T: RefreshTokenRepository> {
    pub users: U,
    pub tokens: T,
    pub jwt_secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
}

impl<U: UserRepository, T: RefreshTokenRepository> RefreshTokenUseCase<U, T> {
    pub async fn execute(&self, refresh_token: &str) -> Result<RefreshOutput, ApiError> {
        let info = validate_refresh_token(refresh_token, &self.jwt_secret)?;
        let old_hash = hash_token(refresh_token);
        let record = self
            .tokens
            .find_by_hash(&old_hash)
            .await?
            .filter(|r| r.user_id == info.user_id && r.revoked_at.is_none())
            .ok_or(ApiError::RefreshTokenRevoked)?;
        if !record.is_active(Utc::now()) {
            return Err(ApiError::TokenExpired);
        }

        let user = self
            .users
            .find_by_id(info.user_id)
            .await?
            .ok_or(ApiError::InvalidToken)?;
        if !user.is_active {
            return Err(ApiError::InactiveUser);
        }

        let access = access_token_for(&user, self.access_token_ttl_secs, &self.jwt_secret)?;
        let (refresh, next) =
            refresh_token_for(user.id, self.refresh_token_ttl_secs, &self.jwt_secret)?;
        // Another request may have rotated the same token since the lookup.
        if !self.tokens.rotate(&old_hash, &next).await? {
            return Err(ApiError::RefreshTokenRevoked);
        }
        tracing::info!(user_id = %user.id, "refresh token rotated");
        Ok(RefreshOutput {
            user_id: user.id,
            access_token: access.token,
            access_token_exp: access.exp,
            refresh_token: refresh.token,
            refresh_token_exp: refresh.exp,
        })
    }
}

// ── Logout ───────────────────────────────────────────────────────────────────

pub struct LogoutUseCase<T: RefreshTokenRepository> {
    pub tokens: T,
}

impl<T: RefreshTokenRepository> LogoutUseCase<T> {
    /// Revoke `refresh_token` if one is given. Unknown or already revoked
    /// tokens are not an error. Returns whether a record was revoked.
    pub async fn execute(&self, refresh_token: Option<&str>) -> Result<bool, ApiError> {
        let Some(token) = refresh_token else {
            return Ok(false);
        };
        let revoked = self.tokens.revoke(&hash_token(token)).await?;
        if revoked {
            tracing::info!("refresh token revoked on logout");
        }
        Ok(revoked)
    }
}

// ── Authorize ────────────────────────────────────────────────────────────────

/// Resolve a bearer token to the stored user it was issued for.
///
/// Scopes are never taken from the token: the returned user carries its
/// current roles and custom scopes.
pub struct AuthorizeUseCase<U: UserRepository> {
    pub users: U,
    pub jwt_secret: String,
}

impl<U: UserRepository> AuthorizeUseCase<U> {
    pub async fn execute(&self, token: &str) -> Result<User, ApiError> {
        let info = validate_access_token(token, &self.jwt_secret)?;
        let user = self
            .users
            .find_by_id(info.user_id)
            .await?
            .ok_or(ApiError::InvalidToken)?;
        if !user.is_active {
            return Err(ApiError::InactiveUser);
        }
        if info.auth_version != user.auth_version {
            tracing::debug!(
                user_id = %user.id,
                token_version = info.auth_version,
                stored_version = user.auth_version,
                "stale access token"
            );
            return Err(ApiError::StaleAuthVersion);
        }
        Ok(user)
    }
}
