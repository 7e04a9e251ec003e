use axum::extract::{Form, FromRequestParts, State};
use axum::Json;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use potluck_auth_types::bearer::bearer_token;

use crate::domain::permission::require_scope;
use crate::domain::types::User;
use crate::error::ApiError;
use crate::handlers::scopes::Operation;
use crate::state::AppState;
use crate::usecase::auth::{
    AuthorizeUseCase, LoginInput, LoginUseCase, LogoutUseCase, RefreshTokenUseCase,
};

/// The authenticated caller, re-resolved from storage on every request.
///
/// Rejects with 401 when the bearer token is missing, invalid, expired or
/// issued before the user's last permission revocation.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn require(&self, op: Operation) -> Result<(), ApiError> {
        require_scope(&self.0, op.scope())
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    // Headers and state are read synchronously so the returned future does
    // not borrow `parts`.
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = bearer_token(&parts.headers);
        let usecase = AuthorizeUseCase {
            users: state.user_repo(),
            jwt_secret: state.jwt_secret.clone(),
        };
        async move {
            let token = token.ok_or(ApiError::InvalidToken)?;
            let user = usecase.execute(&token).await?;
            Ok(Self(user))
        }
    }
}

// ── POST /login/access-token ─────────────────────────────────────────────────

/// OAuth2 password-grant form; `username` carries the email.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access-token expiry, seconds since the epoch.
    pub expires_at: u64,
}

pub async fn login_access_token(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        tokens: state.refresh_token_repo(),
        jwt_secret: state.jwt_secret.clone(),
        access_token_ttl_secs: state.access_token_ttl_secs,
        refresh_token_ttl_secs: state.refresh_token_ttl_secs,
    };
    let output = usecase
        .execute(LoginInput {
            email: form.username,
            password: form.password,
        })
        .await?;
    Ok(Json(TokenResponse {
        access_token: output.access_token,
        refresh_token: output.refresh_token,
        token_type: "bearer",
        expires_at: output.access_token_exp,
    }))
}

// ── POST /login/refresh ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

pub async fn refresh_access_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = body.refresh_token.ok_or(ApiError::InvalidToken)?;
    let usecase = RefreshTokenUseCase {
        users: state.user_repo(),
        tokens: state.refresh_token_repo(),
        jwt_secret: state.jwt_secret.clone(),
        access_token_ttl_secs: state.access_token_ttl_secs,
        refresh_token_ttl_secs: state.refresh_token_ttl_secs,
    };
    let output = usecase.execute(&token).await?;
    Ok(Json(TokenResponse {
        access_token: output.access_token,
        refresh_token: output.refresh_token,
        token_type: "bearer",
        expires_at: output.access_token_exp,
    }))
}

// ── POST /logout ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct LogoutResponse {
    pub message: &'static str,
}

/// The body is optional; without a refresh token there is nothing to revoke.
pub async fn logout(
    State(state): State<AppState>,
    body: Option<Json<RefreshRequest>>,
) -> Result<Json<LogoutResponse>, ApiError> {
    let token = body.and_then(|Json(b)| b.refresh_token);
    let usecase = LogoutUseCase {
        tokens: state.refresh_token_repo(),
    };
    usecase.execute(token.as_deref()).await?;
    Ok(Json(LogoutResponse {
        message: "Logged out",
    }))
}
