use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sea_orm::{DbErr, SqlErr, TransactionError};
use uuid::Uuid;

use potluck_auth_types::token::AuthError;
use potluck_core::error::error_response;

/// API service error variants.
///
/// Validation failures carry enough detail to fix the request. Authorization
/// failures are deliberately generic and never name the missing scope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // ── authentication ──
    #[error("could not validate credentials")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("token is stale, please sign in again")]
    StaleAuthVersion,
    #[error("incorrect email or password")]
    InvalidCredentials,
    #[error("inactive user")]
    InactiveUser,
    #[error("refresh token revoked")]
    RefreshTokenRevoked,
    #[error("incorrect password")]
    IncorrectPassword,
    #[error("not authorized")]
    Forbidden,

    // ── permissions ──
    #[error("invalid scopes: {}", .0.join(", "))]
    InvalidScope(Vec<String>),
    #[error("role not found")]
    RoleNotFound,
    #[error("role already exists")]
    RoleAlreadyExists,
    #[error("unknown role template: {0}")]
    TemplateNotFound(String),
    #[error("user not found")]
    UserNotFound,
    #[error("user already exists")]
    UserAlreadyExists,

    // ── recipes ──
    #[error("recipe not found")]
    RecipeNotFound,
    #[error("ingredient not found: {0}")]
    IngredientNotFound(Uuid),
    #[error("sub-recipe not found: {0}")]
    SubRecipeNotFound(Uuid),
    #[error("a recipe cannot include itself as a sub-recipe")]
    SelfReference,
    #[error("sub-recipe listed more than once: {0}")]
    DuplicateSubRecipe(Uuid),
    #[error("ingredient listed more than once: {0}")]
    DuplicateIngredient(Uuid),
    #[error("adding sub-recipe {sub} to {parent} would create a cycle")]
    CycleDetected { parent: Uuid, sub: Uuid },
    #[error("recipe graph references missing {0}")]
    DanglingReference(String),

    // ── games ──
    #[error("game session not found")]
    GameSessionNotFound,
    #[error("player not found")]
    PlayerNotFound,
    #[error("drink not found")]
    DrinkNotFound,
    #[error("drink already exists")]
    DrinkAlreadyExists,
    #[error("team not found")]
    TeamNotFound,

    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::StaleAuthVersion => "STALE_AUTH_VERSION",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InactiveUser => "INACTIVE_USER",
            Self::RefreshTokenRevoked => "REFRESH_TOKEN_REVOKED",
            Self::IncorrectPassword => "INCORRECT_PASSWORD",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidScope(_) => "INVALID_SCOPE",
            Self::RoleNotFound => "ROLE_NOT_FOUND",
            Self::RoleAlreadyExists => "ROLE_ALREADY_EXISTS",
            Self::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::RecipeNotFound => "RECIPE_NOT_FOUND",
            Self::IngredientNotFound(_) => "INGREDIENT_NOT_FOUND",
            Self::SubRecipeNotFound(_) => "SUB_RECIPE_NOT_FOUND",
            Self::SelfReference => "SELF_REFERENCE",
            Self::DuplicateSubRecipe(_) => "DUPLICATE_SUB_RECIPE",
            Self::DuplicateIngredient(_) => "DUPLICATE_INGREDIENT",
            Self::CycleDetected { .. } => "CYCLE_DETECTED",
            Self::DanglingReference(_) => "DANGLING_REFERENCE",
            Self::GameSessionNotFound => "GAME_SESSION_NOT_FOUND",
            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::DrinkNotFound => "DRINK_NOT_FOUND",
            Self::DrinkAlreadyExists => "DRINK_ALREADY_EXISTS",
            Self::TeamNotFound => "TEAM_NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidToken
            | Self::TokenExpired
            | Self::StaleAuthVersion
            | Self::RefreshTokenRevoked => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidCredentials
            | Self::InactiveUser
            | Self::IncorrectPassword
            | Self::InvalidScope(_)
            | Self::SelfReference
            | Self::DuplicateSubRecipe(_)
            | Self::DuplicateIngredient(_)
            | Self::CycleDetected { .. }
            | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::RoleNotFound
            | Self::TemplateNotFound(_)
            | Self::UserNotFound
            | Self::RecipeNotFound
            | Self::IngredientNotFound(_)
            | Self::SubRecipeNotFound(_)
            | Self::GameSessionNotFound
            | Self::PlayerNotFound
            | Self::DrinkNotFound
            | Self::TeamNotFound => StatusCode::NOT_FOUND,
            Self::RoleAlreadyExists | Self::UserAlreadyExists | Self::DrinkAlreadyExists => {
                StatusCode::CONFLICT
            }
            Self::DanglingReference(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Expired => Self::TokenExpired,
            AuthError::InvalidSignature | AuthError::Malformed => Self::InvalidToken,
            AuthError::Signing(e) => Self::Internal(anyhow::Error::new(e).context("sign token")),
        }
    }
}

/// Flatten a sea-orm transaction failure. Errors raised by the transaction
/// body come back unchanged; begin/commit failures become `Internal`.
pub fn from_txn(e: TransactionError<ApiError>) -> ApiError {
    match e {
        TransactionError::Connection(db) => {
            ApiError::Internal(anyhow::Error::new(db).context("transaction"))
        }
        TransactionError::Transaction(e) => e,
    }
}

/// Map a unique-constraint violation to `conflict`. Any other storage error
/// becomes `Internal` with `context` attached.
pub fn on_unique_violation(err: DbErr, conflict: ApiError, context: &'static str) -> ApiError {
    conflict_or_internal(err.sql_err(), err, conflict, context)
}

fn conflict_or_internal(
    sql_err: Option<SqlErr>,
    err: DbErr,
    conflict: ApiError,
    context: &'static str,
) -> ApiError {
    match sql_err {
        Some(SqlErr::UniqueConstraintViolation(_)) => conflict,
        _ => ApiError::Internal(anyhow::Error::new(err).context(context)),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // 4xx are expected client errors; TraceLayer already records them.
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
            }
            Self::DanglingReference(what) => {
                tracing::error!(missing = %what, kind = "DANGLING_REFERENCE", "recipe graph is inconsistent");
            }
            _ => {}
        }
        error_response(self.status(), self.kind(), self.to_string())
    }
}
