use axum::extract::State;
use axum::http::StatusCode;
use sea_orm::DatabaseConnection;

use crate::error::AppError;

/// Handler for `GET /healthz`: liveness check.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Handler for `GET /readyz`: succeeds once the database answers a ping.
///
/// Router state must implement `FromRef` for [`DatabaseConnection`].
pub async fn readyz(State(db): State<DatabaseConnection>) -> Result<StatusCode, AppError> {
    db.ping()
        .await
        .map_err(|e| AppError::Unavailable(e.into()))?;
    Ok(StatusCode::OK)
}
