use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Build the `{kind, message}` JSON error body every Potluck endpoint returns.
pub fn error_response(status: StatusCode, kind: &str, message: String) -> Response {
    let body = serde_json::json!({
        "kind": kind,
        "message": message,
    });
    (status, axum::Json(body)).into_response()
}

/// Errors raised by the shared health endpoints.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("service unavailable")]
    Unavailable(#[source] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "UNAVAILABLE",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Unavailable(e) = &self;
        ::tracing::warn!(error = %e, kind = self.kind(), "dependency unavailable");
        error_response(self.status(), self.kind(), self.to_string())
    }
}
