//! `Authorization: Bearer <token>` parsing.

use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use http::HeaderMap;

/// Returns the bearer token from `headers`, or `None` when the header is
/// absent, uses another scheme, or is not valid header text.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_owned())
        .filter(|token| !token.is_empty())
}

/// Insert an `Authorization: Bearer` header for `token`.
pub fn insert_bearer(headers: &mut HeaderMap, token: &str) {
    if let Ok(auth) = Authorization::bearer(token) {
        headers.typed_insert(auth);
    }
}
