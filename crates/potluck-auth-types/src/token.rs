//! JWT access and refresh tokens.

use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// `token_type` claim carried by every refresh token.
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Identity carried by a validated access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub user_id: Uuid,
    /// Scopes the user held at issuance. Informational only: request-time
    /// checks re-resolve scopes from the stored user.
    pub scopes: Vec<String>,
    pub auth_version: i32,
    pub exp: u64,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub exp: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | user id (UUID string) |
/// | `scopes` | custom | effective scopes at issuance |
/// | `auth_version` | custom | the user's auth version at issuance |
/// | `exp` | `exp` | expiry, seconds since epoch |
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub auth_version: i32,
    pub exp: u64,
}

/// Refresh token claims. `jti` keeps two tokens minted in the same second
/// for the same user distinct.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub token_type: String,
    pub jti: Uuid,
    pub exp: u64,
}

/// Identity carried by a validated refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshInfo {
    pub user_id: Uuid,
    pub exp: u64,
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Sign an HS256 access token valid for `ttl_secs` from now.
pub fn issue_access_token(
    user_id: Uuid,
    scopes: Vec<String>,
    auth_version: i32,
    ttl_secs: u64,
    secret: &str,
) -> Result<IssuedToken, AuthError> {
    let exp = now_secs() + ttl_secs;
    let claims = AccessClaims {
        sub: user_id.to_string(),
        scopes,
        auth_version,
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(AuthError::Signing)?;
    Ok(IssuedToken { token, exp })
}

/// Sign an HS256 refresh token valid for `ttl_secs` from now.
pub fn issue_refresh_token(
    user_id: Uuid,
    ttl_secs: u64,
    secret: &str,
) -> Result<IssuedToken, AuthError> {
    let exp = now_secs() + ttl_secs;
    let claims = RefreshClaims {
        sub: user_id.to_string(),
        token_type: REFRESH_TOKEN_TYPE.to_owned(),
        jti: Uuid::new_v4(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(AuthError::Signing)?;
    Ok(IssuedToken { token, exp })
}

/// Lowercase hex SHA-256 of `token`. Refresh tokens are stored and looked up
/// by this value only.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Validation: HS256, exp checked with zero leeway, required claims `exp` + `sub`.
fn decode_claims<C: DeserializeOwned>(token: &str, secret: &str) -> Result<C, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<C>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    Ok(data.claims)
}

/// Verify signature and expiry and parse the identity out of `token`.
///
/// Does not consult storage; the caller still has to compare `auth_version`
/// against the stored user.
pub fn validate_access_token(token: &str, secret: &str) -> Result<TokenInfo, AuthError> {
    let claims: AccessClaims = decode_claims(token, secret)?;
    let user_id = claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AuthError::Malformed)?;
    Ok(TokenInfo {
        user_id,
        scopes: claims.scopes,
        auth_version: claims.auth_version,
        exp: claims.exp,
    })
}

/// Verify signature, expiry and `token_type`. Access tokens are rejected as
/// `Malformed`. Does not consult storage.
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<RefreshInfo, AuthError> {
    let claims: RefreshClaims = decode_claims(token, secret)?;
    if claims.token_type != REFRESH_TOKEN_TYPE {
        return Err(AuthError::Malformed);
    }
    let user_id = claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AuthError::Malformed)?;
    Ok(RefreshInfo {
        user_id,
        exp: claims.exp,
    })
}
