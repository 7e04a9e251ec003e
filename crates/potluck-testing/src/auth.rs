//! Signed-token helpers for integration tests.
//!
//! Requests against the API authenticate with a real HS256 bearer token, so
//! tests mint one with [`TEST_JWT_SECRET`] instead of going through login.

use http::HeaderMap;
use potluck_auth_types::bearer::insert_bearer;
use potluck_auth_types::token::{AccessClaims, issue_access_token};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "potluck-test-secret";

/// Identity a test request claims to be.
pub struct MockAuth {
    pub user_id: Uuid,
    pub scopes: Vec<String>,
    pub auth_version: i32,
}

impl MockAuth {
    pub fn new(user_id: Uuid, auth_version: i32) -> Self {
        Self {
            user_id,
            scopes: Vec::new(),
            auth_version,
        }
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = scopes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// A token signed with [`TEST_JWT_SECRET`], valid for an hour.
    pub fn token(&self) -> String {
        issue_access_token(
            self.user_id,
            self.scopes.clone(),
            self.auth_version,
            3600,
            TEST_JWT_SECRET,
        )
        .expect("sign test token")
        .token
    }

    /// A token whose `exp` is already in the past.
    pub fn expired_token(&self) -> String {
        let claims = AccessClaims {
            sub: self.user_id.to_string(),
            scopes: self.scopes.clone(),
            auth_version: self.auth_version,
            exp: 1_000_000,
        };
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .expect("sign expired test token")
    }

    /// Request headers carrying [`MockAuth::token`] as a bearer token.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        insert_bearer(&mut map, &self.token());
        map
    }
}
