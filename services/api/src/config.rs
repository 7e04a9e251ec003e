/// API service configuration loaded from environment variables.
#[derive(Debug)]
pub struct ApiConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing access tokens.
    pub jwt_secret: String,
    /// TCP port to listen on (default 3114). Env var: `API_PORT`.
    pub api_port: u16,
    /// Access-token lifetime in minutes (default 60).
    /// Env var: `ACCESS_TOKEN_EXPIRE_MINUTES`.
    pub access_token_expire_minutes: u64,
    /// Refresh-token lifetime in days (default 7).
    /// Env var: `REFRESH_TOKEN_EXPIRE_DAYS`.
    pub refresh_token_expire_days: u64,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            api_port: std::env::var("API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3114),
            access_token_expire_minutes: std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            refresh_token_expire_days: std::env::var("REFRESH_TOKEN_EXPIRE_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
        }
    }

    pub fn access_token_ttl_secs(&self) -> u64 {
        self.access_token_expire_minutes * 60
    }

    pub fn refresh_token_ttl_secs(&self) -> u64 {
        self.refresh_token_expire_days * 24 * 60 * 60
    }
}
