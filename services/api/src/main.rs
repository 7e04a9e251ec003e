use std::time::Duration;

use sea_orm::Database;
use tracing::info;

use potluck_api::config::ApiConfig;
use potluck_api::realtime::ConnectionBroadcaster;
use potluck_api::router::build_router;
use potluck_api::state::AppState;

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    potluck_core::tracing::init_tracing("potluck_api=info,tower_http=info");

    let config = ApiConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let broadcaster = ConnectionBroadcaster::new();
    broadcaster.spawn_heartbeat(HEARTBEAT_PERIOD);

    let state = AppState {
        db,
        access_token_ttl_secs: config.access_token_ttl_secs(),
        refresh_token_ttl_secs: config.refresh_token_ttl_secs(),
        jwt_secret: config.jwt_secret,
        broadcaster,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.api_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("api service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
