use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use school_api::config::Config;
use school_api::db::pg::PgChatStore;
use school_api::db::store::ChatStore;
use school_api::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present, falling back to the crate directory.
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let db = school_api::db::pool::connect(&config.database_url, config.db_max_connections)
        .expect("failed to build connection pool");
    let store: Arc<dyn ChatStore> = Arc::new(PgChatStore::new(db));

    tracing::info!(base_url = ?config.base_url, "school-api configured");

    let state = AppState::new(store, config);
    let registry = state.chat.registry().clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(school_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "school-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            let closed = registry.close_all();
            tracing::info!(closed, "shutting down, closed chat connections");
        })
        .await
        .expect("server error");
}
