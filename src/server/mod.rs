use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod routes;

/// Server state
///
/// Holds configuration only; every request opens its own database
/// connection and nothing is shared across requests.
pub struct AppState {
    /// Directory holding the per-guild database files
    pub database_dir: PathBuf,
}

pub async fn start_server(
    port: u16,
    database_dir: PathBuf,
    frontend_dir: PathBuf,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState { database_dir });

    let app = Router::new()
        .route("/api/guilds", get(routes::list_guilds))
        .route("/api/guilds/{guild_db}/channels", get(routes::list_channels))
        .route(
            "/api/guilds/{guild_db}/channels/{channel_name}",
            get(routes::channel_messages),
        )
        .route("/api/guilds/{guild_db}/users", get(routes::list_users))
        .route("/api/guilds/{guild_db}/users/{user_id}", get(routes::user_profile))
        .fallback_service(ServeDir::new(frontend_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    println!("🌍 Guildhall API running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
