use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use mcq_backend::{config::Config, routes, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let config = Config::from_env()?;

    let app_state = AppState::new(&config);

    let app = Router::new()
        .route("/", get(routes::health::health))
        .route("/health", get(routes::health::health))
        .route("/mcq/evaluate", post(routes::mcq::evaluate_mcq))
        .route("/sheets/upload", post(routes::sheets::upload_sheet))
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
