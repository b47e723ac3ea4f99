pub mod handlers;
pub mod types;

use crate::{
    Result,
    analysis::Analyzer,
    config::Config,
    gemini::GeminiClient,
    video::YtDlpRetriever,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub fn router(analyzer: Arc<Analyzer>) -> Router {
    let app_state = handlers::AppState { analyzer };

    Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn run(config: Config) -> Result<()> {
    let retriever = YtDlpRetriever::new(config.video.clone());
    let inference = GeminiClient::new(config.gemini.clone())?;
    info!("Using Gemini model: {}", inference.model());

    let analyzer = Analyzer::new(Arc::new(retriever), Arc::new(inference));
    let app = router(Arc::new(analyzer));

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
