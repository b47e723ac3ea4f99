use super::types::{ApiError, HealthResponse};
use crate::analysis::{AnalysisRequest, AnalysisResponse, Analyzer};
use axum::{extract::State, response::Json};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("analyze", %request_id);

    async move {
        info!("Received analysis request for video: {}", request.video_url);

        match state.analyzer.analyze(&request).await {
            Ok(response) => {
                info!("Successfully answered request");
                Ok(Json(response))
            }
            Err(e) => {
                error!("Failed to answer request: {}", e);
                Err(ApiError(e))
            }
        }
    }
    .instrument(span)
    .await
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
