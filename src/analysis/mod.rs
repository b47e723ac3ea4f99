mod types;

pub use types::*;

use crate::{
    Error, Result,
    gemini::InferenceClient,
    video::{VideoRetriever, YoutubeUrl},
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs one request through download, inference and cleanup.
#[derive(Clone)]
pub struct Analyzer {
    retriever: Arc<dyn VideoRetriever>,
    inference: Arc<dyn InferenceClient>,
}

impl Analyzer {
    pub fn new(retriever: Arc<dyn VideoRetriever>, inference: Arc<dyn InferenceClient>) -> Self {
        Self {
            retriever,
            inference,
        }
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        let (url, question) = validate(request)?;

        info!("Starting analysis of {}", url);

        let video = self.retriever.fetch(&url).await?;

        let answer = self.inference.answer(&video, question).await;

        if let Err(e) = video.release() {
            warn!("Failed to release downloaded video: {}", e);
        }

        match answer {
            Ok(answer_text) => {
                info!("Analysis of {} completed", url);
                Ok(AnalysisResponse { answer_text })
            }
            Err(e) => {
                error!("Analysis of {} failed: {}", url, e);
                Err(e)
            }
        }
    }
}

/// Rejects the request before any collaborator is contacted.
pub fn validate(request: &AnalysisRequest) -> Result<(YoutubeUrl, &str)> {
    let url = YoutubeUrl::parse(&request.video_url)?;
    if request.question.trim().is_empty() {
        return Err(Error::invalid_input("question must not be empty"));
    }
    Ok((url, request.question.as_str()))
}
