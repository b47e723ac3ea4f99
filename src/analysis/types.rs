use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub video_url: String,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub answer_text: String,
}

impl AnalysisRequest {
    pub fn new(video_url: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            video_url: video_url.into(),
            question: question.into(),
        }
    }
}
