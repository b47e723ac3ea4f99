use super::types::*;
use crate::{Error, Result, config::GeminiConfig, video::VideoAsset};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::{Body, Response, header::CONTENT_LENGTH};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Asks `question` about `video` and returns the model's answer text.
    async fn answer(&self, video: &VideoAsset, question: &str) -> Result<String>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    poll_interval: Duration,
    activation_timeout: Duration,
    generation_timeout: Duration,
}

fn transport_error(stage: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::inference(format!("{} timed out: {}", stage, err))
    } else {
        Error::inference(format!("{} request failed: {}", stage, err))
    }
}

async fn check_status(response: Response, stage: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.error.message)
        .unwrap_or(body);

    Err(Error::inference(format!(
        "{} returned {}: {}",
        stage,
        status,
        message.trim()
    )))
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            activation_timeout: Duration::from_secs(config.activation_timeout_secs),
            generation_timeout: Duration::from_secs(config.generation_timeout_secs),
        })
    }

    /// Overrides the polling cadence; the config only speaks whole seconds.
    pub fn with_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.activation_timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn upload(&self, video: &VideoAsset) -> Result<UploadedFile> {
        let length = video.size_bytes();
        let display_name = video.file_name();

        debug!("Starting resumable upload of {} ({} bytes)", display_name, length);

        let start = self
            .http
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", length.to_string())
            .header("X-Goog-Upload-Header-Content-Type", video.mime_type())
            .json(&UploadMetadata {
                file: UploadMetadataFile {
                    display_name: &display_name,
                },
            })
            .send()
            .await
            .map_err(|e| transport_error("upload start", e))?;
        let start = check_status(start, "upload start").await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| Error::inference("upload start response carried no upload URL"))?;

        let file = tokio::fs::File::open(video.path())
            .await
            .map_err(|e| Error::inference(format!("cannot open downloaded video: {}", e)))?;

        let finish = self
            .http
            .post(upload_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_LENGTH, length.to_string())
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(Body::from(file))
            .send()
            .await
            .map_err(|e| transport_error("upload", e))?;
        let finish = check_status(finish, "upload").await?;

        let uploaded: UploadResponse = finish
            .json()
            .await
            .map_err(|e| Error::inference(format!("malformed upload response: {}", e)))?;

        info!("Uploaded video as {}", uploaded.file.name);
        Ok(uploaded.file)
    }

    pub async fn get_file(&self, name: &str) -> Result<UploadedFile> {
        let response = self
            .http
            .get(format!("{}/v1beta/{}", self.base_url, name))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| transport_error("file status", e))?;
        let response = check_status(response, "file status").await?;

        response
            .json()
            .await
            .map_err(|e| Error::inference(format!("malformed file status: {}", e)))
    }

    /// Polls until the uploaded file can be referenced in a prompt.
    pub async fn wait_until_active(&self, mut file: UploadedFile) -> Result<UploadedFile> {
        info!("Waiting for {} to become active", file.name);
        let deadline = Instant::now() + self.activation_timeout;

        loop {
            match file.state {
                FileState::Active => {
                    info!("File {} is active", file.name);
                    return Ok(file);
                }
                FileState::Failed => {
                    let reason = file
                        .error
                        .and_then(|status| status.message)
                        .unwrap_or_else(|| "no reason given".to_string());
                    return Err(Error::inference(format!(
                        "processing of {} failed: {}",
                        file.name, reason
                    )));
                }
                FileState::Processing | FileState::StateUnspecified => {}
            }

            if Instant::now() >= deadline {
                return Err(Error::inference(format!(
                    "{} did not become active within {} seconds",
                    file.name,
                    self.activation_timeout.as_secs()
                )));
            }

            tokio::time::sleep(self.poll_interval).await;
            file = self.get_file(&file.name).await?;
        }
    }

    pub async fn generate(
        &self,
        file: &UploadedFile,
        question: &str,
        mime_type: &str,
    ) -> Result<String> {
        let request = GenerateContentRequest::for_video(question, file, mime_type);

        debug!("Requesting streamed answer from {}", self.model);

        let response = self
            .http
            .post(format!(
                "{}/v1beta/models/{}:streamGenerateContent",
                self.base_url, self.model
            ))
            .query(&[("alt", "sse")])
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.generation_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("generation", e))?;
        let response = check_status(response, "generation").await?;

        let mut stream = response.bytes_stream().eventsource();
        let mut answer = String::new();

        while let Some(event) = stream.next().await {
            let event =
                event.map_err(|e| Error::inference(format!("answer stream broke: {}", e)))?;
            if event.data.trim().is_empty() {
                continue;
            }

            let chunk: GenerateContentResponse = serde_json::from_str(&event.data)
                .map_err(|e| Error::inference(format!("malformed answer chunk: {}", e)))?;

            if let Some(status) = chunk.error.as_ref() {
                let message = status.message.as_deref().unwrap_or("no message given");
                return Err(Error::inference(format!(
                    "answer stream reported an error: {}",
                    message
                )));
            }

            if let Some(reason) = chunk.block_reason() {
                return Err(Error::inference(format!("prompt was blocked: {}", reason)));
            }

            answer.push_str(&chunk.text());
        }

        if answer.is_empty() {
            return Err(Error::inference("model returned an empty answer"));
        }

        info!("Received answer ({} chars)", answer.chars().count());
        Ok(answer)
    }

    pub async fn delete_file(&self, name: &str) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/v1beta/{}", self.base_url, name))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| transport_error("file delete", e))?;
        check_status(response, "file delete").await?;

        debug!("Deleted uploaded file {}", name);
        Ok(())
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn answer(&self, video: &VideoAsset, question: &str) -> Result<String> {
        let uploaded = self.upload(video).await?;
        let name = uploaded.name.clone();

        let result = async {
            let active = self.wait_until_active(uploaded).await?;
            self.generate(&active, question, video.mime_type()).await
        }
        .await;

        if let Err(e) = self.delete_file(&name).await {
            warn!("Failed to delete uploaded file {}: {}", name, e);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_test_config() -> GeminiConfig {
        GeminiConfig {
            api_key: "test-api-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com/".to_string(),
            ..GeminiConfig::default()
        }
    }

    #[test]
    fn test_client_creation_trims_base_url() {
        let client = GeminiClient::new(create_test_config()).unwrap();
        assert_eq!(client.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(client.model(), "gemini-2.0-flash");
        assert_eq!(client.generation_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_with_polling_overrides_config() {
        let client = GeminiClient::new(create_test_config())
            .unwrap()
            .with_polling(Duration::from_millis(10), Duration::from_millis(50));
        assert_eq!(client.poll_interval, Duration::from_millis(10));
        assert_eq!(client.activation_timeout, Duration::from_millis(50));
    }
}
