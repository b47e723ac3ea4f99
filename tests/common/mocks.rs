use async_trait::async_trait;
use std::{
    path::PathBuf,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use youtube_gemini::{
    Error, Result,
    gemini::InferenceClient,
    video::{VideoAsset, VideoRetriever, YoutubeUrl},
};

/// Mock video retriever that writes a small fake file into a temp dir
#[derive(Debug, Default)]
pub struct MockRetriever {
    pub calls: AtomicUsize,
    pub error: Option<String>,
    pub fetched_paths: Mutex<Vec<PathBuf>>,
    pub fetched_urls: Mutex<Vec<String>>,
}

impl MockRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fetched_paths(&self) -> Vec<PathBuf> {
        self.fetched_paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoRetriever for MockRetriever {
    async fn fetch(&self, url: &YoutubeUrl) -> Result<VideoAsset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fetched_urls.lock().unwrap().push(url.to_string());

        if let Some(ref error) = self.error {
            return Err(Error::retrieval(error.clone()));
        }

        let workdir = tempfile::tempdir()?;
        let path = workdir.path().join(format!("{}.mp4", url.video_id()));
        std::fs::write(&path, b"fake video bytes")?;
        self.fetched_paths.lock().unwrap().push(path.clone());

        Ok(VideoAsset::new(url.as_str(), path, 16, workdir))
    }
}

/// Mock inference client returning a canned answer or error
#[derive(Debug, Default)]
pub struct MockInference {
    pub answer: String,
    pub error: Option<String>,
    pub questions: Mutex<Vec<String>>,
    pub seen_video_existed: Mutex<Vec<bool>>,
}

impl MockInference {
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Self::default()
        }
    }

    pub fn failing(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.questions.lock().unwrap().len()
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for MockInference {
    async fn answer(&self, video: &VideoAsset, question: &str) -> Result<String> {
        self.questions.lock().unwrap().push(question.to_string());
        self.seen_video_existed
            .lock()
            .unwrap()
            .push(video.path().exists());

        if let Some(ref error) = self.error {
            return Err(Error::inference(error.clone()));
        }
        Ok(self.answer.clone())
    }
}
