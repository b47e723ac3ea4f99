use std::sync::Arc;
use youtube_gemini::{
    analysis::Analyzer,
    config::{Config, GeminiConfig, LogsConfig, ServerConfig, VideoConfig},
};

use super::mocks::{MockInference, MockRetriever};

pub const VALID_URL: &str = "https://www.youtube.com/watch?v=-psgagqWoIo";

/// Create a test configuration with sensible defaults
pub fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8501,
            logs: LogsConfig {
                level: "debug".to_string(),
            },
        },
        gemini: GeminiConfig {
            api_key: "test-api-key".to_string(),
            ..GeminiConfig::default()
        },
        video: VideoConfig::default(),
    }
}

/// Build an analyzer around the given mocks, returning the shared handles
pub fn create_analyzer(
    retriever: MockRetriever,
    inference: MockInference,
) -> (Analyzer, Arc<MockRetriever>, Arc<MockInference>) {
    let retriever = Arc::new(retriever);
    let inference = Arc::new(inference);
    let analyzer = Analyzer::new(retriever.clone(), inference.clone());
    (analyzer, retriever, inference)
}

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 9000
  logs:
    level: "debug"
gemini:
  api_key: "file-key"
  model: "gemini-1.5-pro"
  generation_timeout_secs: 60
video:
  yt_dlp_path: "/usr/local/bin/yt-dlp"
  extra_args: ["--cookies", "cookies.txt"]
  download_dir: "/tmp/videos"
"#;
