use super::{VideoAsset, YoutubeUrl};
use crate::{Error, Result, config::VideoConfig};
use async_trait::async_trait;
use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};
use tokio::process::Command;
use tracing::{debug, error, info};

/// Highest-resolution progressive stream, falling back to whatever is best.
const FORMAT_SELECTOR: &str = "best[ext=mp4]/best";

#[async_trait]
pub trait VideoRetriever: Send + Sync {
    async fn fetch(&self, url: &YoutubeUrl) -> Result<VideoAsset>;
}

/// Downloads videos by shelling out to `yt-dlp`.
pub struct YtDlpRetriever {
    program: String,
    extra_args: Vec<String>,
    download_dir: PathBuf,
    timeout: Duration,
}

impl YtDlpRetriever {
    pub fn new(config: VideoConfig) -> Self {
        Self {
            program: config.yt_dlp_path,
            extra_args: config.extra_args,
            download_dir: config.download_dir,
            timeout: Duration::from_secs(config.download_timeout_secs),
        }
    }

    fn build_command(&self, url: &YoutubeUrl, workdir: &Path) -> Command {
        let template = workdir.join("%(id)s.%(ext)s");

        let mut command = Command::new(&self.program);
        command
            .args(&self.extra_args)
            .arg("--no-playlist")
            .arg("--no-progress")
            .arg("-f")
            .arg(FORMAT_SELECTOR)
            .arg("-o")
            .arg(template)
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// yt-dlp leaves `.part` and `.ytdl` files behind on partial downloads.
    async fn find_downloaded_file(workdir: &Path) -> Result<Option<(PathBuf, u64)>> {
        let mut entries = tokio::fs::read_dir(workdir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_partial = path
                .extension()
                .is_some_and(|ext| ext == "part" || ext == "ytdl");
            let metadata = entry.metadata().await?;
            if metadata.is_file() && !is_partial {
                return Ok(Some((path, metadata.len())));
            }
        }
        Ok(None)
    }
}

fn last_error_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no error output")
        .to_string()
}

#[async_trait]
impl VideoRetriever for YtDlpRetriever {
    async fn fetch(&self, url: &YoutubeUrl) -> Result<VideoAsset> {
        info!("Downloading YouTube video: {}", url);

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| {
                Error::retrieval(format!(
                    "cannot create download directory {}: {}",
                    self.download_dir.display(),
                    e
                ))
            })?;

        let workdir = tempfile::Builder::new()
            .prefix(&format!("{}-", url.video_id()))
            .tempdir_in(&self.download_dir)
            .map_err(|e| Error::retrieval(format!("cannot create download workdir: {}", e)))?;

        let mut command = self.build_command(url, workdir.path());
        debug!("Running {:?}", command);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!("Failed to start {}: {}", self.program, e);
                return Err(Error::retrieval(format!(
                    "failed to run {}: {}",
                    self.program, e
                )));
            }
            Err(_) => {
                error!("Download of {} timed out after {:?}", url, self.timeout);
                return Err(Error::retrieval(format!(
                    "download timed out after {} seconds",
                    self.timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let reason = last_error_line(&output.stderr);
            error!("YouTube video download failed for {}: {}", url, reason);
            return Err(Error::retrieval(reason));
        }

        let (path, size_bytes) = Self::find_downloaded_file(workdir.path())
            .await
            .map_err(|e| Error::retrieval(format!("cannot inspect download workdir: {}", e)))?
            .ok_or_else(|| Error::retrieval(format!("{} produced no video file", self.program)))?;

        info!("Video downloaded: {} ({} bytes)", path.display(), size_bytes);

        Ok(VideoAsset::new(url.as_str(), path, size_bytes, workdir))
    }
}
