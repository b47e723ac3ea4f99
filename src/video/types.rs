use crate::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// A video downloaded for a single request.
///
/// The file lives in a private working directory that is removed when the
/// asset is released or dropped.
#[derive(Debug)]
pub struct VideoAsset {
    source_url: String,
    path: PathBuf,
    mime_type: String,
    size_bytes: u64,
    workdir: Option<TempDir>,
}

impl VideoAsset {
    pub fn new(
        source_url: impl Into<String>,
        path: PathBuf,
        size_bytes: u64,
        workdir: TempDir,
    ) -> Self {
        let mime_type = mime_guess::from_path(&path)
            .first()
            .filter(|mime| mime.type_() == mime_guess::mime::VIDEO)
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| "video/mp4".to_string());

        Self {
            source_url: source_url.into(),
            path,
            mime_type,
            size_bytes,
            workdir: Some(workdir),
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string())
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Removes the downloaded file and its working directory.
    pub fn release(mut self) -> Result<()> {
        if let Some(workdir) = self.workdir.take() {
            workdir.close()?;
            debug!("Released downloaded video: {}", self.path.display());
        }
        Ok(())
    }
}

impl Drop for VideoAsset {
    fn drop(&mut self) {
        if let Some(workdir) = self.workdir.take() {
            if let Err(e) = workdir.close() {
                warn!("Failed to remove downloaded video {}: {}", self.path.display(), e);
            }
        }
    }
}
