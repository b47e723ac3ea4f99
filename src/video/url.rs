use crate::{Error, Result};
use regex::Regex;
use reqwest::Url;
use std::{fmt, sync::LazyLock};

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id pattern"));

const LONG_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];

const SHORT_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Path prefixes on the long hosts that carry the id as the next segment.
const ID_PATH_PREFIXES: &[&str] = &["shorts", "embed", "live", "v"];

/// A syntactically valid YouTube video URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YoutubeUrl {
    url: Url,
    video_id: String,
}

impl YoutubeUrl {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::invalid_input("video URL must not be empty"));
        }

        let url = Url::parse(raw)
            .map_err(|e| Error::invalid_input(format!("malformed video URL '{}': {}", raw, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::invalid_input(format!(
                "unsupported URL scheme '{}'",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| Error::invalid_input(format!("video URL '{}' has no host", raw)))?;

        let candidate = if SHORT_HOSTS.contains(&host.as_str()) {
            url.path_segments()
                .and_then(|mut segments| segments.next())
                .map(str::to_string)
        } else if LONG_HOSTS.contains(&host.as_str()) {
            Self::long_form_id(&url)
        } else {
            return Err(Error::invalid_input(format!(
                "'{}' is not a YouTube host",
                host
            )));
        };

        match candidate {
            Some(id) if VIDEO_ID.is_match(&id) => Ok(Self { url, video_id: id }),
            _ => Err(Error::invalid_input(format!(
                "no video id found in '{}'",
                raw
            ))),
        }
    }

    fn long_form_id(url: &Url) -> Option<String> {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            ["watch"] => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            [prefix, id, ..] if ID_PATH_PREFIXES.contains(prefix) => Some((*id).to_string()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }
}

impl fmt::Display for YoutubeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
