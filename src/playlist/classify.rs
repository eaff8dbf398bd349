//! Resource classification for playlist entries.
//!
//! Decides where a playlist entry comes from so the resolver can pick the
//! right artwork sources:
//! - **Local** - plain filesystem paths and `file://` URLs
//! - **VideoHost** - YouTube watch/share URLs (thumbnail can be derived)
//! - **GenericNetwork** - every other URL (streams, radio, HTTP files)

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Where a playlist entry's media lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A file on the local filesystem
    Local,
    /// A URL on a recognized video host
    VideoHost,
    /// Any other network URL
    #[serde(rename = "network")]
    GenericNetwork,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Local => "local",
            ResourceKind::VideoHost => "videohost",
            ResourceKind::GenericNetwork => "network",
        };
        f.write_str(name)
    }
}

/// Anything with a scheme separator is treated as a URL.
static URL_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z][a-z0-9+.\-]*://").expect("static regex")
});

/// Hosts whose thumbnails follow the `/vi/<id>/<quality>.jpg` convention.
static VIDEO_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:www|m|music)\.)?(?:youtube\.com|youtube-nocookie\.com|youtu\.be)$")
        .expect("static regex")
});

/// Valid video IDs are short URL-safe tokens.
static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("static regex"));

/// Classify a playlist path or URL.
///
/// Total and side-effect free: unmatched URLs are `GenericNetwork`,
/// everything that doesn't look like a URL is `Local`.
pub fn classify(path: &str) -> ResourceKind {
    let path = path.trim();
    if !URL_SCHEME.is_match(path) {
        return ResourceKind::Local;
    }

    let Ok(url) = Url::parse(path) else {
        return ResourceKind::GenericNetwork;
    };

    if url.scheme() == "file" {
        return ResourceKind::Local;
    }

    match url.host_str() {
        Some(host) if VIDEO_HOST.is_match(host) => ResourceKind::VideoHost,
        _ => ResourceKind::GenericNetwork,
    }
}

/// Extract the video ID from a video-host URL.
///
/// Watch URLs carry the ID in the `v` query parameter; share and embed URLs
/// carry it as the last path segment.
pub fn extract_video_id(reference: &str) -> Option<String> {
    let url = Url::parse(reference.trim()).ok()?;

    let candidate = url
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .or_else(|| {
            let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
            urlencoding::decode(segment).ok().map(|s| s.into_owned())
        })?;

    VIDEO_ID.is_match(&candidate).then_some(candidate)
}
