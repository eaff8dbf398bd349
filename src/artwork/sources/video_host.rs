//! Video-host thumbnails.
//!
//! Thumbnail URLs follow a fixed convention, so no lookup is needed:
//! `https://<host>/vi/<video id>/<quality>.jpg`. The source only builds the
//! URL; the image behind it is fetched lazily by whoever displays it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{ArtworkSource, FetchError};
use crate::artwork::{Artwork, ArtworkOrigin};
use crate::playlist::{PlaylistItem, extract_video_id};

/// Default thumbnail host.
pub const DEFAULT_THUMBNAIL_HOST: &str = "img.youtube.com";

/// Thumbnail quality tier.
///
/// Higher tiers aren't generated for every video; `Default` always exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailQuality {
    /// 480x360, always available (`0.jpg`)
    Default,
    /// 320x180 (`mqdefault.jpg`)
    Medium,
    /// 480x360 (`hqdefault.jpg`)
    High,
    /// 640x480 (`sddefault.jpg`)
    Standard,
    /// 1280x720 (`maxresdefault.jpg`)
    #[default]
    #[value(name = "maxres")]
    MaxRes,
}

impl ThumbnailQuality {
    /// File stem used in the thumbnail URL.
    pub fn file_stem(self) -> &'static str {
        match self {
            ThumbnailQuality::Default => "0",
            ThumbnailQuality::Medium => "mqdefault",
            ThumbnailQuality::High => "hqdefault",
            ThumbnailQuality::Standard => "sddefault",
            ThumbnailQuality::MaxRes => "maxresdefault",
        }
    }
}

/// Thumbnail artwork for video-host URLs.
#[derive(Debug, Clone)]
pub struct VideoHostThumbnailSource {
    host: String,
    quality: ThumbnailQuality,
}

impl VideoHostThumbnailSource {
    pub fn new(host: impl Into<String>, quality: ThumbnailQuality) -> Self {
        Self {
            host: host.into(),
            quality,
        }
    }

    /// Thumbnail URL for a video ID.
    pub fn thumbnail_url(&self, video_id: &str) -> String {
        format!(
            "https://{}/vi/{}/{}.jpg",
            self.host,
            video_id,
            self.quality.file_stem()
        )
    }
}

impl Default for VideoHostThumbnailSource {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_HOST, ThumbnailQuality::default())
    }
}

#[async_trait]
impl ArtworkSource for VideoHostThumbnailSource {
    fn name(&self) -> &'static str {
        "video-thumbnail"
    }

    async fn resolve(
        &self,
        item: &PlaylistItem,
        _cancel: &CancellationToken,
    ) -> Result<Artwork, FetchError> {
        let video_id = extract_video_id(item.path())
            .ok_or_else(|| FetchError::InvalidReference(item.path().to_string()))?;

        tracing::debug!(target: "artwork::sources", video_id = %video_id, "Video id extracted");

        Ok(Artwork::remote(
            self.thumbnail_url(&video_id),
            ArtworkOrigin::VideoThumbnail,
        ))
    }
}
