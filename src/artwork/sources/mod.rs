//! Artwork sources.
//!
//! Each source knows how to produce artwork for one kind of playlist item.
//! Sources are combined into ordered fallback chains by the resolver; a
//! source failing is never fatal, the resolver just moves on.
//!
//! - [`LocalMetadataSource`] - artwork embedded in local media tags
//! - [`FilesystemIconSource`] - the OS icon for a local file's type
//! - [`VideoHostThumbnailSource`] - thumbnail URL derived from a video ID
//! - [`GenericFallbackSource`] - the placeholder, never fails

mod file_icon;
mod metadata;
mod placeholder;
mod video_host;

pub use file_icon::{
    FilesystemIconSource, IconProvider, ThemeIconProvider, content_hash, default_icon_theme_dirs,
};
pub use metadata::{
    LoadStatus, LocalMetadataSource, LoftyMetadataLoader, MetadataEntry, MetadataLoader,
    MetadataNamespace,
};
pub use placeholder::GenericFallbackSource;
pub use video_host::{DEFAULT_THUMBNAIL_HOST, ThumbnailQuality, VideoHostThumbnailSource};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::Artwork;
use crate::playlist::PlaylistItem;

/// Why a source produced no artwork.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("No usable artwork found")]
    NoArtwork,

    #[error("Metadata load failed: {0}")]
    MetadataLoadFailed(String),

    #[error("Artwork fetch cancelled")]
    Cancelled,

    #[error("Invalid media reference: {0}")]
    InvalidReference(String),

    #[error("Image could not be decoded: {0}")]
    DecodeFailed(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// A way of producing artwork for a playlist item.
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Try to produce artwork for `item`.
    ///
    /// Implementations that wait on anything must give up with
    /// [`FetchError::Cancelled`] once `cancel` fires.
    async fn resolve(
        &self,
        item: &PlaylistItem,
        cancel: &CancellationToken,
    ) -> Result<Artwork, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FetchError::MetadataLoadFailed("unsupported container".to_string());
        assert!(err.to_string().contains("unsupported container"));

        let err = FetchError::InvalidReference("https://youtu.be/".to_string());
        assert!(err.to_string().contains("youtu.be"));
    }
}
