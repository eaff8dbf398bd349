//! Artwork resolver - one terminal image per playlist item.
//!
//! Picks the source chain for an item's resource kind and walks it in order:
//! 1. Local files: embedded metadata, then the file-type icon
//! 2. Video-host URLs: the video thumbnail
//! 3. Generic network URLs: nothing
//!
//! The first source that succeeds wins. If every source fails the item keeps
//! the placeholder it was given when resolution started.
//!
//! # Design
//!
//! Resolution never fails from the caller's point of view. Source errors are
//! logged and swallowed. Each item is resolved at most once: the item itself
//! arbitrates which caller owns the in-flight attempt, and any later call
//! gets the cached value back without touching a source. A cancelled
//! attempt records nothing, so the item can be resolved again later.

use std::path::PathBuf;
use std::sync::Arc;

use smallvec::SmallVec;
use tokio_util::sync::CancellationToken;

use super::sources::{
    ArtworkSource, FetchError, FilesystemIconSource, GenericFallbackSource, IconProvider,
    LocalMetadataSource, LoftyMetadataLoader, MetadataLoader, ThemeIconProvider,
    VideoHostThumbnailSource,
};
use super::{Artwork, ImageCrateDecoder, ImageDecoder};
use crate::config::{Config, VideoHostConfig};
use crate::playlist::{PlaylistItem, Resolution, ResourceKind};

/// Ordered list of sources tried for one resource kind.
pub type SourceChain = SmallVec<[Arc<dyn ArtworkSource>; 2]>;

/// External collaborators the standard sources are built on.
#[derive(Clone)]
pub struct Collaborators {
    pub metadata: Arc<dyn MetadataLoader>,
    pub decoder: Arc<dyn ImageDecoder>,
    pub icons: Arc<dyn IconProvider>,
}

impl Collaborators {
    /// lofty for tags, the `image` crate for decoding, icon themes for icons.
    pub fn system(icon_theme_dirs: Vec<PathBuf>) -> Self {
        let decoder: Arc<dyn ImageDecoder> = Arc::new(ImageCrateDecoder);
        Self {
            metadata: Arc::new(LoftyMetadataLoader),
            icons: Arc::new(ThemeIconProvider::new(icon_theme_dirs, decoder.clone())),
            decoder,
        }
    }
}

/// Source chains for every resource kind.
#[derive(Clone, Default)]
pub struct SourceChains {
    local: SourceChain,
    video_host: SourceChain,
    generic_network: SourceChain,
}

impl SourceChains {
    pub fn new(local: SourceChain, video_host: SourceChain, generic_network: SourceChain) -> Self {
        Self {
            local,
            video_host,
            generic_network,
        }
    }

    /// The standard precedence:
    /// local = metadata then file icon, video host = thumbnail,
    /// generic network = nothing.
    pub fn standard(video_host: &VideoHostConfig, collaborators: &Collaborators) -> Self {
        let metadata: Arc<dyn ArtworkSource> = Arc::new(LocalMetadataSource::new(
            collaborators.metadata.clone(),
            collaborators.decoder.clone(),
        ));
        let icon: Arc<dyn ArtworkSource> =
            Arc::new(FilesystemIconSource::new(collaborators.icons.clone()));
        let thumbnail: Arc<dyn ArtworkSource> = Arc::new(VideoHostThumbnailSource::new(
            video_host.thumbnail_host.clone(),
            video_host.quality,
        ));

        Self {
            local: SmallVec::from_iter([metadata, icon]),
            video_host: SmallVec::from_iter([thumbnail]),
            generic_network: SmallVec::new(),
        }
    }

    pub fn for_kind(&self, kind: ResourceKind) -> &SourceChain {
        match kind {
            ResourceKind::Local => &self.local,
            ResourceKind::VideoHost => &self.video_host,
            ResourceKind::GenericNetwork => &self.generic_network,
        }
    }
}

/// Resolves artwork for individual playlist items.
pub struct ArtworkResolver {
    chains: SourceChains,
    fallback: GenericFallbackSource,
}

impl ArtworkResolver {
    pub fn new(chains: SourceChains) -> Self {
        Self {
            chains,
            fallback: GenericFallbackSource,
        }
    }

    /// Resolver with the standard chains and system collaborators.
    pub fn from_config(config: &Config) -> Self {
        let collaborators = Collaborators::system(config.resolver.icon_theme_dirs());
        Self::new(SourceChains::standard(&config.video_host, &collaborators))
    }

    /// Resolve artwork for one item.
    ///
    /// Returns immediately with the cached value when the item already has
    /// artwork (including the placeholder of an attempt still in flight).
    /// Otherwise runs the item's source chain and stores the result.
    pub async fn resolve_one(&self, item: &PlaylistItem, cancel: &CancellationToken) -> Artwork {
        match item.begin_resolution() {
            Resolution::Cached(artwork) => {
                tracing::trace!(target: "artwork::resolver", path = item.path(), "Artwork already present");
                return artwork;
            }
            Resolution::Started => {}
        }

        let artwork = self.run_chain(item, cancel).await;
        if artwork.is_placeholder() && cancel.is_cancelled() {
            item.abandon_resolution();
        } else {
            item.settle(artwork.clone());
        }
        artwork
    }

    /// Resolve artwork for one item and hand it to `callback` exactly once.
    pub async fn resolve_one_with<F>(&self, item: &PlaylistItem, cancel: &CancellationToken, callback: F)
    where
        F: FnOnce(Artwork),
    {
        callback(self.resolve_one(item, cancel).await);
    }

    async fn run_chain(&self, item: &PlaylistItem, cancel: &CancellationToken) -> Artwork {
        let kind = item.resource_kind();

        for source in self.chains.for_kind(kind) {
            if cancel.is_cancelled() {
                tracing::debug!(target: "artwork::resolver", path = item.path(), "Resolution cancelled");
                break;
            }

            match source.resolve(item, cancel).await {
                Ok(artwork) => {
                    tracing::debug!(
                        target: "artwork::resolver",
                        path = item.path(),
                        source = source.name(),
                        origin = ?artwork.origin,
                        "Artwork resolved"
                    );
                    return artwork;
                }
                Err(e @ (FetchError::NoArtwork | FetchError::Cancelled)) => {
                    tracing::debug!(target: "artwork::resolver", path = item.path(), source = source.name(), "{}", e);
                }
                Err(e) => {
                    tracing::warn!(target: "artwork::resolver", path = item.path(), source = source.name(), error = %e, "Artwork source failed");
                }
            }
        }

        match self.fallback.resolve(item, cancel).await {
            Ok(artwork) => artwork,
            Err(_) => Artwork::placeholder(),
        }
    }
}
