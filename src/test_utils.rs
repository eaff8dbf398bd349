//! Test utilities and fixtures for playlist-artwork tests.
//!
//! This module provides mock collaborators and image fixtures so resolver
//! and coordinator tests don't touch real media files or the network.
//!
//! # Example
//!
//! ```ignore
//! use playlist_artwork::test_utils::{MockMetadataLoader, png_bytes};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let loader = MockMetadataLoader::immediate(LoadStatus::Loaded(Default::default()));
//!     let art = png_bytes(16);
//!     // ... test logic
//! }
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::artwork::sources::{
    ArtworkSource, FetchError, IconProvider, LoadStatus, MetadataLoader,
};
use crate::artwork::{Artwork, DecodedImage, ImageCrateDecoder, ImageDecoder, render_placeholder};
use crate::playlist::PlaylistItem;

/// PNG bytes of a `px x px` image.
///
/// Different sizes give different bytes, which is what icon hash
/// comparisons need.
pub fn png_bytes(px: u32) -> Vec<u8> {
    render_placeholder(px).expect("Failed to render test PNG")
}

/// A decoded `px x px` PNG.
pub fn png_image(px: u32) -> DecodedImage {
    ImageCrateDecoder
        .decode(&png_bytes(px))
        .expect("Failed to decode test PNG")
}

// ============================================================================
// Metadata loader
// ============================================================================

enum Script {
    /// Publish one status right away, then drop the sender.
    Immediate(LoadStatus),
    /// Publish each status after its delay, then drop the sender.
    Timed(Vec<(Duration, LoadStatus)>),
    /// Stay in `Loading` forever.
    Stalled,
}

/// Metadata loader replaying a fixed script of statuses.
///
/// Each call spawns a task driving a fresh watch channel, so the mock
/// behaves like a real asynchronous loader.
pub struct MockMetadataLoader {
    script: Script,
    calls: AtomicUsize,
}

impl MockMetadataLoader {
    pub fn immediate(status: LoadStatus) -> Self {
        Self::with_script(Script::Immediate(status))
    }

    pub fn scripted(steps: Vec<(Duration, LoadStatus)>) -> Self {
        Self::with_script(Script::Timed(steps))
    }

    pub fn stalled() -> Self {
        Self::with_script(Script::Stalled)
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of metadata loads requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetadataLoader for MockMetadataLoader {
    fn load_common_metadata(&self, _path: &Path) -> watch::Receiver<LoadStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.script {
            Script::Immediate(status) => {
                let (tx, rx) = watch::channel(status.clone());
                drop(tx);
                rx
            }
            Script::Timed(steps) => {
                let (tx, rx) = watch::channel(LoadStatus::Unknown);
                let steps = steps.clone();
                tokio::spawn(async move {
                    for (delay, status) in steps {
                        tokio::time::sleep(delay).await;
                        tx.send_replace(status);
                    }
                });
                rx
            }
            Script::Stalled => {
                let (tx, rx) = watch::channel(LoadStatus::Loading);
                tokio::spawn(async move {
                    tx.closed().await;
                });
                rx
            }
        }
    }
}

// ============================================================================
// Icon provider
// ============================================================================

/// Icon provider with fixed icons.
pub struct MockIconProvider {
    icon: Option<DecodedImage>,
    generic: Option<DecodedImage>,
    calls: AtomicUsize,
    generic_calls: AtomicUsize,
}

impl MockIconProvider {
    pub fn new(icon: Option<DecodedImage>, generic: Option<DecodedImage>) -> Self {
        Self {
            icon,
            generic,
            calls: AtomicUsize::new(0),
            generic_calls: AtomicUsize::new(0),
        }
    }

    /// Provider that knows no icons at all.
    pub fn empty() -> Self {
        Self::new(None, None)
    }

    /// Number of file icon lookups so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of generic icon lookups so far.
    pub fn generic_calls(&self) -> usize {
        self.generic_calls.load(Ordering::SeqCst)
    }
}

impl IconProvider for MockIconProvider {
    fn icon_for_file(&self, _path: &Path) -> Option<DecodedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.icon.clone()
    }

    fn generic_document_icon(&self) -> Option<DecodedImage> {
        self.generic_calls.fetch_add(1, Ordering::SeqCst);
        self.generic.clone()
    }
}

// ============================================================================
// Artwork source
// ============================================================================

/// Artwork source returning a fixed result, optionally after a delay.
///
/// Tracks how many resolutions ran and the peak number running at once.
pub struct CountingSource {
    result: Result<Artwork, FetchError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl CountingSource {
    pub fn succeeding(artwork: Artwork) -> Self {
        Self::with_result(Ok(artwork))
    }

    pub fn failing(error: FetchError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<Artwork, FetchError>) -> Self {
        Self {
            result,
            delay: None,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Sleep this long before answering (cancellation aborts the sleep).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of resolutions observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtworkSource for CountingSource {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn resolve(
        &self,
        _item: &PlaylistItem,
        cancel: &CancellationToken,
    ) -> Result<Artwork, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let outcome = match self.delay {
            Some(delay) => tokio::select! {
                _ = cancel.cancelled() => Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => self.result.clone(),
            },
            None => self.result.clone(),
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_sizes_differ() {
        assert_ne!(png_bytes(8), png_bytes(12));
        assert_eq!(png_image(8).width, 8);
    }

    #[tokio::test]
    async fn test_immediate_loader_is_terminal() {
        let loader = MockMetadataLoader::immediate(LoadStatus::Failed("x".into()));
        let rx = loader.load_common_metadata(Path::new("/a.mp3"));
        assert!(rx.borrow().is_terminal());
        assert_eq!(loader.calls(), 1);
    }

    #[tokio::test]
    async fn test_counting_source_counts() {
        let source = CountingSource::failing(FetchError::NoArtwork);
        let item = PlaylistItem::new("/a.mp3");
        let _ = source.resolve(&item, &CancellationToken::new()).await;
        let _ = source.resolve(&item, &CancellationToken::new()).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(source.peak_concurrency(), 1);
    }
}
