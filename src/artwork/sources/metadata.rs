//! Artwork embedded in local media containers.
//!
//! Metadata is loaded asynchronously by a [`MetadataLoader`], which reports
//! progress through a `watch` channel. The source waits once for a terminal
//! status and then picks the first artwork entry from a recognized tag
//! namespace (ID3 or iTunes-style MP4 atoms).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, TagType};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::{ArtworkSource, FetchError};
use crate::artwork::{Artwork, ArtworkOrigin, ImageDecoder};
use crate::playlist::PlaylistItem;

/// Metadata key of embedded pictures.
pub const ARTWORK_KEY: &str = "artwork";

/// Tag namespace an entry was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataNamespace {
    /// ID3v2 frames (MP3, AIFF, WAV)
    Id3,
    /// iTunes-style MP4 atoms (M4A, MP4)
    ITunes,
    /// Anything else (Vorbis comments, APE, ...)
    Other(String),
}

impl MetadataNamespace {
    /// Whether artwork from this namespace is trusted.
    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Id3 | Self::ITunes)
    }
}

/// One common-metadata entry of a media container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub namespace: MetadataNamespace,
    pub key: String,
    pub raw_bytes: Vec<u8>,
}

impl MetadataEntry {
    pub fn new(namespace: MetadataNamespace, key: impl Into<String>, raw_bytes: Vec<u8>) -> Self {
        Self {
            namespace,
            key: key.into(),
            raw_bytes,
        }
    }

    /// An embedded picture entry.
    pub fn artwork(namespace: MetadataNamespace, raw_bytes: Vec<u8>) -> Self {
        Self::new(namespace, ARTWORK_KEY, raw_bytes)
    }
}

/// Progress of an asynchronous metadata load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Unknown,
    Loading,
    /// Entries in container order
    Loaded(Arc<Vec<MetadataEntry>>),
    Failed(String),
    Cancelled,
}

impl LoadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Loaded(_) | Self::Failed(_) | Self::Cancelled)
    }
}

/// Loads the common metadata of a media container.
pub trait MetadataLoader: Send + Sync {
    /// Start loading; the receiver reports status changes until a terminal
    /// status. A sender dropped before that means the load was abandoned.
    fn load_common_metadata(&self, path: &Path) -> watch::Receiver<LoadStatus>;
}

/// Metadata loader backed by lofty, run on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyMetadataLoader;

impl MetadataLoader for LoftyMetadataLoader {
    fn load_common_metadata(&self, path: &Path) -> watch::Receiver<LoadStatus> {
        let (tx, rx) = watch::channel(LoadStatus::Unknown);
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            tx.send_replace(LoadStatus::Loading);
            let status = match read_common_metadata(&path) {
                Ok(entries) => LoadStatus::Loaded(Arc::new(entries)),
                Err(e) => LoadStatus::Failed(e.to_string()),
            };
            tx.send_replace(status);
        });

        rx
    }
}

fn read_common_metadata(path: &Path) -> lofty::error::Result<Vec<MetadataEntry>> {
    let tagged_file = Probe::open(path)?.read()?;
    let mut entries = Vec::new();

    for tag in tagged_file.tags() {
        let namespace = match tag.tag_type() {
            TagType::Id3v2 => MetadataNamespace::Id3,
            TagType::Mp4Ilst => MetadataNamespace::ITunes,
            other => MetadataNamespace::Other(format!("{:?}", other)),
        };

        let text_fields = [
            ("title", tag.title()),
            ("artist", tag.artist()),
            ("albumName", tag.album()),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                entries.push(MetadataEntry::new(
                    namespace.clone(),
                    key,
                    value.as_bytes().to_vec(),
                ));
            }
        }

        for picture in tag.pictures() {
            entries.push(MetadataEntry::artwork(
                namespace.clone(),
                picture.data().to_vec(),
            ));
        }
    }

    Ok(entries)
}

/// Artwork embedded in a local file's tags.
pub struct LocalMetadataSource {
    loader: Arc<dyn MetadataLoader>,
    decoder: Arc<dyn ImageDecoder>,
}

impl LocalMetadataSource {
    pub fn new(loader: Arc<dyn MetadataLoader>, decoder: Arc<dyn ImageDecoder>) -> Self {
        Self { loader, decoder }
    }

    /// First artwork entry from a recognized namespace, container order.
    fn pick_artwork(entries: &[MetadataEntry]) -> Option<&MetadataEntry> {
        entries
            .iter()
            .filter(|entry| entry.key == ARTWORK_KEY)
            .find(|entry| entry.namespace.is_recognized())
    }
}

#[async_trait]
impl ArtworkSource for LocalMetadataSource {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn resolve(
        &self,
        item: &PlaylistItem,
        cancel: &CancellationToken,
    ) -> Result<Artwork, FetchError> {
        let path = item.local_path();
        let mut rx = self.loader.load_common_metadata(&path);

        let terminal = async {
            rx.wait_for(LoadStatus::is_terminal)
                .await
                .map(|status| (*status).clone())
                // Loader went away without finishing
                .unwrap_or(LoadStatus::Cancelled)
        };

        let status = tokio::select! {
            _ = cancel.cancelled() => LoadStatus::Cancelled,
            status = terminal => status,
        };

        match status {
            LoadStatus::Loaded(entries) => {
                tracing::debug!(target: "artwork::sources", path = %path.display(), entries = entries.len(), "Metadata loaded");
                let entry = Self::pick_artwork(&entries).ok_or(FetchError::NoArtwork)?;
                let image = self
                    .decoder
                    .decode(&entry.raw_bytes)
                    .ok_or(FetchError::NoArtwork)?;
                Ok(Artwork::decoded(image, ArtworkOrigin::Embedded))
            }
            LoadStatus::Failed(reason) => Err(FetchError::MetadataLoadFailed(reason)),
            LoadStatus::Cancelled => Err(FetchError::Cancelled),
            // wait_for only returns terminal statuses
            LoadStatus::Unknown | LoadStatus::Loading => Err(FetchError::Cancelled),
        }
    }
}
