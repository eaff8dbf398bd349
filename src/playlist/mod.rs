//! Playlist items and their artwork state.
//!
//! A playlist is an ordered list of media references: local files, generic
//! network URLs and video-host URLs. Each item is classified once, at
//! construction, and carries the artwork resolved for it.
//!
//! Items are shared as `Arc<PlaylistItem>` between the playlist, the
//! resolver and any presentation code reading the artwork. The artwork slot
//! is the only mutable part and moves `absent -> placeholder -> final`.

mod classify;

pub use classify::{ResourceKind, classify, extract_video_id};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use crate::artwork::Artwork;
use crate::error::{Error, Result, ResultExt};

/// One entry of a playlist.
#[derive(Debug)]
pub struct PlaylistItem {
    path: String,
    display_title: Option<String>,
    resource_kind: ResourceKind,
    artwork: Mutex<ArtworkSlot>,
}

#[derive(Debug, Default)]
struct ArtworkSlot {
    artwork: Option<Artwork>,
    in_flight: bool,
}

/// Outcome of trying to start a resolution on an item.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Artwork is already present (final, or the placeholder of an
    /// in-flight attempt); nothing new was started.
    Cached(Artwork),
    /// The caller now owns the single in-flight attempt for this item.
    Started,
}

impl PlaylistItem {
    /// Create an item for a path or URL.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            resource_kind: classify(&path),
            path,
            display_title: None,
            artwork: Mutex::new(ArtworkSlot::default()),
        }
    }

    /// Create an item with a user-facing title override.
    pub fn with_title(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            display_title: Some(title.into()),
            ..Self::new(path)
        }
    }

    /// Create an item whose artwork is already known.
    pub fn with_artwork(self, artwork: Artwork) -> Self {
        *self.artwork.lock() = ArtworkSlot {
            artwork: Some(artwork),
            in_flight: false,
        };
        self
    }

    /// The path or URL as given.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn resource_kind(&self) -> ResourceKind {
        self.resource_kind
    }

    pub fn is_network_resource(&self) -> bool {
        self.resource_kind != ResourceKind::Local
    }

    /// Title shown to the user.
    ///
    /// Uses the title override when set, the full URL for network items,
    /// and the file name for local items.
    pub fn display_name(&self) -> String {
        if let Some(title) = &self.display_title {
            return title.clone();
        }
        if self.is_network_resource() {
            return self.path.clone();
        }
        self.local_path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.clone())
    }

    /// Filesystem path of a local item (`file://` URLs are converted).
    pub fn local_path(&self) -> PathBuf {
        if self.path.starts_with("file://")
            && let Ok(url) = Url::parse(&self.path)
            && let Ok(path) = url.to_file_path()
        {
            return path;
        }
        PathBuf::from(&self.path)
    }

    /// Current artwork, if any resolution has started or finished.
    pub fn artwork(&self) -> Option<Artwork> {
        self.artwork.lock().artwork.clone()
    }

    /// Whether a resolution attempt is currently in flight.
    pub fn is_resolving(&self) -> bool {
        self.artwork.lock().in_flight
    }

    /// Atomically return cached artwork or claim the in-flight attempt.
    ///
    /// When claiming, the placeholder is stored as the interim value so
    /// readers never observe "absent" once resolution has begun.
    pub fn begin_resolution(&self) -> Resolution {
        let mut slot = self.artwork.lock();
        if let Some(artwork) = &slot.artwork {
            return Resolution::Cached(artwork.clone());
        }
        slot.artwork = Some(Artwork::placeholder());
        slot.in_flight = true;
        Resolution::Started
    }

    /// Record the terminal artwork of the in-flight attempt.
    pub fn settle(&self, artwork: Artwork) {
        let mut slot = self.artwork.lock();
        slot.artwork = Some(artwork);
        slot.in_flight = false;
    }

    /// Drop the in-flight attempt without recording a result.
    ///
    /// The item goes back to "absent", so a later pass fetches again.
    pub fn abandon_resolution(&self) {
        let mut slot = self.artwork.lock();
        if slot.in_flight {
            slot.artwork = None;
            slot.in_flight = false;
        }
    }
}

/// An ordered playlist.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    items: Vec<Arc<PlaylistItem>>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a playlist from plain paths/URLs.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: entries
                .into_iter()
                .map(|entry| Arc::new(PlaylistItem::new(entry)))
                .collect(),
        }
    }

    /// Parse (extended) M3U text.
    ///
    /// `#EXTINF:<duration>,<title>` lines set the title of the next entry.
    /// Relative local paths are resolved against `base_dir`.
    pub fn from_m3u(text: &str, base_dir: Option<&Path>) -> Self {
        let mut playlist = Self::new();
        let mut pending_title: Option<String> = None;

        for line in text.lines().map(str::trim) {
            if line.is_empty() {
                continue;
            }
            if let Some(info) = line.strip_prefix("#EXTINF:") {
                pending_title = info
                    .split_once(',')
                    .map(|(_, title)| title.trim().to_string())
                    .filter(|title| !title.is_empty());
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            let entry = match base_dir {
                Some(dir) if classify(line) == ResourceKind::Local && Path::new(line).is_relative() => {
                    dir.join(line).to_string_lossy().into_owned()
                }
                _ => line.to_string(),
            };

            let item = match pending_title.take() {
                Some(title) => PlaylistItem::with_title(entry, title),
                None => PlaylistItem::new(entry),
            };
            playlist.push(item);
        }

        playlist
    }

    /// Read an M3U/M3U8 file; relative entries resolve against its directory.
    pub fn load_m3u(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::not_found(path));
        }
        let text = std::fs::read_to_string(path)
            .with_context(format!("Failed to read playlist {}", path.display()))?;
        Ok(Self::from_m3u(&text, path.parent()))
    }

    pub fn push(&mut self, item: PlaylistItem) {
        self.items.push(Arc::new(item));
    }

    pub fn items(&self) -> &[Arc<PlaylistItem>] {
        &self.items
    }

    /// Snapshot of the current items; later edits don't affect it.
    pub fn snapshot(&self) -> Vec<Arc<PlaylistItem>> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
