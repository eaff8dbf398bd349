//! OS file-type icons as artwork for local files.
//!
//! Only useful when the file type has its own registered icon. If the icon
//! for the file is byte-for-byte the generic document icon, the source
//! reports no artwork so the resolver falls back to the placeholder.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use super::{ArtworkSource, FetchError};
use crate::artwork::{Artwork, ArtworkOrigin, DecodedImage, ImageDecoder};
use crate::playlist::{PlaylistItem, ResourceKind};

/// Looks up OS icons for files.
///
/// Lookups may hit the disk; the icon source calls them from a blocking task.
pub trait IconProvider: Send + Sync {
    /// Icon the OS shows for this file (may be the generic icon).
    fn icon_for_file(&self, path: &Path) -> Option<DecodedImage>;

    /// Icon the OS shows for files of unknown type.
    fn generic_document_icon(&self) -> Option<DecodedImage>;
}

/// Content hash used to compare icons.
pub fn content_hash(image: &DecodedImage) -> [u8; 32] {
    Sha256::digest(&image.data).into()
}

/// Artwork from the file-type icon of a local file.
pub struct FilesystemIconSource {
    icons: Arc<dyn IconProvider>,
    /// Hash of the generic icon, looked up on first use
    generic_hash: Arc<OnceLock<Option<[u8; 32]>>>,
}

impl FilesystemIconSource {
    pub fn new(icons: Arc<dyn IconProvider>) -> Self {
        Self {
            icons,
            generic_hash: Arc::new(OnceLock::new()),
        }
    }
}

#[async_trait]
impl ArtworkSource for FilesystemIconSource {
    fn name(&self) -> &'static str {
        "file-icon"
    }

    async fn resolve(
        &self,
        item: &PlaylistItem,
        _cancel: &CancellationToken,
    ) -> Result<Artwork, FetchError> {
        if item.resource_kind() != ResourceKind::Local {
            return Err(FetchError::InvalidReference(item.path().to_string()));
        }

        let icons = self.icons.clone();
        let generic_hash = self.generic_hash.clone();
        let path = item.local_path();

        tokio::task::spawn_blocking(move || {
            let icon = icons.icon_for_file(&path).ok_or(FetchError::NoArtwork)?;

            let generic = generic_hash
                .get_or_init(|| icons.generic_document_icon().as_ref().map(content_hash));
            if generic.is_some_and(|hash| hash == content_hash(&icon)) {
                return Err(FetchError::NoArtwork);
            }

            Ok(Artwork::decoded(icon, ArtworkOrigin::FileIcon))
        })
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(target: "artwork::sources", error = %e, "Icon lookup task failed");
            Err(FetchError::NoArtwork)
        })
    }
}

/// Default icon-theme directories searched on freedesktop systems.
pub fn default_icon_theme_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(data) = dirs::data_dir() {
        dirs.push(data.join("icons").join("hicolor"));
    }
    for theme in ["hicolor", "Adwaita", "breeze"] {
        dirs.push(PathBuf::from("/usr/share/icons").join(theme));
    }
    dirs
}

/// Sizes tried in order, largest first.
const ICON_SIZES: &[&str] = &["512x512", "256x256", "128x128", "64x64", "48x48", "32x32"];

/// Icon names used for files of unknown type.
const GENERIC_ICON_NAMES: &[&str] = &["text-x-generic", "application-octet-stream", "unknown"];

/// Icon provider reading PNG icons from freedesktop icon themes.
///
/// The file extension is mapped to MIME-type icon names
/// (`audio-mpeg`, `video-x-matroska`, ...). When none of those exist, the
/// generic document icon is returned, as a desktop file manager would.
pub struct ThemeIconProvider {
    theme_dirs: Vec<PathBuf>,
    decoder: Arc<dyn ImageDecoder>,
    generic: OnceLock<Option<DecodedImage>>,
}

impl ThemeIconProvider {
    pub fn new(theme_dirs: Vec<PathBuf>, decoder: Arc<dyn ImageDecoder>) -> Self {
        Self {
            theme_dirs,
            decoder,
            generic: OnceLock::new(),
        }
    }

    fn find_icon(&self, names: &[&str]) -> Option<DecodedImage> {
        for name in names {
            for dir in &self.theme_dirs {
                // Flat layout (pixmaps-style) first, then sized subdirectories
                let mut candidates = vec![dir.join(format!("{}.png", name))];
                candidates.extend(ICON_SIZES.iter().map(|size| {
                    dir.join(size).join("mimetypes").join(format!("{}.png", name))
                }));

                for candidate in candidates {
                    if let Ok(data) = std::fs::read(&candidate)
                        && let Some(image) = self.decoder.decode(&data)
                    {
                        return Some(image);
                    }
                }
            }
        }
        None
    }
}

/// MIME-type icon names for a file extension, most specific first.
fn icon_names_for_extension(ext: &str) -> &'static [&'static str] {
    match ext {
        "mp3" => &["audio-mpeg", "audio-x-mp3", "audio-x-generic"],
        "flac" => &["audio-flac", "audio-x-flac", "audio-x-generic"],
        "m4a" | "aac" => &["audio-mp4", "audio-x-m4a", "audio-x-generic"],
        "ogg" | "oga" | "opus" => &["audio-ogg", "audio-x-vorbis+ogg", "audio-x-generic"],
        "wav" => &["audio-x-wav", "audio-x-generic"],
        "mp4" | "m4v" => &["video-mp4", "video-x-generic"],
        "mkv" => &["video-x-matroska", "video-x-generic"],
        "webm" => &["video-webm", "video-x-generic"],
        "avi" => &["video-x-msvideo", "video-x-generic"],
        "mov" => &["video-quicktime", "video-x-generic"],
        _ => &[],
    }
}

impl IconProvider for ThemeIconProvider {
    fn icon_for_file(&self, path: &Path) -> Option<DecodedImage> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        self.find_icon(icon_names_for_extension(&ext))
            .or_else(|| self.generic_document_icon())
    }

    fn generic_document_icon(&self) -> Option<DecodedImage> {
        self.generic
            .get_or_init(|| self.find_icon(GENERIC_ICON_NAMES))
            .clone()
    }
}
