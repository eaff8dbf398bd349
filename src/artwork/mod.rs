//! Artwork resolution for playlist items.
//!
//! Every playlist item gets exactly one representative cover image. Sources
//! are tried in a fixed order per resource kind:
//!
//! 1. **Local files** - embedded tag artwork (ID3 / iTunes), then the
//!    OS file-type icon when it is more specific than the generic document icon
//! 2. **Video-host URLs** - the host's thumbnail for the video ID
//! 3. **Other network URLs** - nothing to look up
//!
//! Whatever fails, the item ends up with the generic placeholder.
//!
//! # Design Principles
//!
//! - **Infallible**: resolution always yields an image; source errors are logged
//! - **Idempotent**: resolved artwork is cached on the item and never refetched
//! - **Bounded**: whole-playlist passes run behind a concurrency gate
//! - **Lazy network**: thumbnails are references, downloaded only when displayed

mod cache;
mod coordinator;
mod decode;
mod export;
mod remote;
mod resolver;
pub mod sources;

pub use cache::{ThumbnailCache, default_cache_dir};
pub use coordinator::{
    ArtworkEvent, PlaylistArtworkCoordinator, PlaylistArtworkSession, SessionHandle,
    SessionSummary,
};
pub use decode::{ImageCrateDecoder, ImageDecoder};
pub use export::{export_artwork, extension_for_mime, sanitize_filename};
pub use remote::RemoteImageLoader;
pub use resolver::{ArtworkResolver, Collaborators, SourceChain, SourceChains};

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

/// Edge length used when rendering the placeholder for export.
pub const PLACEHOLDER_SIZE: u32 = 512;

/// A resolved cover image together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Artwork {
    pub image: ArtworkImage,
    pub origin: ArtworkOrigin,
}

/// Where a piece of artwork came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtworkOrigin {
    /// Embedded in the media container's tags
    Embedded,
    /// OS icon registered for the file type
    FileIcon,
    /// Thumbnail of a video-host video
    VideoThumbnail,
    /// Generic fallback artwork
    Placeholder,
}

/// The image payload of a piece of artwork.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtworkImage {
    /// Image bytes already in memory and known to decode
    Decoded(Arc<DecodedImage>),
    /// Remote image, fetched and decoded on demand
    Remote(LazyImage),
    /// The generic placeholder image
    Placeholder,
}

/// Image bytes that decoded successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Raw encoded image data (JPEG, PNG, ...)
    pub data: Vec<u8>,
    /// MIME type sniffed from the data
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

/// A reference to a remote image.
///
/// Construction never fails; an unreachable or undecodable URL only shows up
/// when the image is loaded through [`RemoteImageLoader`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LazyImage {
    url: String,
}

impl LazyImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Artwork {
    /// The generic placeholder artwork.
    pub fn placeholder() -> Self {
        Self {
            image: ArtworkImage::Placeholder,
            origin: ArtworkOrigin::Placeholder,
        }
    }

    pub fn decoded(image: DecodedImage, origin: ArtworkOrigin) -> Self {
        Self {
            image: ArtworkImage::Decoded(Arc::new(image)),
            origin,
        }
    }

    pub fn remote(url: impl Into<String>, origin: ArtworkOrigin) -> Self {
        Self {
            image: ArtworkImage::Remote(LazyImage::new(url)),
            origin,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.origin == ArtworkOrigin::Placeholder
    }

    /// URL of a remote image, if this artwork is one.
    pub fn remote_url(&self) -> Option<&str> {
        match &self.image {
            ArtworkImage::Remote(lazy) => Some(lazy.url()),
            _ => None,
        }
    }

    /// Whether two values share the same underlying image.
    ///
    /// Decoded images compare by allocation, so a cached value handed out
    /// twice is recognizably the same image.
    pub fn same_image(&self, other: &Artwork) -> bool {
        match (&self.image, &other.image) {
            (ArtworkImage::Decoded(a), ArtworkImage::Decoded(b)) => Arc::ptr_eq(a, b),
            (a, b) => a == b,
        }
    }
}

/// Render the placeholder as PNG bytes.
///
/// A neutral vertical gradient with a darker center square, sized
/// `size x size`.
pub fn render_placeholder(size: u32) -> Result<Vec<u8>, image::ImageError> {
    let size = size.max(1);
    let inset = size / 4;
    let canvas = RgbaImage::from_fn(size, size, |x, y| {
        let inside = (inset..size - inset).contains(&x) && (inset..size - inset).contains(&y);
        let shade = 72 + (y * 48 / size) as u8;
        if inside {
            Rgba([shade / 2, shade / 2, shade / 2, 255])
        } else {
            Rgba([shade, shade, shade, 255])
        }
    });

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(canvas).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}
