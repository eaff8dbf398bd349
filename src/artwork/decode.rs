//! Image decoding.
//!
//! Raw bytes pulled out of tags or downloaded from the network are only
//! accepted as artwork when they actually decode.

use image::GenericImageView;

use super::DecodedImage;

/// Turns raw bytes into a decoded image, or `None` if they aren't one.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Option<DecodedImage>;
}

/// Decoder backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Option<DecodedImage> {
        let format = image::guess_format(bytes).ok()?;
        let (width, height) = image::load_from_memory_with_format(bytes, format)
            .ok()?
            .dimensions();

        Some(DecodedImage {
            data: bytes.to_vec(),
            mime_type: format.to_mime_type().to_string(),
            width,
            height,
        })
    }
}
