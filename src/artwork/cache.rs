//! Thumbnail disk cache.
//!
//! Keeps downloaded remote thumbnails so repeated playlist passes don't hit
//! the network again. Entries are keyed by the SHA-256 of the image URL.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::{DecodedImage, ImageDecoder};

/// Remote thumbnail disk cache.
pub struct ThumbnailCache {
    cache_dir: PathBuf,
}

impl ThumbnailCache {
    /// Create a new cache in the specified directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        if let Err(e) = fs::create_dir_all(&cache_dir) {
            tracing::warn!(target: "artwork::cache", dir = ?cache_dir, error = %e, "Could not create cache directory");
        }
        Self { cache_dir }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get a cached image for a URL, if it still decodes.
    pub fn get(&self, url: &str, decoder: &dyn ImageDecoder) -> Option<DecodedImage> {
        let data = fs::read(self.cache_path(url)).ok()?;
        decoder.decode(&data)
    }

    /// Store an image for a URL.
    pub fn put(&self, url: &str, image: &DecodedImage) -> Result<PathBuf, std::io::Error> {
        let path = self.cache_path(url);
        fs::write(&path, &image.data)?;
        Ok(path)
    }

    fn cache_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.cache_dir.join(format!("{:x}.img", digest))
    }

    /// Clear all cached thumbnails.
    pub fn clear(&self) -> Result<(), std::io::Error> {
        if self.cache_dir.exists() {
            for entry in fs::read_dir(&self.cache_dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    fs::remove_file(entry.path())?;
                }
            }
        }
        Ok(())
    }

    /// Get the total size of the cache in bytes.
    pub fn size_bytes(&self) -> u64 {
        fs::read_dir(&self.cache_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.metadata().ok())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0)
    }
}

/// `<user cache dir>/playlist-artwork/thumbnails`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("playlist-artwork")
        .join("thumbnails")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::{ImageCrateDecoder, render_placeholder};
    use tempfile::TempDir;

    fn png_image() -> DecodedImage {
        ImageCrateDecoder
            .decode(&render_placeholder(8).unwrap())
            .unwrap()
    }

    #[test]
    fn test_cache_put_and_get() {
        let temp = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(temp.path());
        let image = png_image();

        cache.put("https://img.example.com/vi/a/0.jpg", &image).unwrap();

        let cached = cache
            .get("https://img.example.com/vi/a/0.jpg", &ImageCrateDecoder)
            .unwrap();
        assert_eq!(cached, image);
    }

    #[test]
    fn test_cache_miss() {
        let temp = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(temp.path());

        assert!(cache.get("https://nowhere", &ImageCrateDecoder).is_none());
        assert_eq!(cache.size_bytes(), 0);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(temp.path());
        let image = DecodedImage {
            data: b"garbage".to_vec(),
            mime_type: "image/jpeg".to_string(),
            width: 0,
            height: 0,
        };

        let path = cache.put("https://img.example.com/x", &image).unwrap();
        assert!(path.exists());
        assert!(cache.get("https://img.example.com/x", &ImageCrateDecoder).is_none());
    }

    #[test]
    fn test_cache_clear_and_size() {
        let temp = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(temp.path());
        let image = png_image();

        assert_eq!(cache.size_bytes(), 0);
        cache.put("u1", &image).unwrap();
        cache.put("u2", &image).unwrap();
        assert_eq!(cache.size_bytes(), 2 * image.data.len() as u64);

        cache.clear().unwrap();
        assert!(cache.get("u1", &ImageCrateDecoder).is_none());
        assert_eq!(cache.size_bytes(), 0);
    }
}
