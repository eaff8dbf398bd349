//! Loading of remote image references.
//!
//! Video thumbnails are handed out as [`LazyImage`] references. Whoever
//! displays or exports them loads them here; this is the only place a bad
//! thumbnail URL turns into an error.

use std::time::Duration;

use super::sources::FetchError;
use super::{DecodedImage, ImageCrateDecoder, ImageDecoder, LazyImage, ThumbnailCache};

/// Downloads and decodes remote images, optionally through a disk cache.
pub struct RemoteImageLoader {
    http_client: reqwest::Client,
    decoder: Box<dyn ImageDecoder>,
    cache: Option<ThumbnailCache>,
}

impl RemoteImageLoader {
    /// Create a loader without a disk cache.
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap_or_default(),
            decoder: Box::new(ImageCrateDecoder),
            cache: None,
        }
    }

    /// Use a disk cache for downloaded images.
    pub fn with_cache(mut self, cache: ThumbnailCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Fetch and decode the referenced image.
    pub async fn load(&self, image: &LazyImage) -> Result<DecodedImage, FetchError> {
        let url = image.url();

        if let Some(cache) = &self.cache
            && let Some(cached) = cache.get(url, self.decoder.as_ref())
        {
            tracing::debug!(target: "artwork::remote", url, "Thumbnail cache hit");
            return Ok(cached);
        }

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NoArtwork);
        }

        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let decoded = self
            .decoder
            .decode(&data)
            .ok_or_else(|| FetchError::DecodeFailed(url.to_string()))?;

        if let Some(cache) = &self.cache
            && let Err(e) = cache.put(url, &decoded)
        {
            tracing::warn!(target: "artwork::remote", url, error = %e, "Failed to cache thumbnail");
        }

        Ok(decoded)
    }
}

impl Default for RemoteImageLoader {
    fn default() -> Self {
        Self::new()
    }
}
