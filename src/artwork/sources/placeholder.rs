//! Terminal fallback source.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{ArtworkSource, FetchError};
use crate::artwork::Artwork;
use crate::playlist::PlaylistItem;

/// Always yields the generic placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericFallbackSource;

#[async_trait]
impl ArtworkSource for GenericFallbackSource {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn resolve(
        &self,
        _item: &PlaylistItem,
        _cancel: &CancellationToken,
    ) -> Result<Artwork, FetchError> {
        Ok(Artwork::placeholder())
    }
}
