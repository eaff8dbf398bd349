//! Writing resolved artwork to disk.

use std::path::{Path, PathBuf};

use super::{Artwork, ArtworkImage, PLACEHOLDER_SIZE, RemoteImageLoader, render_placeholder};
use crate::error::{Result, ResultExt};

/// File extension for an image MIME type.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        _ => "img",
    }
}

/// Replaces characters that aren't valid in file names.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect()
}

/// Write `artwork` to `dir` as `<stem>.<ext>`.
///
/// Remote thumbnails are only written when a `loader` is given; without one
/// nothing is written and `Ok(None)` is returned.
pub async fn export_artwork(
    artwork: &Artwork,
    dir: &Path,
    stem: &str,
    loader: Option<&RemoteImageLoader>,
) -> Result<Option<PathBuf>> {
    let (data, ext) = match &artwork.image {
        ArtworkImage::Decoded(image) => (image.data.clone(), extension_for_mime(&image.mime_type)),
        ArtworkImage::Placeholder => (render_placeholder(PLACEHOLDER_SIZE)?, "png"),
        ArtworkImage::Remote(lazy) => {
            let Some(loader) = loader else {
                return Ok(None);
            };
            let image = loader
                .load(lazy)
                .await
                .with_context(format!("Failed to download {}", lazy.url()))?;
            let ext = extension_for_mime(&image.mime_type);
            (image.data, ext)
        }
    };

    std::fs::create_dir_all(dir)
        .with_context(format!("Failed to create directory {}", dir.display()))?;

    let path = dir.join(format!("{}.{}", sanitize_filename(stem), ext));
    std::fs::write(&path, &data).with_context(format!("Failed to write {}", path.display()))?;

    tracing::debug!(target: "artwork::export", path = %path.display(), "Artwork written");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::{ArtworkOrigin, ThumbnailCache};
    use crate::test_utils::{png_bytes, png_image};
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_export_decoded_keeps_bytes() {
        let temp = TempDir::new().unwrap();
        let artwork = Artwork::decoded(png_image(6), ArtworkOrigin::Embedded);

        let path = export_artwork(&artwork, temp.path(), "001 - song", None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "001 - song.png");
        assert_eq!(std::fs::read(&path).unwrap(), png_bytes(6));
    }

    #[tokio::test]
    async fn test_export_placeholder_renders_png() {
        let temp = TempDir::new().unwrap();
        let path = export_artwork(&Artwork::placeholder(), temp.path(), "stream", None)
            .await
            .unwrap()
            .unwrap();

        let data = std::fs::read(path).unwrap();
        assert_eq!(image::guess_format(&data).unwrap(), image::ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_remote_without_loader_is_skipped() {
        let temp = TempDir::new().unwrap();
        let artwork = Artwork::remote("https://img.example.com/vi/x/0.jpg", ArtworkOrigin::VideoThumbnail);

        let written = export_artwork(&artwork, temp.path(), "video", None).await.unwrap();
        assert!(written.is_none());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_remote_served_from_cache() {
        let temp = TempDir::new().unwrap();
        let url = "http://127.0.0.1:9/vi/x/0.jpg";
        let cache = ThumbnailCache::new(temp.path().join("cache"));
        cache.put(url, &png_image(5)).unwrap();
        let loader = RemoteImageLoader::new().with_cache(cache);

        let artwork = Artwork::remote(url, ArtworkOrigin::VideoThumbnail);
        let path = export_artwork(&artwork, &temp.path().join("out"), "video", Some(&loader))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(path.extension().unwrap(), "png");
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("application/octet-stream"), "img");
    }

    proptest! {
        #[test]
        fn sanitize_removes_path_separators(input in "[a-zA-Z0-9 /:*?\"<>|_-]{1,50}") {
            let sanitized = sanitize_filename(&input);
            prop_assert!(!sanitized.contains('/'));
            prop_assert!(!sanitized.contains('\\'));
            prop_assert_eq!(input.chars().count(), sanitized.chars().count());
        }
    }
}
