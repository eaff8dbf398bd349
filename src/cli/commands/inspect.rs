//! Classification and thumbnail URL commands.

use serde::Serialize;

use crate::artwork::sources::{ThumbnailQuality, VideoHostThumbnailSource};
use crate::config::Config;
use crate::playlist::{ResourceKind, classify, extract_video_id};

#[derive(Serialize)]
struct Classification<'a> {
    entry: &'a str,
    kind: ResourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_id: Option<String>,
}

fn classify_entry(entry: &str) -> Classification<'_> {
    let kind = classify(entry);
    let video_id = match kind {
        ResourceKind::VideoHost => extract_video_id(entry),
        _ => None,
    };
    Classification {
        entry,
        kind,
        video_id,
    }
}

/// Print the resource kind of each entry
pub fn cmd_classify(entries: &[String], json: bool) -> anyhow::Result<()> {
    let rows: Vec<_> = entries.iter().map(|e| classify_entry(e)).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in rows {
        match row.video_id {
            Some(id) => println!("{:<10} {} (video id {})", row.kind.to_string(), row.entry, id),
            None => println!("{:<10} {}", row.kind.to_string(), row.entry),
        }
    }
    Ok(())
}

/// Print the thumbnail URL for a video URL
pub fn cmd_thumbnail_url(
    config: &Config,
    url: &str,
    quality: Option<ThumbnailQuality>,
) -> anyhow::Result<()> {
    println!("{}", thumbnail_url(config, url, quality)?);
    Ok(())
}

fn thumbnail_url(
    config: &Config,
    url: &str,
    quality: Option<ThumbnailQuality>,
) -> anyhow::Result<String> {
    if classify(url) != ResourceKind::VideoHost {
        anyhow::bail!("Not a video-host URL: {}", url);
    }
    let video_id = extract_video_id(url)
        .ok_or_else(|| anyhow::anyhow!("No video id found in {}", url))?;

    let source = VideoHostThumbnailSource::new(
        config.video_host.thumbnail_host.clone(),
        quality.unwrap_or(config.video_host.quality),
    );
    Ok(source.thumbnail_url(&video_id))
}
