//! Playlist artwork resolution command.

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::artwork::{
    ArtworkEvent, ArtworkOrigin, ArtworkResolver, PlaylistArtworkCoordinator, RemoteImageLoader,
    SessionSummary, ThumbnailCache, export_artwork,
};
use crate::config::Config;
use crate::playlist::{Playlist, PlaylistItem, ResourceKind};

use super::{ResolveArgs, expand_entry};

/// One line of JSON output
#[derive(Serialize)]
struct ResolvedEntry<'a> {
    index: usize,
    path: &'a str,
    title: String,
    kind: ResourceKind,
    origin: ArtworkOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

#[derive(Serialize)]
struct ResolveReport<'a> {
    items: Vec<ResolvedEntry<'a>>,
    resolved: usize,
    placeholders: usize,
}

/// Build the playlist from `--playlist` and positional entries.
fn build_playlist(args: &ResolveArgs) -> anyhow::Result<Playlist> {
    let mut playlist = match &args.playlist {
        Some(path) => Playlist::load_m3u(path)?,
        None => Playlist::new(),
    };

    for entry in &args.entries {
        for path in expand_entry(entry, args.recursive) {
            playlist.push(PlaylistItem::new(path));
        }
    }

    Ok(playlist)
}

/// Resolve artwork for a playlist and report (and optionally export) it
pub fn cmd_resolve(rt: &Runtime, mut config: Config, args: &ResolveArgs) -> anyhow::Result<()> {
    if let Some(quality) = args.quality {
        config.video_host.quality = quality;
    }
    if let Some(concurrency) = args.concurrency {
        config.resolver.max_concurrency = concurrency;
    }

    let playlist = build_playlist(args)?;
    if playlist.is_empty() {
        anyhow::bail!("Nothing to resolve: give entries or --playlist");
    }

    rt.block_on(async {
        let resolver = Arc::new(ArtworkResolver::from_config(&config));
        let mut coordinator =
            PlaylistArtworkCoordinator::new(resolver, config.resolver.max_concurrency);
        let (tx, mut rx) = mpsc::channel(64);
        coordinator.set_event_sender(tx);

        let handle = coordinator.resolve_all(playlist.snapshot(), |summary| {
            tracing::debug!(
                target: "cli::resolve",
                resolved = summary.resolved,
                placeholders = summary.placeholders,
                "Session complete"
            );
        });
        // Event stream ends once the last item task drops its sender
        drop(coordinator);

        // Also stops the export below; the signal handler stays installed
        // for the rest of the process
        let cancel = handle.cancellation_token();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nCancelling...");
                interrupt.cancel();
            }
        });

        let total = playlist.len();
        let mut done = 0;
        while let Some(event) = rx.recv().await {
            match event {
                ArtworkEvent::ItemResolved { index, artwork } => {
                    done += 1;
                    if !args.json {
                        let item = &playlist.items()[index];
                        println!(
                            "[{}/{}] {:<16} {}",
                            done,
                            total,
                            origin_label(artwork.origin),
                            item.display_name()
                        );
                    }
                }
            }
        }

        let summary = handle.wait().await;

        if args.json {
            print_json(&playlist, &summary)?;
        } else {
            println!();
            println!(
                "Resolved {} of {} items ({} placeholders)",
                summary.resolved,
                total,
                summary.placeholders
            );
        }

        if let Some(out) = &args.out {
            export_all(&config, &playlist, &summary, out, args.download, args.json, &cancel).await;
        }

        Ok::<(), anyhow::Error>(())
    })
}

fn origin_label(origin: ArtworkOrigin) -> &'static str {
    match origin {
        ArtworkOrigin::Embedded => "embedded",
        ArtworkOrigin::FileIcon => "file icon",
        ArtworkOrigin::VideoThumbnail => "video thumbnail",
        ArtworkOrigin::Placeholder => "placeholder",
    }
}

fn print_json(playlist: &Playlist, summary: &SessionSummary) -> anyhow::Result<()> {
    let items = playlist
        .items()
        .iter()
        .zip(&summary.artworks)
        .enumerate()
        .map(|(index, (item, artwork))| ResolvedEntry {
            index,
            path: item.path(),
            title: item.display_name(),
            kind: item.resource_kind(),
            origin: artwork.origin,
            url: artwork.remote_url(),
        })
        .collect();

    let report = ResolveReport {
        items,
        resolved: summary.resolved,
        placeholders: summary.placeholders,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn export_all(
    config: &Config,
    playlist: &Playlist,
    summary: &SessionSummary,
    out: &std::path::Path,
    download: bool,
    quiet: bool,
    cancel: &CancellationToken,
) -> usize {
    let loader = download.then(|| {
        let loader = RemoteImageLoader::new();
        if config.cache.enabled {
            loader.with_cache(ThumbnailCache::new(config.cache.directory()))
        } else {
            loader
        }
    });

    let loader = loader.as_ref();
    let exports = futures::stream::iter(
        playlist.items().iter().zip(&summary.artworks).enumerate(),
    )
    .map(|(index, (item, artwork))| async move {
        let stem = format!("{:03} - {}", index + 1, item.display_name());
        (index, item, export_artwork(artwork, out, &stem, loader).await)
    })
    .buffer_unordered(4) // Downloads run 4 at a time
    .collect::<Vec<_>>();

    let results = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            eprintln!("Export cancelled");
            return 0;
        }
        results = exports => results,
    };

    let mut written = 0;
    for (index, item, result) in results {
        match result {
            Ok(Some(_)) => written += 1,
            Ok(None) => {
                tracing::debug!(target: "cli::resolve", index, "Remote thumbnail not downloaded");
            }
            Err(e) => {
                tracing::warn!(target: "cli::resolve", index, error = %e, "Export failed");
                eprintln!("✗ {}: {}", item.display_name(), e);
            }
        }
    }

    if !quiet {
        println!("Wrote {} images to {}", written, out.display());
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::Artwork;
    use tempfile::TempDir;

    #[test]
    fn test_build_playlist_merges_sources() {
        let temp = TempDir::new().unwrap();
        let m3u = temp.path().join("list.m3u");
        std::fs::write(&m3u, "#EXTM3U\none.mp3\n").unwrap();

        let args = ResolveArgs {
            entries: vec!["https://youtu.be/abc".to_string()],
            playlist: Some(m3u),
            ..Default::default()
        };
        let playlist = build_playlist(&args).unwrap();

        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.items()[1].resource_kind(), ResourceKind::VideoHost);
    }

    #[test]
    fn test_missing_playlist_is_error() {
        let args = ResolveArgs {
            playlist: Some("/definitely/not/here.m3u".into()),
            ..Default::default()
        };
        assert!(build_playlist(&args).is_err());
    }

    #[test]
    fn test_resolve_exports_placeholders() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let rt = Runtime::new().unwrap();

        let args = ResolveArgs {
            entries: vec!["http://radio.example.com/live".to_string()],
            out: Some(out.clone()),
            json: true,
            ..Default::default()
        };
        cmd_resolve(&rt, Config::default(), &args).unwrap();

        let files: Vec<_> = std::fs::read_dir(&out).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_export_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let playlist = Playlist::from_entries(["http://radio.example.com/live", "/music/a.mp3"]);
        let summary = SessionSummary {
            artworks: vec![Artwork::placeholder(), Artwork::placeholder()],
            resolved: 0,
            placeholders: 2,
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let written =
            export_all(&Config::default(), &playlist, &summary, &out, false, true, &cancel).await;

        assert_eq!(written, 0);
        assert!(!out.exists() || std::fs::read_dir(&out).unwrap().count() == 0);

        let written = export_all(
            &Config::default(),
            &playlist,
            &summary,
            &out,
            false,
            true,
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(written, 2);
    }
}
