//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `resolve`: Artwork resolution for a playlist, with optional export
//! - `inspect`: Classification and thumbnail URL lookups
//! - `settings`: Config file inspection and initialization, thumbnail cache

mod inspect;
mod resolve;
mod settings;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use crate::artwork::sources::ThumbnailQuality;
use crate::config;

pub use inspect::{cmd_classify, cmd_thumbnail_url};
pub use resolve::cmd_resolve;
pub use settings::{cmd_cache, cmd_config};

/// Playlist artwork CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "PLAYLIST_ARTWORK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve artwork for every entry of a playlist
    Resolve(ResolveArgs),
    /// Show how entries are classified
    Classify {
        /// Paths or URLs
        #[arg(required = true)]
        entries: Vec<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the thumbnail URL for a video-host URL
    ThumbnailUrl {
        /// Video URL
        url: String,
        /// Thumbnail quality (defaults to the configured one)
        #[arg(short, long, value_enum)]
        quality: Option<ThumbnailQuality>,
    },
    /// Show or initialize the config file
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
    /// Show the thumbnail cache size, or clear it
    Cache {
        /// Delete every cached thumbnail
        #[arg(long)]
        clear: bool,
    },
}

/// Arguments of the `resolve` command
#[derive(Args, Debug, Default)]
pub struct ResolveArgs {
    /// Paths, directories or URLs (directories are scanned for media files)
    pub entries: Vec<String>,
    /// Read entries from an M3U/M3U8 playlist
    #[arg(short, long)]
    pub playlist: Option<PathBuf>,
    /// Scan directories recursively
    #[arg(short, long)]
    pub recursive: bool,
    /// Write each item's artwork into this directory
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    /// Thumbnail quality for video-host entries
    #[arg(short, long, value_enum)]
    pub quality: Option<ThumbnailQuality>,
    /// Maximum number of items resolved at once
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
    /// Download video thumbnails when exporting
    #[arg(long)]
    pub download: bool,
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    };

    match &cli.command {
        Commands::Resolve(args) => {
            let rt = Runtime::new()?;
            cmd_resolve(&rt, config, args)
        }
        Commands::Classify { entries, json } => cmd_classify(entries, *json),
        Commands::ThumbnailUrl { url, quality } => cmd_thumbnail_url(&config, url, *quality),
        Commands::Config { init } => cmd_config(&config, cli.config.as_deref(), *init),
        Commands::Cache { clear } => cmd_cache(&config, *clear),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Expand an entry into playlist entries.
///
/// Directories become the media files inside them (sorted), everything else
/// is passed through as-is.
pub(crate) fn expand_entry(entry: &str, recursive: bool) -> Vec<String> {
    let path = Path::new(entry);
    if !path.is_dir() {
        return vec![entry.to_string()];
    }

    let depth = if recursive { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .max_depth(depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_media_file(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    files
        .into_iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}

/// Check if a path has an audio or video file extension
pub(crate) fn is_media_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    matches!(
        ext.as_deref(),
        Some(
            "mp3" | "flac" | "ogg" | "oga" | "opus" | "m4a" | "aac" | "wav" | "aiff" | "mp4"
                | "m4v" | "mkv" | "webm" | "avi" | "mov"
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_resolve() {
        let cli = Cli::try_parse_from([
            "playlist-artwork",
            "resolve",
            "/music/a.mp3",
            "https://youtu.be/abc",
            "--quality",
            "high",
            "-j",
            "4",
            "--json",
        ])
        .unwrap();

        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(args.entries.len(), 2);
        assert_eq!(args.quality, Some(ThumbnailQuality::High));
        assert_eq!(args.concurrency, Some(4));
        assert!(args.json);
    }

    #[test]
    fn test_quality_value_names() {
        let cli =
            Cli::try_parse_from(["playlist-artwork", "thumbnail-url", "https://youtu.be/x", "-q", "maxres"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::ThumbnailUrl {
                quality: Some(ThumbnailQuality::MaxRes),
                ..
            }
        ));
    }

    #[test]
    fn test_cli_parses_cache_clear() {
        let cli = Cli::try_parse_from(["playlist-artwork", "cache", "--clear"]).unwrap();
        assert!(matches!(cli.command, Commands::Cache { clear: true }));
    }

    #[test]
    fn test_expand_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("b.flac"), b"").unwrap();
        std::fs::write(temp.path().join("a.mp3"), b"").unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        std::fs::write(temp.path().join("sub").join("c.ogg"), b"").unwrap();

        let dir = temp.path().to_string_lossy().into_owned();
        let flat = expand_entry(&dir, false);
        assert_eq!(flat.len(), 2);
        assert!(flat[0].ends_with("a.mp3"));

        let deep = expand_entry(&dir, true);
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_expand_passes_urls_through() {
        assert_eq!(
            expand_entry("https://youtu.be/abc", true),
            vec!["https://youtu.be/abc".to_string()]
        );
    }
}
