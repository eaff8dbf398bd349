//! Playlist Artwork - cover images for every entry of a media playlist.
//!
//! Resolves one representative image per playlist item: artwork embedded in
//! local media files, the file-type icon, video-host thumbnails, or a
//! generic placeholder. Runs as a CLI; see `playlist-artwork --help`.

pub mod artwork;
pub mod cli;
pub mod config;
pub mod error;
pub mod playlist;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("playlist_artwork=info".parse()?)
                .add_directive("artwork=info".parse()?),
        )
        .init();

    cli::run_command(&args)
}
