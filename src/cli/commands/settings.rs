//! Config file and thumbnail cache commands.

use std::path::Path;

use crate::artwork::ThumbnailCache;
use crate::config::{self, Config};

/// Show the active configuration, or write a default config file
pub fn cmd_config(config: &Config, override_path: Option<&Path>, init: bool) -> anyhow::Result<()> {
    let path = match override_path {
        Some(path) => path.to_path_buf(),
        None => config::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
    };

    if init {
        if path.exists() {
            println!("Config already exists: {}", path.display());
            return Ok(());
        }
        let written = config::save_to(&Config::default(), &path)?;
        println!("✓ Wrote default config to {}", written.display());
        return Ok(());
    }

    println!("# {}", path.display());
    if !path.exists() {
        println!("# (file not found, showing defaults)");
    }
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Show the thumbnail cache location and size, or empty it
pub fn cmd_cache(config: &Config, clear: bool) -> anyhow::Result<()> {
    let cache = ThumbnailCache::new(config.cache.directory());
    let size = cache.size_bytes();

    if clear {
        cache.clear()?;
        println!("✓ Cleared {} ({} KB freed)", cache.dir().display(), size / 1024);
        return Ok(());
    }

    println!("Cache: {}", cache.dir().display());
    println!("Size:  {} KB", size / 1024);
    if !config.cache.enabled {
        println!("(disk cache is disabled in the config)");
    }
    Ok(())
}
