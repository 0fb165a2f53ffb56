mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./tmdb-backdrop.toml",
        "~/.config/tmdb-backdrop/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let page = &config.page;
    if page.container_id.trim().is_empty() {
        anyhow::bail!("page.container_id cannot be empty");
    }
    if page.style_id.trim().is_empty() {
        anyhow::bail!("page.style_id cannot be empty");
    }
    if !page.route_prefix.starts_with('/') || !page.route_prefix.ends_with('/') {
        anyhow::bail!(
            "page.route_prefix must start and end with '/': {}",
            page.route_prefix
        );
    }
    if page.container_poll_ms == 0 {
        anyhow::bail!("page.container_poll_ms cannot be 0");
    }

    if !(0.0..=1.0).contains(&config.style.overlay_opacity) {
        anyhow::bail!(
            "style.overlay_opacity must be between 0 and 1: {}",
            config.style.overlay_opacity
        );
    }

    if config.tmdb.api_key.is_none() && config.stash.plugin_id.trim().is_empty() {
        tracing::warn!("No TMDB api_key and no stash.plugin_id configured; backdrops will never load");
    }

    Ok(())
}
