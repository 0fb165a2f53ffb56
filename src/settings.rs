//! Session-scoped TMDB access token.
//!
//! The token is resolved on first use from the host's plugin settings and
//! kept for the rest of the process. Failed lookups are not cached, so the
//! next update cycle tries again. Concurrent callers wait for the lookup in
//! flight instead of issuing their own.

use std::sync::Arc;

use serde_json::{Map, Value};
use tmdb_backdrop_common::{AccessToken, Error};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::host::HostClient;

/// Accepted spellings of the API key setting, in lookup order.
const TOKEN_KEYS: [&str; 2] = ["tmdbapikey", "TmdbApiKey"];

/// Resolves and caches the TMDB access token.
pub struct TokenProvider {
    host: Arc<dyn HostClient>,
    plugin_id: String,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    pub fn new(host: Arc<dyn HostClient>, plugin_id: impl Into<String>) -> Self {
        Self {
            host,
            plugin_id: plugin_id.into(),
            cached: Mutex::new(None),
        }
    }

    /// Seed the cache with a statically configured token. The host is never
    /// queried while the seed is present.
    pub fn with_token(mut self, token: Option<AccessToken>) -> Self {
        self.cached = Mutex::new(token);
        self
    }

    /// Return the cached token, resolving it from host settings on first use.
    ///
    /// Never fails: a failed or empty lookup is logged and yields `None`.
    pub async fn access_token(&self) -> Option<AccessToken> {
        // Held across the lookup so overlapping cycles share one query.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            return Some(token.clone());
        }

        match self.fetch().await {
            Ok(token) => {
                debug!(plugin = %self.plugin_id, "Resolved TMDB access token from plugin settings");
                *cached = Some(token.clone());
                Some(token)
            }
            Err(e) => {
                warn!(plugin = %self.plugin_id, "TMDB access token unavailable: {}", e);
                None
            }
        }
    }

    async fn fetch(&self) -> tmdb_backdrop_common::Result<AccessToken> {
        let plugins = self.host.plugin_settings().await?;
        extract_token(&plugins, &self.plugin_id).ok_or_else(|| {
            Error::config_unavailable(format!(
                "no {} setting for plugin '{}'",
                TOKEN_KEYS[0], self.plugin_id
            ))
        })
    }
}

fn extract_token(plugins: &Map<String, Value>, plugin_id: &str) -> Option<AccessToken> {
    let settings = plugins.get(plugin_id)?.as_object()?;
    TOKEN_KEYS
        .iter()
        .filter_map(|key| settings.get(*key).and_then(Value::as_str))
        .find_map(AccessToken::new)
}
