use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub stash: StashConfig,

    #[serde(default)]
    pub tmdb: TmdbConfig,

    #[serde(default)]
    pub page: PageConfig,

    #[serde(default)]
    pub style: StyleConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StashConfig {
    /// Base URL of the Stash server (GraphQL lives at `{url}/graphql`)
    #[serde(default = "default_stash_url")]
    pub url: String,

    /// Stash API key, sent as the `ApiKey` header when set
    #[serde(default)]
    pub api_key: Option<String>,

    /// Plugin entry holding the `tmdbapikey` setting
    #[serde(default = "default_plugin_id")]
    pub plugin_id: String,

    #[serde(default = "default_stash_timeout")]
    pub timeout_secs: u64,
}

fn default_stash_url() -> String {
    "http://localhost:9999".to_string()
}
fn default_plugin_id() -> String {
    "tmdb-backdrop".to_string()
}
fn default_stash_timeout() -> u64 {
    10
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            url: default_stash_url(),
            api_key: None,
            plugin_id: default_plugin_id(),
            timeout_secs: default_stash_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Static API key; when set the Stash plugin settings are never queried
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_tmdb_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/original".to_string()
}
fn default_tmdb_timeout() -> u64 {
    30
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            image_base_url: default_image_base_url(),
            api_key: None,
            timeout_secs: default_tmdb_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageConfig {
    /// Path prefix of a group detail page; the numeric id follows it
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// Element id of the group page root container
    #[serde(default = "default_container_id")]
    pub container_id: String,

    /// Element id of the injected style node
    #[serde(default = "default_style_id")]
    pub style_id: String,

    #[serde(default = "default_container_poll")]
    pub container_poll_ms: u64,

    /// Give up waiting for the container after this long (default: wait until
    /// found or superseded by a newer navigation)
    #[serde(default)]
    pub container_timeout_ms: Option<u64>,
}

fn default_route_prefix() -> String {
    "/groups/".to_string()
}
fn default_container_id() -> String {
    "group-page".to_string()
}
fn default_style_id() -> String {
    "tmdb-dynamic-style".to_string()
}
fn default_container_poll() -> u64 {
    100
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            route_prefix: default_route_prefix(),
            container_id: default_container_id(),
            style_id: default_style_id(),
            container_poll_ms: default_container_poll(),
            container_timeout_ms: None,
        }
    }
}

impl PageConfig {
    pub fn container_poll(&self) -> Duration {
        Duration::from_millis(self.container_poll_ms)
    }

    pub fn container_timeout(&self) -> Option<Duration> {
        self.container_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleConfig {
    /// Fade the old backdrop out before swapping (false = plain swap)
    #[serde(default = "default_true")]
    pub crossfade: bool,

    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,

    /// Opacity of the black overlay drawn over the backdrop
    #[serde(default = "default_overlay_opacity")]
    pub overlay_opacity: f32,

    /// Download the new image before swapping it in
    #[serde(default = "default_true")]
    pub preload: bool,

    /// Selectors (relative to the container) hidden entirely
    #[serde(default = "default_hidden")]
    pub hidden: Vec<String>,

    /// Selectors made transparent
    #[serde(default = "default_transparent")]
    pub transparent: Vec<String>,

    /// Selectors whose bottom border is removed
    #[serde(default = "default_borderless")]
    pub borderless: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_fade_ms() -> u64 {
    800
}
fn default_overlay_opacity() -> f32 {
    0.6
}
fn default_hidden() -> Vec<String> {
    vec![".background-image-container".to_string()]
}
fn default_transparent() -> Vec<String> {
    vec![
        ".detail-header".to_string(),
        ".filtered-list-toolbar".to_string(),
        ".card".to_string(),
    ]
}
fn default_borderless() -> Vec<String> {
    vec![".detail-header".to_string(), ".detail-body nav".to_string()]
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            crossfade: true,
            fade_ms: default_fade_ms(),
            overlay_opacity: default_overlay_opacity(),
            preload: true,
            hidden: default_hidden(),
            transparent: default_transparent(),
            borderless: default_borderless(),
        }
    }
}

impl StyleConfig {
    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}
