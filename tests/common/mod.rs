//! Shared test harness for integration tests.
//!
//! Provides stub collaborators (host, backdrop source, preloader) and
//! [`TestHarness`], which wires them into an [`Orchestrator`] backed by an
//! in-memory document and location.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tmdb_backdrop::config::Config;
use tmdb_backdrop::host::HostClient;
use tmdb_backdrop::orchestrator::{Components, Orchestrator};
use tmdb_backdrop::route::SharedLocation;
use tmdb_backdrop::style::{Document, ImagePreloader, MemoryDocument};
use tmdb_backdrop::tmdb::BackdropSource;
use tmdb_backdrop_common::{
    AccessToken, BackdropCandidate, Error, MediaReference, Result,
};

pub const CONTAINER_ID: &str = "group-page";
pub const STYLE_ID: &str = "tmdb-dynamic-style";
pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/original";

/// Host stub with per-group URL lists and call counters.
#[derive(Default)]
pub struct StubHost {
    pub token: Mutex<Option<String>>,
    pub groups: Mutex<HashMap<String, Vec<String>>>,
    pub settings_calls: AtomicUsize,
    pub group_calls: AtomicUsize,
}

impl StubHost {
    pub fn with_token(token: &str) -> Arc<Self> {
        let host = Self::default();
        *host.token.lock() = Some(token.to_string());
        Arc::new(host)
    }

    pub fn set_group(&self, id: &str, urls: &[&str]) {
        self.groups
            .lock()
            .insert(id.to_string(), urls.iter().map(|u| u.to_string()).collect());
    }
}

#[async_trait]
impl HostClient for StubHost {
    async fn plugin_settings(&self) -> Result<Map<String, Value>> {
        self.settings_calls.fetch_add(1, Ordering::SeqCst);
        let token = self.token.lock().clone();
        let settings = match token {
            Some(token) => json!({ "tmdb-backdrop": { "tmdbapikey": token } }),
            None => json!({}),
        };
        match settings {
            Value::Object(map) => Ok(map),
            _ => Err(Error::internal("settings stub is not an object")),
        }
    }

    async fn group_urls(&self, group_id: &str) -> Result<Vec<String>> {
        self.group_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.groups.lock().get(group_id).cloned().unwrap_or_default())
    }
}

/// Backdrop source stub: fixed candidates and latency per reference.
#[derive(Default)]
pub struct StubBackdrops {
    pub backdrops: Mutex<HashMap<MediaReference, (Vec<String>, Duration)>>,
    pub calls: AtomicUsize,
}

impl StubBackdrops {
    pub fn set(&self, reference: MediaReference, paths: &[&str], delay: Duration) {
        self.backdrops.lock().insert(
            reference,
            (paths.iter().map(|p| p.to_string()).collect(), delay),
        );
    }
}

#[async_trait]
impl BackdropSource for StubBackdrops {
    async fn fetch_backdrop(
        &self,
        reference: &MediaReference,
        _token: &AccessToken,
    ) -> Option<BackdropCandidate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let entry = self.backdrops.lock().get(reference).cloned();
        let (paths, delay) = entry?;
        tokio::time::sleep(delay).await;
        paths.first().map(BackdropCandidate::new)
    }
}

/// Preloader that resolves after a short delay.
pub struct InstantPreload;

#[async_trait]
impl ImagePreloader for InstantPreload {
    async fn preload(&self, _url: &str) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(())
    }
}

/// Orchestrator wired to stubs and an in-memory page.
pub struct TestHarness {
    pub orchestrator: Arc<Orchestrator>,
    pub location: Arc<SharedLocation>,
    pub document: Arc<MemoryDocument>,
    pub host: Arc<StubHost>,
    pub backdrops: Arc<StubBackdrops>,
}

impl TestHarness {
    /// Harness with default configuration, a settings token and the page
    /// container already rendered.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let location = Arc::new(SharedLocation::new("http://stash.local/"));
        let document = Arc::new(MemoryDocument::new());
        document.insert_element(CONTAINER_ID);
        let host = StubHost::with_token("settings-token");
        let backdrops = Arc::new(StubBackdrops::default());

        let orchestrator = Arc::new(Orchestrator::new(
            &config,
            Components {
                location: location.clone(),
                document: document.clone(),
                host: host.clone(),
                backdrops: backdrops.clone(),
                preloader: Arc::new(InstantPreload),
            },
        ));

        Self {
            orchestrator,
            location,
            document,
            host,
            backdrops,
        }
    }

    /// Navigate to `path` on the stub host.
    pub fn navigate(&self, path: &str) {
        self.location.set(format!("http://stash.local{path}"));
    }

    pub fn style(&self) -> Option<String> {
        self.document.style(STYLE_ID)
    }
}
