//! Out-of-band image preloading.
//!
//! The new backdrop is fetched before it is swapped in so the fade-in never
//! shows a partially loaded image.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tmdb_backdrop_common::{Error, Result};

/// Loads an image ahead of display.
#[async_trait]
pub trait ImagePreloader: Send + Sync {
    /// Resolve once `url` is loaded and recognisable as an image.
    async fn preload(&self, url: &str) -> Result<()>;
}

/// Preloader that downloads the image and sniffs its format.
pub struct HttpPreloader {
    client: Client,
}

impl HttpPreloader {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });
        Self { client }
    }
}

#[async_trait]
impl ImagePreloader for HttpPreloader {
    async fn preload(&self, url: &str) -> Result<()> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::external_fetch(format!("image download failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::external_fetch(format!(
                "image {}: {}",
                resp.status(),
                url
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::external_fetch(format!("image read error: {e}")))?;

        let format = image::guess_format(&bytes)
            .map_err(|e| Error::external_fetch(format!("not an image: {url}: {e}")))?;
        tracing::debug!(url = %url, format = ?format, size = bytes.len(), "Preloaded backdrop");
        Ok(())
    }
}

/// Preloader that resolves immediately (preloading disabled).
#[derive(Debug, Default)]
pub struct NoPreload;

#[async_trait]
impl ImagePreloader for NoPreload {
    async fn preload(&self, _url: &str) -> Result<()> {
        Ok(())
    }
}
