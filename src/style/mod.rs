//! Backdrop style injection.
//!
//! [`StyleInjector`] owns the single style node identified by the configured
//! style id. It creates it lazily, replaces its text as a whole and removes
//! it when the current group has no TMDB reference.
//!
//! A crossfade runs in three steps:
//!
//! 1. fade-out snapshot (old image, opacity 0)
//! 2. wait for the fade duration and the preload of the new image, together
//! 3. fade-in snapshot (new image under the overlay, opacity 1, layout rules)
//!
//! The plain-swap variant skips step 1 and the fade wait.
//!
//! Every write is numbered. A cycle whose preload fails restores the earlier
//! stylesheet only when its own fade-out is still the latest write.

pub mod document;
pub mod preload;
pub mod sheet;

pub use document::{CssFileDocument, Document, MemoryDocument};
pub use preload::{HttpPreloader, ImagePreloader, NoPreload};
pub use sheet::StyleSheet;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tmdb_backdrop_common::Result;
use tracing::{debug, info, warn};

use crate::config::StyleConfig;

/// Result of an apply attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The fade-in snapshot was written.
    Applied,
    /// A newer navigation took over before the final write.
    Superseded,
    /// The new image could not be loaded; the previous look was restored.
    PreloadFailed,
    /// The document rejected a write.
    WriteFailed,
}

/// Maintains the single backdrop style node.
pub struct StyleInjector {
    document: Arc<dyn Document>,
    preloader: Arc<dyn ImagePreloader>,
    sheet: StyleSheet,
    style_id: String,
    crossfade: bool,
    fade: Duration,
    /// Image URL of the last completed fade-in.
    current: Mutex<Option<String>>,
    /// Number of successful writes to the node, fade-outs included.
    writes: Mutex<u64>,
}

impl StyleInjector {
    pub fn new(
        document: Arc<dyn Document>,
        preloader: Arc<dyn ImagePreloader>,
        container_id: &str,
        style_id: impl Into<String>,
        config: &StyleConfig,
    ) -> Self {
        Self {
            document,
            preloader,
            sheet: StyleSheet::new(container_id, config),
            style_id: style_id.into(),
            crossfade: config.crossfade,
            fade: config.fade(),
            current: Mutex::new(None),
            writes: Mutex::new(0),
        }
    }

    pub fn style_id(&self) -> &str {
        &self.style_id
    }

    /// Image URL currently shown, if a backdrop is applied.
    pub fn current_image(&self) -> Option<String> {
        self.current.lock().clone()
    }

    /// Crossfade to `image_url` unconditionally.
    pub async fn apply_crossfade(&self, image_url: &str) -> ApplyOutcome {
        self.apply_crossfade_while(image_url, || true).await
    }

    /// Crossfade to `image_url` as long as `still_current` holds.
    ///
    /// `still_current` is checked before each write. Once it stops holding
    /// the call writes nothing more and reports [`ApplyOutcome::Superseded`];
    /// the newer cycle owns the node from then on.
    pub async fn apply_crossfade_while<F>(&self, image_url: &str, still_current: F) -> ApplyOutcome
    where
        F: Fn() -> bool + Send + Sync,
    {
        if !still_current() {
            return ApplyOutcome::Superseded;
        }

        let previous_css = self.document.style(&self.style_id);
        let previous_image = self.current_image();

        let fade_out = if self.crossfade {
            let css = self.sheet.fade_out(previous_image.as_deref());
            match self.write(&css) {
                Ok(seq) => Some(seq),
                Err(e) => {
                    warn!(style_id = %self.style_id, "Failed to write fade-out stylesheet: {}", e);
                    return ApplyOutcome::WriteFailed;
                }
            }
        } else {
            None
        };

        let fade = if self.crossfade { self.fade } else { Duration::ZERO };
        let (_, preloaded) = tokio::join!(tokio::time::sleep(fade), self.preloader.preload(image_url));

        if !still_current() {
            debug!(image_url = %image_url, "Crossfade superseded by newer navigation");
            return ApplyOutcome::Superseded;
        }

        if let Err(e) = preloaded {
            warn!(image_url = %image_url, "Backdrop preload failed: {}", e);
            self.restore(fade_out, previous_css);
            return ApplyOutcome::PreloadFailed;
        }

        let css = self.sheet.fade_in(image_url);
        if let Err(e) = self.write(&css) {
            warn!(style_id = %self.style_id, "Failed to write backdrop stylesheet: {}", e);
            return ApplyOutcome::WriteFailed;
        }
        *self.current.lock() = Some(image_url.to_string());
        info!(image_url = %image_url, "Backdrop applied");
        ApplyOutcome::Applied
    }

    /// Remove the style node. No-op when absent; never fails.
    pub fn clear(&self) -> bool {
        let mut writes = self.writes.lock();
        *self.current.lock() = None;
        match self.document.remove_style(&self.style_id) {
            Ok(removed) => {
                if removed {
                    *writes += 1;
                    info!(style_id = %self.style_id, "Backdrop cleared");
                }
                removed
            }
            Err(e) => {
                warn!(style_id = %self.style_id, "Failed to remove backdrop stylesheet: {}", e);
                false
            }
        }
    }

    /// Replace the node's text and return the sequence number of the write.
    fn write(&self, css: &str) -> Result<u64> {
        let mut writes = self.writes.lock();
        self.document.set_style(&self.style_id, css)?;
        *writes += 1;
        Ok(*writes)
    }

    /// Put `previous_css` back, provided the fade-out written as `fade_out`
    /// is still the last write to the node.
    fn restore(&self, fade_out: Option<u64>, previous_css: Option<String>) {
        let Some(seq) = fade_out else {
            return;
        };
        let mut writes = self.writes.lock();
        if *writes != seq {
            debug!(style_id = %self.style_id, "Stylesheet rewritten since fade-out; not restoring");
            return;
        }
        let result = match previous_css {
            Some(css) => self.document.set_style(&self.style_id, &css),
            None => self.document.remove_style(&self.style_id).map(|_| ()),
        };
        match result {
            Ok(()) => *writes += 1,
            Err(e) => warn!(style_id = %self.style_id, "Failed to restore backdrop stylesheet: {}", e),
        }
    }
}
