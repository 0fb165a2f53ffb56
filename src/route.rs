//! Client-side navigation detection.
//!
//! The host router changes the location without firing navigation events.
//! It does, however, re-render the page on every navigation, so each batch
//! of document mutations is used as a cue to re-read the location. A change
//! is reported when the full location string differs from the last one seen.
//!
//! Host contract: every client-side navigation mutates the document at least
//! once after the location has been updated. A navigation that does not
//! re-render is missed until the next mutation.

use std::sync::Arc;

use futures::future;
use futures::stream::{self, Stream, StreamExt};
use parking_lot::RwLock;
use reqwest::Url;
use tmdb_backdrop_common::RouteState;

/// Read access to the current location.
pub trait Location: Send + Sync {
    /// Full location string (e.g. `http://host/groups/42?x=1`).
    fn href(&self) -> String;
}

/// Location held in memory and updated by whoever drives navigation.
#[derive(Debug, Default)]
pub struct SharedLocation {
    href: RwLock<String>,
}

impl SharedLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: RwLock::new(href.into()),
        }
    }

    pub fn set(&self, href: impl Into<String>) {
        *self.href.write() = href.into();
    }
}

impl Location for SharedLocation {
    fn href(&self) -> String {
        self.href.read().clone()
    }
}

/// A navigation observed by [`RouteWatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    pub href: String,
}

/// Turns coarse mutation notifications into route changes.
pub struct RouteWatcher {
    location: Arc<dyn Location>,
    last_seen: Option<String>,
}

impl RouteWatcher {
    pub fn new(location: Arc<dyn Location>) -> Self {
        Self {
            location,
            last_seen: None,
        }
    }

    /// Compare the location with the last one seen. The first call always
    /// reports the current location.
    pub fn observe(&mut self) -> Option<RouteChange> {
        let href = self.location.href();
        if self.last_seen.as_deref() == Some(href.as_str()) {
            return None;
        }
        self.last_seen = Some(href.clone());
        Some(RouteChange { href })
    }

    /// Forget the last location so the next observation reports it again.
    pub fn reset(&mut self) {
        self.last_seen = None;
    }

    /// Route changes driven by `mutations`, one item per mutation batch.
    ///
    /// The current location is emitted first, before any mutation arrives.
    /// The stream ends when `mutations` ends.
    pub fn changes<S>(mut self, mutations: S) -> impl Stream<Item = RouteChange> + Send
    where
        S: Stream + Send + 'static,
    {
        let initial = self.observe();
        stream::iter(initial).chain(mutations.filter_map(move |_| future::ready(self.observe())))
    }
}

/// Path component of a location string; relative hrefs are accepted.
pub fn path_of(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Classify `href` against the group route prefix.
pub fn route_state(href: &str, prefix: &str) -> RouteState {
    RouteState::from_path(&path_of(href), prefix)
}
