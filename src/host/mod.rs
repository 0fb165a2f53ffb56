//! Host application boundary.
//!
//! The backdrop pipeline reads two things from the host: the plugin settings
//! blob (for the TMDB key) and the URL list of a group. Both are read-only.
//! [`StashClient`] implements them against the Stash GraphQL endpoint.

pub mod stash;

pub use stash::StashClient;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tmdb_backdrop_common::Result;

/// Read-only queries against the host application.
#[async_trait]
pub trait HostClient: Send + Sync {
    /// Settings of every plugin, keyed by plugin id.
    ///
    /// Fails with [`Error::ConfigUnavailable`](tmdb_backdrop_common::Error).
    async fn plugin_settings(&self) -> Result<Map<String, Value>>;

    /// URLs attached to the group with the given id. An unknown group yields
    /// an empty list.
    ///
    /// Fails with [`Error::DataQuery`](tmdb_backdrop_common::Error).
    async fn group_urls(&self, group_id: &str) -> Result<Vec<String>>;
}
