use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tmdb_backdrop_common::{Error, Result};

use super::HostClient;
use crate::config::StashConfig;

const SETTINGS_QUERY: &str = "{ configuration { plugins } }";
const FIND_GROUP_QUERY: &str = "query FindGroup($id: ID!) { findGroup(id: $id) { urls } }";

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ConfigurationData {
    configuration: PluginsData,
}

#[derive(Debug, Deserialize)]
struct PluginsData {
    #[serde(default)]
    plugins: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct FindGroupData {
    #[serde(rename = "findGroup")]
    find_group: Option<GroupUrls>,
}

#[derive(Debug, Deserialize)]
struct GroupUrls {
    #[serde(default)]
    urls: Vec<String>,
}

/// GraphQL client for a Stash server.
pub struct StashClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl StashClient {
    pub fn new(config: &StashConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            endpoint: format!("{}/graphql", config.url.trim_end_matches('/')),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> anyhow::Result<T> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }));
        if let Some(key) = &self.api_key {
            request = request.header("ApiKey", key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to POST {}", self.endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Stash GraphQL returned {}: {}", status, body);
        }

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .context("Failed to parse Stash GraphQL response")?;

        if let Some(err) = body.errors.first() {
            anyhow::bail!("Stash GraphQL error: {}", err.message);
        }

        body.data.context("Stash GraphQL response has no data")
    }
}

#[async_trait]
impl HostClient for StashClient {
    async fn plugin_settings(&self) -> Result<Map<String, Value>> {
        let data: ConfigurationData = self
            .query(SETTINGS_QUERY, json!({}))
            .await
            .map_err(|e| Error::config_unavailable(format!("{e:#}")))?;

        Ok(data.configuration.plugins.unwrap_or_default())
    }

    async fn group_urls(&self, group_id: &str) -> Result<Vec<String>> {
        let data: FindGroupData = self
            .query(FIND_GROUP_QUERY, json!({ "id": group_id }))
            .await
            .map_err(|e| Error::data_query(format!("{e:#}")))?;

        Ok(data.find_group.map(|g| g.urls).unwrap_or_default())
    }
}
