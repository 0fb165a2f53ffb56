//! TMDB (The Movie Database) backdrop client.
//!
//! Queries the v3 per-title image listing and picks one backdrop uniformly at
//! random. Failures are logged and reported as "no backdrop"; there is no
//! retry or caching.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use tmdb_backdrop_common::{AccessToken, BackdropCandidate, Error, MediaReference, Result};
use tracing::{debug, warn};

use crate::config::TmdbConfig;

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbImagesResponse {
    backdrops: Option<Vec<TmdbImage>>,
}

#[derive(Debug, Deserialize)]
struct TmdbImage {
    file_path: String,
}

// ---------------------------------------------------------------------------
// Backdrop source
// ---------------------------------------------------------------------------

/// Source of a single backdrop for a TMDB title.
#[async_trait]
pub trait BackdropSource: Send + Sync {
    /// Pick one backdrop for `reference`, or `None` when the title has none
    /// or the lookup failed.
    async fn fetch_backdrop(
        &self,
        reference: &MediaReference,
        token: &AccessToken,
    ) -> Option<BackdropCandidate>;
}

/// Pick one candidate uniformly at random.
///
/// The range is taken from the slice length at call time.
pub fn choose_backdrop<R: Rng + ?Sized>(
    candidates: &[BackdropCandidate],
    rng: &mut R,
) -> Option<BackdropCandidate> {
    if candidates.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..candidates.len());
    Some(candidates[idx].clone())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the TMDB image endpoints.
pub struct TmdbClient {
    http: reqwest::Client,
    api_url: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout: {}", e);
                reqwest::Client::new()
            });

        Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }

    /// List every backdrop TMDB has for `reference`.
    pub async fn backdrops(
        &self,
        reference: &MediaReference,
        token: &AccessToken,
    ) -> Result<Vec<BackdropCandidate>> {
        let path = reference.images_path();
        let url = format!("{}{}", self.api_url, path);
        debug!(path = %path, "TMDB get images");

        let resp = self
            .http
            .get(&url)
            .query(&[("api_key", token.as_str())])
            .send()
            .await
            .map_err(|e| Error::external_fetch(format!("TMDB request failed for {path}: {}", e.without_url())))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(Error::external_fetch(format!("TMDB {status} for {path}")));
        }

        let body: TmdbImagesResponse = resp
            .json()
            .await
            .map_err(|e| Error::external_fetch(format!("TMDB parse error for {path}: {}", e.without_url())))?;

        Ok(body
            .backdrops
            .unwrap_or_default()
            .into_iter()
            .map(|img| BackdropCandidate::new(img.file_path))
            .collect())
    }
}

#[async_trait]
impl BackdropSource for TmdbClient {
    async fn fetch_backdrop(
        &self,
        reference: &MediaReference,
        token: &AccessToken,
    ) -> Option<BackdropCandidate> {
        let candidates = match self.backdrops(reference, token).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(reference = %reference, "{}", e);
                return None;
            }
        };

        let chosen = choose_backdrop(&candidates, &mut rand::thread_rng());
        match &chosen {
            Some(c) => debug!(
                reference = %reference,
                candidates = candidates.len(),
                image_path = %c.image_path,
                "Selected TMDB backdrop"
            ),
            None => warn!(reference = %reference, "TMDB returned no backdrops"),
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use tmdb_backdrop_common::MediaKind;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TmdbClient {
        TmdbClient::new(&TmdbConfig {
            api_url: server.uri(),
            ..TmdbConfig::default()
        })
    }

    fn token() -> AccessToken {
        AccessToken::new("test-key").unwrap()
    }

    #[tokio::test]
    async fn fetches_single_backdrop_with_key_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603/images"))
            .and(query_param("api_key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 603,
                "backdrops": [{ "file_path": "/abc.jpg", "width": 1920, "height": 1080 }],
                "posters": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reference = MediaReference::new(MediaKind::Movie, "603");
        let chosen = client_for(&server).fetch_backdrop(&reference, &token()).await;
        assert_eq!(chosen, Some(BackdropCandidate::new("/abc.jpg")));
    }

    #[tokio::test]
    async fn empty_or_missing_backdrops_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tv/1/images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "backdrops": [] })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/collection/2/images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 2 })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let tv = MediaReference::new(MediaKind::Tv, "1");
        let collection = MediaReference::new(MediaKind::Collection, "2");
        assert!(client.fetch_backdrop(&tv, &token()).await.is_none());
        assert!(client.fetch_backdrop(&collection, &token()).await.is_none());
    }

    #[tokio::test]
    async fn http_error_is_external_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let reference = MediaReference::new(MediaKind::Movie, "1");
        let err = client_for(&server)
            .backdrops(&reference, &token())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ExternalFetch(_)));
        assert!(!err.to_string().contains("test-key"));
    }

    #[tokio::test]
    async fn malformed_json_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let reference = MediaReference::new(MediaKind::Movie, "1");
        assert!(client_for(&server)
            .fetch_backdrop(&reference, &token())
            .await
            .is_none());
    }

    #[test]
    fn choose_from_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(choose_backdrop(&[], &mut rng).is_none());
    }

    #[test]
    fn selection_is_roughly_uniform() {
        let candidates: Vec<_> = (0..4)
            .map(|i| BackdropCandidate::new(format!("/{i}.jpg")))
            .collect();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut counts = [0usize; 4];
        let draws = 40_000;

        for _ in 0..draws {
            let chosen = choose_backdrop(&candidates, &mut rng).unwrap();
            let idx = candidates.iter().position(|c| *c == chosen).unwrap();
            counts[idx] += 1;
        }

        let expected = draws / candidates.len();
        for count in counts {
            let deviation = count.abs_diff(expected) as f64 / expected as f64;
            assert!(deviation < 0.05, "counts {counts:?} not uniform");
        }
    }
}
