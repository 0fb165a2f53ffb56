//! Group page → TMDB reference resolution.
//!
//! A group's URL list is scanned for the first link on the TMDB domain, whose
//! path then yields the `{kind}/{id}` compound key.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use reqwest::Url;
use tmdb_backdrop_common::{MediaKind, MediaReference};
use tracing::{debug, warn};

use crate::host::HostClient;

/// Domain of the TMDB website (not the API host).
pub const TMDB_DOMAIN: &str = "themoviedb.org";

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)/(movie|tv|collection)/(\d+)").expect("static regex is valid")
    })
}

/// Resolves the TMDB reference attached to a group.
pub struct MediaResolver {
    host: Arc<dyn HostClient>,
}

impl MediaResolver {
    pub fn new(host: Arc<dyn HostClient>) -> Self {
        Self { host }
    }

    /// Find the TMDB reference of `group_id`.
    ///
    /// Returns `None` when the group has no TMDB link, when the link does not
    /// carry a recognisable kind/id, or when the host query fails (logged).
    pub async fn resolve(&self, group_id: &str) -> Option<MediaReference> {
        let urls = match self.host.group_urls(group_id).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!(group_id = %group_id, "Group URL query failed: {}", e);
                return None;
            }
        };

        let Some(url) = urls.iter().find(|u| is_tmdb_url(u)) else {
            debug!(group_id = %group_id, urls = urls.len(), "Group has no TMDB link");
            return None;
        };

        let reference = parse_reference(url);
        if reference.is_none() {
            warn!(group_id = %group_id, url = %url, "TMDB link has no kind/id segment");
        }
        reference
    }
}

/// True when `url` points at the TMDB website or one of its subdomains.
pub fn is_tmdb_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return false;
    };
    parsed.host_str().is_some_and(|host| {
        let host = host.to_ascii_lowercase();
        host == TMDB_DOMAIN || host.ends_with(&format!(".{TMDB_DOMAIN}"))
    })
}

/// Extract `{kind}/{id}` from a TMDB URL such as
/// `https://www.themoviedb.org/movie/603-the-matrix`.
pub fn parse_reference(url: &str) -> Option<MediaReference> {
    let captures = reference_pattern().captures(url)?;
    let kind: MediaKind = captures.get(1)?.as_str().parse().ok()?;
    let id = captures.get(2)?.as_str();
    Some(MediaReference::new(kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use tmdb_backdrop_common::{Error, Result};

    struct UrlHost(std::result::Result<Vec<&'static str>, ()>);

    #[async_trait]
    impl HostClient for UrlHost {
        async fn plugin_settings(&self) -> Result<Map<String, Value>> {
            Ok(Map::new())
        }

        async fn group_urls(&self, _group_id: &str) -> Result<Vec<String>> {
            self.0
                .clone()
                .map(|urls| urls.into_iter().map(String::from).collect())
                .map_err(|_| Error::data_query("boom"))
        }
    }

    fn resolver(urls: std::result::Result<Vec<&'static str>, ()>) -> MediaResolver {
        MediaResolver::new(Arc::new(UrlHost(urls)))
    }

    #[test]
    fn tmdb_domain_matching() {
        assert!(is_tmdb_url("https://www.themoviedb.org/movie/603"));
        assert!(is_tmdb_url("https://THEMOVIEDB.ORG/tv/1399"));
        assert!(!is_tmdb_url("https://www.imdb.com/title/tt0133093"));
        assert!(!is_tmdb_url("https://notthemoviedb.org/movie/1"));
        assert!(!is_tmdb_url("not a url"));
    }

    #[test]
    fn parses_kind_and_id() {
        assert_eq!(
            parse_reference("https://www.themoviedb.org/movie/603-the-matrix"),
            Some(MediaReference::new(MediaKind::Movie, "603"))
        );
        assert_eq!(
            parse_reference("https://www.themoviedb.org/TV/1399?language=en"),
            Some(MediaReference::new(MediaKind::Tv, "1399"))
        );
        assert_eq!(
            parse_reference("https://www.themoviedb.org/collection/2344"),
            Some(MediaReference::new(MediaKind::Collection, "2344"))
        );
        assert_eq!(parse_reference("https://www.themoviedb.org/person/287"), None);
    }

    #[tokio::test]
    async fn resolve_picks_first_tmdb_url() {
        let resolver = resolver(Ok(vec![
            "https://www.imdb.com/title/tt0133093",
            "https://www.themoviedb.org/movie/603",
            "https://www.themoviedb.org/movie/604",
        ]));
        assert_eq!(
            resolver.resolve("42").await,
            Some(MediaReference::new(MediaKind::Movie, "603"))
        );
    }

    #[tokio::test]
    async fn resolve_without_tmdb_url_is_none() {
        assert_eq!(resolver(Ok(vec![])).resolve("42").await, None);
        assert_eq!(
            resolver(Ok(vec!["https://www.imdb.com/title/tt1"]))
                .resolve("42")
                .await,
            None
        );
    }

    #[tokio::test]
    async fn resolve_tmdb_url_without_kind_is_none() {
        let resolver = resolver(Ok(vec!["https://www.themoviedb.org/person/287"]));
        assert_eq!(resolver.resolve("42").await, None);
    }

    #[tokio::test]
    async fn resolve_query_failure_is_none() {
        assert_eq!(resolver(Err(())).resolve("42").await, None);
    }
}
