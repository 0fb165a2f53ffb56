//! Core type definitions for one backdrop update cycle.
//!
//! All values here are derived and ephemeral except [`AccessToken`], which
//! lives for the whole session once resolved.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Error;

/// Kind segment of a TMDB title URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A single movie.
    Movie,
    /// A TV series.
    Tv,
    /// A movie collection.
    Collection,
}

impl MediaKind {
    /// URL path segment used by TMDB for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Collection => "collection",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            "collection" => Ok(Self::Collection),
            other => Err(Error::invalid_input(format!("unknown media kind: {other}"))),
        }
    }
}

/// TMDB compound key for a title or collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaReference {
    pub kind: MediaKind,
    pub external_id: String,
}

impl MediaReference {
    pub fn new(kind: MediaKind, external_id: impl Into<String>) -> Self {
        Self {
            kind,
            external_id: external_id.into(),
        }
    }

    /// API path of the per-title image listing, e.g. `/movie/603/images`.
    pub fn images_path(&self) -> String {
        format!("/{}/{}/images", self.kind, self.external_id)
    }
}

impl fmt::Display for MediaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.external_id)
    }
}

/// Opaque TMDB API key.
///
/// The `Debug` implementation never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a token, rejecting blank values.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// A backdrop image chosen from the TMDB image listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackdropCandidate {
    /// Path fragment as returned by TMDB, e.g. `/abc.jpg`.
    pub image_path: String,
}

impl BackdropCandidate {
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
        }
    }

    /// Display URL under the given image base, e.g.
    /// `https://image.tmdb.org/t/p/original` + `/abc.jpg`.
    pub fn image_url(&self, image_base: &str) -> String {
        format!("{}{}", image_base.trim_end_matches('/'), self.image_path)
    }
}

/// Route classification derived from a location path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteState {
    group_id: Option<String>,
}

impl RouteState {
    /// Classify `path` against a group route prefix such as `/groups/`.
    ///
    /// The prefix may appear anywhere in the path so that hosts served under
    /// a base path still match. The id is the run of ASCII digits directly
    /// after the prefix; a prefix with no digits is not a group page.
    pub fn from_path(path: &str, prefix: &str) -> Self {
        let group_id = path.match_indices(prefix).find_map(|(idx, _)| {
            let rest = &path[idx + prefix.len()..];
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            (end > 0).then(|| rest[..end].to_string())
        });
        Self { group_id }
    }

    pub fn is_group_page(&self) -> bool {
        self.group_id.is_some()
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }
}
