//! tmdb-backdrop-common: shared types and errors.
//!
//! This crate provides the domain values that flow through one backdrop
//! update cycle:
//!
//! - **Route state**: whether the current location is a group detail page
//! - **Media references**: the TMDB compound key (kind + id) of a title
//! - **Access tokens**: the TMDB API key, redacted in debug output
//! - **Error handling**: the common error taxonomy and result alias
//!
//! # Examples
//!
//! ```
//! use tmdb_backdrop_common::{MediaKind, MediaReference, RouteState};
//!
//! let route = RouteState::from_path("/groups/42", "/groups/");
//! assert_eq!(route.group_id(), Some("42"));
//!
//! let reference = MediaReference::new(MediaKind::Movie, "603");
//! assert_eq!(reference.images_path(), "/movie/603/images");
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
