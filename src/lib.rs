//! tmdb-backdrop - TMDB backdrops for Stash group pages
//!
//! This library crate exposes the backdrop pipeline for integration testing.

pub mod config;
pub mod host;
pub mod orchestrator;
pub mod resolver;
pub mod route;
pub mod settings;
pub mod style;
pub mod tmdb;
