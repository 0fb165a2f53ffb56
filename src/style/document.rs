//! Document boundary for the injected style resource.
//!
//! [`Document`] is the narrow slice of a page the backdrop pipeline touches:
//! element presence and style nodes addressed by id. [`MemoryDocument`]
//! keeps both in memory; [`CssFileDocument`] renders the single style node to
//! a stylesheet file that a host loads as custom CSS.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tmdb_backdrop_common::{Error, Result};

/// Element and style-node access by id.
///
/// Implementations must keep at most one style node per id, and replace its
/// content as a whole.
pub trait Document: Send + Sync {
    /// True when an element with `id` is currently rendered.
    fn contains_element(&self, id: &str) -> bool;

    /// Text of the style node `id`, if it exists.
    fn style(&self, id: &str) -> Option<String>;

    /// Create the style node `id` or replace its text.
    fn set_style(&self, id: &str, css: &str) -> Result<()>;

    /// Remove the style node `id`. Returns whether a node was removed.
    fn remove_style(&self, id: &str) -> Result<bool>;
}

#[derive(Debug, Default)]
struct MemoryState {
    elements: HashSet<String>,
    /// Style nodes in insertion order, as in a document head.
    styles: Vec<(String, String)>,
    mutations: usize,
}

/// In-memory document.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    state: Mutex<MemoryState>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render an element (e.g. the page container).
    pub fn insert_element(&self, id: impl Into<String>) {
        self.state.lock().elements.insert(id.into());
    }

    pub fn remove_element(&self, id: &str) {
        self.state.lock().elements.remove(id);
    }

    /// Number of style nodes carrying `id`.
    pub fn style_count(&self, id: &str) -> usize {
        self.state
            .lock()
            .styles
            .iter()
            .filter(|(node_id, _)| node_id == id)
            .count()
    }

    /// Number of style writes and removals performed so far.
    pub fn mutations(&self) -> usize {
        self.state.lock().mutations
    }
}

impl Document for MemoryDocument {
    fn contains_element(&self, id: &str) -> bool {
        self.state.lock().elements.contains(id)
    }

    fn style(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .styles
            .iter()
            .find(|(node_id, _)| node_id == id)
            .map(|(_, css)| css.clone())
    }

    fn set_style(&self, id: &str, css: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.mutations += 1;
        match state.styles.iter_mut().find(|(node_id, _)| node_id == id) {
            Some((_, text)) => *text = css.to_string(),
            None => state.styles.push((id.to_string(), css.to_string())),
        }
        Ok(())
    }

    fn remove_style(&self, id: &str) -> Result<bool> {
        let mut state = self.state.lock();
        let before = state.styles.len();
        state.styles.retain(|(node_id, _)| node_id != id);
        let removed = state.styles.len() != before;
        if removed {
            state.mutations += 1;
        }
        Ok(removed)
    }
}

/// Document whose style node is a CSS file on disk.
///
/// Writes go through a temporary file in the same directory and are renamed
/// into place, so readers never see a partial stylesheet. A non-empty file
/// that does not start with the node's marker line is never overwritten or
/// removed. Elements are
/// treated as always present: the host renders the container whenever the
/// route matches.
#[derive(Debug)]
pub struct CssFileDocument {
    path: PathBuf,
}

impl CssFileDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn marker(id: &str) -> String {
        format!("/* {id} */\n")
    }
}

impl Document for CssFileDocument {
    fn contains_element(&self, _id: &str) -> bool {
        true
    }

    fn style(&self, id: &str) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        content.strip_prefix(&Self::marker(id)).map(str::to_string)
    }

    fn set_style(&self, id: &str, css: &str) -> Result<()> {
        match std::fs::read_to_string(&self.path) {
            Ok(existing)
                if !existing.trim().is_empty() && !existing.starts_with(&Self::marker(id)) =>
            {
                return Err(Error::invalid_input(format!(
                    "refusing to overwrite {:?}: not a backdrop stylesheet",
                    self.path
                )));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(Self::marker(id).as_bytes())?;
        tmp.write_all(css.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove_style(&self, id: &str) -> Result<bool> {
        if self.style(id).is_none() {
            return Ok(false);
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
