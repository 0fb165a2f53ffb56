//! Stylesheet snapshots for the backdrop layer.
//!
//! Every snapshot is a complete stylesheet: the style node is always replaced
//! as a whole, never patched.

use std::time::Duration;

use crate::config::StyleConfig;

/// Renders backdrop stylesheets for one page container.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    container: String,
    fade: Duration,
    overlay_opacity: f32,
    hidden: Vec<String>,
    transparent: Vec<String>,
    borderless: Vec<String>,
}

impl StyleSheet {
    pub fn new(container_id: &str, config: &StyleConfig) -> Self {
        Self {
            container: format!("#{container_id}"),
            fade: config.fade(),
            overlay_opacity: config.overlay_opacity,
            hidden: config.hidden.clone(),
            transparent: config.transparent.clone(),
            borderless: config.borderless.clone(),
        }
    }

    /// Snapshot with the layer faded out. `previous` keeps the image that is
    /// fading away; layout overrides stay in place while it is shown.
    pub fn fade_out(&self, previous: Option<&str>) -> String {
        let mut css = self.layer(previous, 0.0);
        if previous.is_some() {
            self.layout_rules(&mut css);
        }
        css
    }

    /// Snapshot with `image_url` fully shown under the overlay.
    pub fn fade_in(&self, image_url: &str) -> String {
        let mut css = self.layer(Some(image_url), 1.0);
        self.layout_rules(&mut css);
        css
    }

    fn layer(&self, image_url: Option<&str>, opacity: f32) -> String {
        let c = &self.container;
        let background = match image_url {
            Some(url) => {
                let shade = format!("rgba(0, 0, 0, {})", self.overlay_opacity);
                format!(
                    "linear-gradient({shade}, {shade}), url(\"{}\")",
                    escape_css_string(url)
                )
            }
            None => "none".to_string(),
        };
        let secs = self.fade.as_secs_f32();

        format!(
            "{c} {{\n    position: relative;\n    isolation: isolate;\n    min-height: 100vh;\n}}\n\
             {c}::before {{\n    content: \"\";\n    position: fixed;\n    inset: 0;\n    z-index: -1;\n    \
             pointer-events: none;\n    background-image: {background} !important;\n    \
             background-size: cover !important;\n    background-position: center !important;\n    \
             transition: opacity {secs}s ease-in-out;\n    opacity: {opacity} !important;\n}}\n"
        )
    }

    fn layout_rules(&self, css: &mut String) {
        if let Some(sel) = self.scoped(&self.hidden) {
            css.push_str(&format!("{sel} {{\n    display: none !important;\n}}\n"));
        }
        if let Some(sel) = self.scoped(&self.transparent) {
            css.push_str(&format!(
                "{sel} {{\n    background-color: transparent !important;\n    box-shadow: none !important;\n}}\n"
            ));
        }
        if let Some(sel) = self.scoped(&self.borderless) {
            css.push_str(&format!("{sel} {{\n    border-bottom: none !important;\n}}\n"));
        }
    }

    /// Join `selectors` as a selector list scoped under the container.
    fn scoped(&self, selectors: &[String]) -> Option<String> {
        let list: Vec<String> = selectors
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| format!("{} {s}", self.container))
            .collect();
        (!list.is_empty()).then(|| list.join(",\n"))
    }
}

/// Escape a value for use inside a double-quoted CSS string.
fn escape_css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' | '\r' => out.push_str("\\a "),
            _ => out.push(ch),
        }
    }
    out
}
