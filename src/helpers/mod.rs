//! Helper functions for rendering
//!
//! URL generation, HTML tags and date display used by the page
//! templates and the "load more" endpoint.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;

use crate::config::SiteConfig;

/// Helpers bound to one site configuration
#[derive(Debug, Clone)]
pub struct Helpers {
    config: SiteConfig,
    dates: DateFormatter,
}

impl Helpers {
    /// Create a new helpers instance
    pub fn new(config: SiteConfig) -> anyhow::Result<Self> {
        let dates = config.date_formatter()?;
        Ok(Self { config, dates })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn dates(&self) -> &DateFormatter {
        &self.dates
    }

    /// Get url_for helper
    pub fn url_for(&self, path: &str) -> String {
        url_for(&self.config, path)
    }

    /// URL of an article page
    pub fn post_url(&self, uid: &str) -> String {
        url_for(&self.config, &post_path(uid))
    }

    /// Get link_to helper
    pub fn link_to(&self, path: &str, text: &str) -> String {
        link_to(&self.config, path, text, None)
    }

    /// Get css helper
    pub fn css(&self, path: &str) -> String {
        css(&self.config, path)
    }

    /// Display date without time; placeholder when missing or invalid
    pub fn date(&self, ts: Option<&str>) -> String {
        self.dates.format_or_placeholder(ts, false)
    }
}
