//! spacetraveling: a statically generated blog backed by a headless CMS
//!
//! Articles are fetched from a Prismic repository, normalized into
//! canonical records and rendered into a paginated listing page and one
//! page per article. The listing grows in the browser through a "load
//! more" endpoint that follows the backend's next-page cursors.

pub mod cache;
pub mod cms;
pub mod commands;
pub mod comments;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod pagination;
pub mod server;
pub mod templates;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cms::{ContentFetcher, PrismicClient};

/// The blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Create a new Blog instance from a directory
    ///
    /// Reads `_config.yml` when present, then applies environment overrides.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> anyhow::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a Blog from an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// A client for the configured CMS repository
    pub fn fetcher(&self) -> anyhow::Result<Arc<dyn ContentFetcher>> {
        let cms = &self.config.cms;
        if cms.endpoint.is_empty() {
            anyhow::bail!(
                "No CMS endpoint configured: set cms.endpoint in _config.yml or {}",
                config::ENDPOINT_ENV
            );
        }
        Ok(Arc::new(PrismicClient::new(
            cms.endpoint.clone(),
            cms.access_token.clone(),
        )))
    }

    /// Generate the static site
    pub async fn generate(&self, force: bool) -> anyhow::Result<generator::GenerateReport> {
        commands::generate::run(self, force).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> anyhow::Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_without_config() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.public_dir, dir.path().join("public"));
        assert_eq!(blog.config.cms.document_type, "posts");
    }

    #[test]
    fn test_new_with_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("_config.yml"),
            "title: Space\npublic_dir: out\ncms:\n  endpoint: https://repo.cdn.prismic.io/api/v2\n",
        )
        .unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Space");
        assert_eq!(blog.public_dir, dir.path().join("out"));
        assert!(blog.fetcher().is_ok());
    }

    #[test]
    fn test_fetcher_requires_endpoint() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::with_config(dir.path(), config::SiteConfig::default());
        assert!(blog.fetcher().is_err());
    }
}
