//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::Blog;

const DEFAULT_CONFIG: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
# IANA zone dates are shown in, e.g. America/Sao_Paulo (empty = UTC)
timezone: ''

# URL
url: http://example.com
root: /

# Directory
public_dir: public

# Seconds before a generated article page is fetched again
revalidate: 3600

# Prismic repository
# PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these
cms:
  endpoint: ''
  access_token:
  document_type: posts
  page_size: 1

# Utterances comments (needs a public GitHub repository)
comments:
  enable: true
  repo: ''
  issue_term: pathname
  label: 'comment :speech_balloon:'
  theme: photon-dark

generate:
  concurrency: 4
"#;

/// Initialize a new site in the given directory
///
/// An existing `_config.yml` is never overwritten.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }
    fs::write(&config_path, DEFAULT_CONFIG)?;

    let gitignore = target_dir.join(".gitignore");
    if !gitignore.exists() {
        fs::write(gitignore, format!("public/\n{}/\n", crate::cache::CACHE_DIR))?;
    }

    Ok(())
}

/// Run the init command with an existing Blog instance
pub fn run(blog: &Blog) -> Result<()> {
    init_site(&blog.base_dir)
}
