//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateReport, Generator};
use crate::Blog;

/// Generate the static site from the configured CMS
pub async fn run(blog: &Blog, force: bool) -> Result<GenerateReport> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog, blog.fetcher()?)?;
    let report = generator.generate(force).await?;

    for (uid, reason) in &report.failed {
        tracing::warn!("Not generated: {} ({})", uid, reason);
    }

    let duration = start.elapsed();
    tracing::info!(
        "{} in {:.2}s",
        report.summary(),
        duration.as_secs_f64()
    );

    Ok(report)
}
