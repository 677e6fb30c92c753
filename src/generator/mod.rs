//! Generator module - builds the static listing and article pages from the CMS

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cache::{self, CacheDb};
use crate::cms::{ContentFetcher, Query, RawDocument};
use crate::comments;
use crate::content::{normalize_post, normalize_summary, Post, PostLink, PostSummary};
use crate::helpers::{post_output_path, Helpers};
use crate::pagination::{normalize_page, PaginationController};
use crate::templates::TemplateRenderer;
use crate::Blog;

/// Largest page size the backend accepts
const MAX_PAGE_SIZE: u32 = 100;

/// Cache key of the listing page
const INDEX_KEY: &str = "index";

/// Site stylesheet
const STYLE_CSS: &str = include_str!("style.css");

/// An article with its neighbours in publication order
#[derive(Debug, Clone)]
pub struct Article {
    pub post: Post,
    pub prev: Option<PostLink>,
    pub next: Option<PostLink>,
}

/// Outcome of a generation run
#[derive(Debug, Clone, Default)]
pub struct GenerateReport {
    /// Pages written
    pub generated: usize,
    /// Pages still fresh and left untouched
    pub skipped: usize,
    /// Pages of deleted articles that were removed
    pub removed: usize,
    /// Articles that could not be generated, with the reason
    pub failed: Vec<(String, String)>,
}

impl GenerateReport {
    pub fn summary(&self) -> String {
        format!(
            "{} generated, {} fresh, {} removed, {} failed",
            self.generated,
            self.skipped,
            self.removed,
            self.failed.len()
        )
    }
}

/// Static site generator backed by a content fetcher
#[derive(Clone)]
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    fetcher: Arc<dyn ContentFetcher>,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog, fetcher: Arc<dyn ContentFetcher>) -> Result<Self> {
        let helpers = Helpers::new(blog.config.clone())?;
        Ok(Self {
            blog: blog.clone(),
            renderer: TemplateRenderer::new(helpers),
            fetcher,
        })
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn fetcher(&self) -> &Arc<dyn ContentFetcher> {
        &self.fetcher
    }

    fn doc_type(&self) -> &str {
        &self.blog.config.cms.document_type
    }

    /// The first listing page query
    pub fn listing_query(&self, reference: Option<String>) -> Query {
        let doc_type = self.doc_type();
        Query::documents_of_type(doc_type)
            .fetch(
                ["title", "subtitle", "author"]
                    .iter()
                    .map(|field| format!("{}.{}", doc_type, field)),
            )
            .page_size(self.blog.config.cms.page_size.max(1))
            .with_ref(reference)
    }

    /// Fetch the first listing page and start pagination from it
    pub async fn fetch_listing(
        &self,
        reference: Option<String>,
    ) -> crate::Result<PaginationController> {
        let raw = self.fetcher.query(&self.listing_query(reference)).await?;
        let page = normalize_page(&raw)?;
        tracing::debug!(
            "Listing: {} posts, more: {}",
            page.results.len(),
            page.next_cursor.is_some()
        );
        Ok(PaginationController::initialize(page))
    }

    /// Every article document, walking all result pages
    pub async fn fetch_all(&self, reference: Option<String>) -> crate::Result<Vec<RawDocument>> {
        let query = Query::documents_of_type(self.doc_type())
            .fetch([format!("{}.title", self.doc_type())])
            .page_size(MAX_PAGE_SIZE)
            .with_ref(reference);

        let mut page = self.fetcher.query(&query).await?;
        let mut documents = std::mem::take(&mut page.results);
        while let Some(cursor) = page.next_page.take() {
            page = self.fetcher.fetch_page(&cursor).await?;
            documents.append(&mut page.results);
        }
        Ok(documents)
    }

    /// Every article summary; malformed documents are logged and skipped
    pub async fn fetch_summaries(&self, reference: Option<String>) -> crate::Result<Vec<PostSummary>> {
        let documents = self.fetch_all(reference).await?;
        Ok(documents
            .iter()
            .filter_map(|raw| match normalize_summary(raw) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    tracing::warn!("Skipping document {:?}: {}", raw.id, e);
                    None
                }
            })
            .collect())
    }

    /// Fetch an article and its neighbours; `None` if no such uid
    pub async fn fetch_article(
        &self,
        uid: &str,
        reference: Option<String>,
    ) -> crate::Result<Option<Article>> {
        let Some(raw) = self
            .fetcher
            .get_by_uid(self.doc_type(), uid, reference.clone())
            .await?
        else {
            return Ok(None);
        };
        let post = normalize_post(&raw)?;

        // identity was checked by normalize_post
        let id = raw.id.as_deref().unwrap_or_default();
        let prev = self
            .neighbour(id, "[document.first_publication_date]", reference.clone())
            .await?;
        let next = self
            .neighbour(id, "[document.first_publication_date desc]", reference)
            .await?;

        Ok(Some(Article { post, prev, next }))
    }

    async fn neighbour(
        &self,
        document_id: &str,
        orderings: &str,
        reference: Option<String>,
    ) -> crate::Result<Option<PostLink>> {
        let query = Query::documents_of_type(self.doc_type())
            .page_size(1)
            .after(document_id)
            .orderings(orderings)
            .with_ref(reference);
        let page = self.fetcher.query(&query).await?;

        Ok(page.results.first().and_then(|raw| match normalize_summary(raw) {
            Ok(summary) => Some(PostLink::from(&summary)),
            Err(e) => {
                tracing::warn!("Ignoring malformed neighbour of {}: {}", document_id, e);
                None
            }
        }))
    }

    /// Render the listing page
    pub async fn render_index_page(
        &self,
        reference: Option<String>,
        preview: bool,
    ) -> crate::Result<String> {
        let controller = self.fetch_listing(reference).await?;
        Ok(self.renderer.render_index(controller.state(), preview))
    }

    /// Render an article page; `None` if no such uid
    pub async fn render_post_page(
        &self,
        uid: &str,
        reference: Option<String>,
        preview: bool,
    ) -> crate::Result<Option<String>> {
        let Some(article) = self.fetch_article(uid, reference).await? else {
            return Ok(None);
        };
        Ok(Some(self.render_article(&article, preview)))
    }

    fn render_article(&self, article: &Article, preview: bool) -> String {
        let mut widget = comments::from_config(&self.blog.config.comments);
        let html = self.renderer.render_post(
            &article.post,
            article.prev.as_ref(),
            article.next.as_ref(),
            widget.as_mut(),
            preview,
        );
        widget.unmount();
        html
    }

    /// Generate the whole site
    ///
    /// Fresh pages are kept unless `force` is set. A listing fetch failure
    /// aborts the run; a failing article only fails its own page.
    pub async fn generate(&self, force: bool) -> Result<GenerateReport> {
        let public_dir = &self.blog.public_dir;
        fs::create_dir_all(public_dir)?;
        fs::create_dir_all(public_dir.join("css"))?;
        fs::write(public_dir.join("css/style.css"), STYLE_CSS)?;

        let mut cache = CacheDb::load(&self.blog.base_dir);
        let config_yaml = serde_yaml::to_string(&self.blog.config)?;
        cache.check_config(cache::hash_content(&config_yaml));

        let mut report = GenerateReport::default();
        let now = cache::now();

        // One content snapshot for the whole run
        let reference = self.fetcher.resolve_ref().await?;

        // Listing
        let index = self.render_index_page(reference.clone(), false).await?;
        write_page(public_dir, "index.html", &index)?;
        cache.record(INDEX_KEY, None, now, "index.html");
        report.generated += 1;
        tracing::info!("Generated listing page");

        // Articles
        let documents = self.fetch_all(reference.clone()).await?;
        tracing::info!("Found {} articles", documents.len());

        let mut keys = vec![INDEX_KEY.to_string()];
        let mut pending = Vec::new();
        for raw in &documents {
            let summary = match normalize_summary(raw) {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!("Skipping document {:?}: {}", raw.id, e);
                    report
                        .failed
                        .push((raw.id.clone().unwrap_or_default(), e.to_string()));
                    continue;
                }
            };
            let Some(output) = post_output_path(&summary.id) else {
                tracing::warn!("Skipping document {:?}: unusable uid {:?}", raw.id, summary.id);
                report
                    .failed
                    .push((summary.id, "uid is not a valid path segment".to_string()));
                continue;
            };
            keys.push(summary.id.clone());

            let last = raw.last_publication_date.as_deref();
            if !force
                && cache.is_fresh(&summary.id, last, now, self.blog.config.revalidate)
                && public_dir.join(&output).exists()
            {
                tracing::debug!("Fresh: {}", output);
                report.skipped += 1;
                continue;
            }
            pending.push((summary.id, output));
        }

        let semaphore = Arc::new(Semaphore::new(self.blog.config.generate.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for (uid, output) in pending {
            let generator = self.clone();
            let semaphore = semaphore.clone();
            let reference = reference.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = generator.generate_article(&uid, &output, reference).await;
                (uid, output, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (uid, output, result) = joined?;
            match result {
                Ok(last_publication_date) => {
                    cache.record(&uid, last_publication_date.as_deref(), now, &output);
                    report.generated += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to generate {}: {}", uid, e);
                    report.failed.push((uid, e.to_string()));
                }
            }
        }

        // Articles that no longer exist
        for entry in cache.prune(keys.iter().map(String::as_str)) {
            let path = public_dir.join(&entry.output_path);
            if path.exists() {
                fs::remove_file(&path)?;
                if let Some(dir) = path.parent() {
                    // only succeeds once the directory is empty
                    let _ = fs::remove_dir(dir);
                }
                tracing::info!("Removed: {:?}", path);
            }
            report.removed += 1;
        }

        cache.save(&self.blog.base_dir)?;
        Ok(report)
    }

    /// Generate one article page, returning the document version it reflects
    async fn generate_article(
        &self,
        uid: &str,
        output: &str,
        reference: Option<String>,
    ) -> crate::Result<Option<String>> {
        let article = self
            .fetch_article(uid, reference)
            .await?
            .ok_or_else(|| crate::Error::NotFound(uid.to_string()))?;

        let html = self.render_article(&article, false);
        write_page(&self.blog.public_dir, output, &html)?;
        tracing::debug!("Generated: {}", output);
        Ok(article.post.last_publication_date)
    }
}

fn write_page(public_dir: &Path, output: &str, html: &str) -> std::io::Result<()> {
    let path = public_dir.join(output);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::testing::{raw_post, MemoryFetcher};
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    fn blog(dir: &Path) -> Blog {
        let mut config = SiteConfig::default();
        config.cms.page_size = 2;
        Blog::with_config(dir, config)
    }

    fn documents() -> Vec<RawDocument> {
        vec![
            raw_post("newest", "2021-03-20T10:00:00+0000", "Newest"),
            raw_post("middle", "2021-03-10T10:00:00+0000", "Middle"),
            raw_post("oldest", "2021-03-01T10:00:00+0000", "Oldest"),
        ]
    }

    fn generator(dir: &Path, fetcher: Arc<MemoryFetcher>) -> Generator {
        Generator::new(&blog(dir), fetcher).unwrap()
    }

    #[tokio::test]
    async fn test_listing_query() {
        let dir = TempDir::new().unwrap();
        let generator = generator(dir.path(), Arc::new(MemoryFetcher::new(documents())));
        let query = generator.listing_query(Some("preview-ref".to_string()));
        assert_eq!(
            query.fetch,
            vec!["posts.title", "posts.subtitle", "posts.author"]
        );
        assert_eq!(query.page_size, Some(2));
        assert_eq!(query.reference.as_deref(), Some("preview-ref"));
    }

    #[tokio::test]
    async fn test_fetch_article_neighbours() {
        let dir = TempDir::new().unwrap();
        let generator = generator(dir.path(), Arc::new(MemoryFetcher::new(documents())));

        let article = generator.fetch_article("middle", None).await.unwrap().unwrap();
        assert_eq!(article.post.title, "Middle");
        assert_eq!(article.prev.map(|p| p.id).as_deref(), Some("newest"));
        assert_eq!(article.next.map(|p| p.id).as_deref(), Some("oldest"));

        let article = generator.fetch_article("oldest", None).await.unwrap().unwrap();
        assert_eq!(article.next, None);

        assert!(generator.fetch_article("missing", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_all_walks_pages() {
        let dir = TempDir::new().unwrap();
        let docs: Vec<_> = (0..150)
            .map(|i| raw_post(&format!("p{}", i), "2021-03-01T10:00:00+0000", "T"))
            .collect();
        let generator = generator(dir.path(), Arc::new(MemoryFetcher::new(docs)));
        assert_eq!(generator.fetch_all(None).await.unwrap().len(), 150);
    }

    #[tokio::test]
    async fn test_generate_site() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MemoryFetcher::new(documents()));
        let generator = generator(dir.path(), fetcher);

        let report = generator.generate(false).await.unwrap();
        assert_eq!(report.generated, 4);
        assert!(report.failed.is_empty());

        let public = dir.path().join("public");
        let index = fs::read_to_string(public.join("index.html")).unwrap();
        assert!(index.contains("Newest"));
        assert!(index.contains("Middle"));
        assert!(!index.contains("Oldest"));
        assert!(index.contains("Carregar mais posts"));

        let post = fs::read_to_string(public.join("post/middle/index.html")).unwrap();
        assert!(post.contains("<h1>Middle</h1>"));
        assert!(post.contains("Post anterior"));
        assert!(post.contains("Próximo post"));
        assert!(public.join("css/style.css").exists());
    }

    #[tokio::test]
    async fn test_fresh_pages_skipped() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MemoryFetcher::new(documents()));
        let generator = generator(dir.path(), fetcher);

        generator.generate(false).await.unwrap();
        let report = generator.generate(false).await.unwrap();
        assert_eq!(report.skipped, 3);
        assert_eq!(report.generated, 1);

        let report = generator.generate(true).await.unwrap();
        assert_eq!(report.skipped, 0);
        assert_eq!(report.generated, 4);
    }

    #[tokio::test]
    async fn test_malformed_document_fails_only_its_page() {
        let dir = TempDir::new().unwrap();
        let mut docs = documents();
        docs[2].uid = None;
        docs[2].data["title"] = serde_json::json!("Broken");
        let generator = generator(dir.path(), Arc::new(MemoryFetcher::new(docs)));

        let report = generator.generate(false).await.unwrap();
        assert_eq!(report.generated, 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "ID-oldest");
    }

    #[tokio::test]
    async fn test_listing_failure_aborts() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MemoryFetcher::new(documents()));
        fetcher.set_failing(true);
        let generator = generator(dir.path(), fetcher);
        assert!(generator.generate(false).await.is_err());
    }

    #[tokio::test]
    async fn test_deleted_article_removed() {
        let dir = TempDir::new().unwrap();
        generator(dir.path(), Arc::new(MemoryFetcher::new(documents())))
            .generate(false)
            .await
            .unwrap();

        let remaining = documents().into_iter().take(2).collect();
        let report = generator(dir.path(), Arc::new(MemoryFetcher::new(remaining)))
            .generate(false)
            .await
            .unwrap();
        assert_eq!(report.removed, 1);
        assert!(!dir.path().join("public/post/oldest/index.html").exists());
    }

    #[tokio::test]
    async fn test_forced_run_removes_deleted_article() {
        let dir = TempDir::new().unwrap();
        generator(dir.path(), Arc::new(MemoryFetcher::new(documents())))
            .generate(false)
            .await
            .unwrap();

        let remaining: Vec<_> = documents().into_iter().take(2).collect();
        let report = generator(dir.path(), Arc::new(MemoryFetcher::new(remaining.clone())))
            .generate(true)
            .await
            .unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(report.generated, 3);
        assert!(!dir.path().join("public/post/oldest/index.html").exists());

        let report = generator(dir.path(), Arc::new(MemoryFetcher::new(remaining)))
            .generate(false)
            .await
            .unwrap();
        assert_eq!(report.removed, 0);
        assert_eq!(report.skipped, 2);
    }

    #[tokio::test]
    async fn test_config_change_removes_deleted_article() {
        let dir = TempDir::new().unwrap();
        generator(dir.path(), Arc::new(MemoryFetcher::new(documents())))
            .generate(false)
            .await
            .unwrap();

        let mut changed = blog(dir.path());
        changed.config.title = "Space".to_string();
        let remaining = documents().into_iter().take(2).collect();
        let report = Generator::new(&changed, Arc::new(MemoryFetcher::new(remaining)))
            .unwrap()
            .generate(false)
            .await
            .unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(report.skipped, 0);
        assert!(!dir.path().join("public/post/oldest/index.html").exists());
        let post = fs::read_to_string(dir.path().join("public/post/middle/index.html")).unwrap();
        assert!(post.contains("Middle | Space"));
    }

    #[tokio::test]
    async fn test_uid_written_unencoded() {
        let dir = TempDir::new().unwrap();
        let docs = vec![
            raw_post("a b", "2021-03-01T10:00:00+0000", "Spaced"),
            raw_post("..", "2021-03-02T10:00:00+0000", "Dots"),
        ];
        let report = generator(dir.path(), Arc::new(MemoryFetcher::new(docs)))
            .generate(false)
            .await
            .unwrap();

        assert!(dir.path().join("public/post/a b/index.html").exists());
        assert!(!dir.path().join("public/post/a%20b").exists());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "..");
    }

    #[tokio::test]
    async fn test_run_pinned_to_one_ref() {
        let dir = TempDir::new().unwrap();
        let mut fetcher = MemoryFetcher::new(documents());
        fetcher.master_ref = Some("master-1".to_string());
        let fetcher = Arc::new(fetcher);

        generator(dir.path(), fetcher.clone())
            .generate(false)
            .await
            .unwrap();

        assert_eq!(fetcher.ref_lookups.load(std::sync::atomic::Ordering::SeqCst), 1);
        let queries = fetcher.queries.lock().unwrap();
        assert!(!queries.is_empty());
        assert!(queries
            .iter()
            .all(|q| q.reference.as_deref() == Some("master-1")));
    }
}
