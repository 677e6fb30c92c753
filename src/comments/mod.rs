//! Article comment threads
//!
//! Comments are provided by a third-party widget keyed by article. Pages
//! mount the widget for an article and get back the markup to embed.

use crate::config::CommentsConfig;
use crate::helpers::html_escape;

/// Anchor element id the widget script injects into
pub const ANCHOR_ID: &str = "inject-comments-for-uterances";

const UTTERANCES_SCRIPT: &str = "https://utteranc.es/client.js";

/// A discussion widget attached to one article at a time
pub trait CommentWidget: Send {
    /// Attach the widget to `article_key` and return the markup to embed
    fn mount(&mut self, article_key: &str) -> String;

    /// Detach from the current article, if any
    fn unmount(&mut self);

    /// Article the widget is currently attached to
    fn mounted(&self) -> Option<&str>;
}

/// GitHub-issue backed comments from utteranc.es
#[derive(Debug, Clone)]
pub struct Utterances {
    repo: String,
    issue_term: String,
    label: String,
    theme: String,
    mounted: Option<String>,
}

impl Utterances {
    pub fn new(config: &CommentsConfig) -> Self {
        Self {
            repo: config.repo.clone(),
            issue_term: config.issue_term.clone(),
            label: config.label.clone(),
            theme: config.theme.clone(),
            mounted: None,
        }
    }
}

impl CommentWidget for Utterances {
    fn mount(&mut self, article_key: &str) -> String {
        if let Some(previous) = self.mounted.replace(article_key.to_string()) {
            tracing::debug!("Remounting comments from {} to {}", previous, article_key);
        }

        // With issue-term "pathname" the widget keys threads by the page
        // path, which the generator makes equal to the article key.
        format!(
            concat!(
                r#"<div id="{anchor}" data-article="{key}">"#,
                r#"<script src="{src}" repo="{repo}" issue-term="{term}" label="{label}" "#,
                r#"theme="{theme}" crossorigin="anonymous" async></script>"#,
                "</div>"
            ),
            anchor = ANCHOR_ID,
            key = html_escape(article_key),
            src = UTTERANCES_SCRIPT,
            repo = html_escape(&self.repo),
            term = html_escape(&self.issue_term),
            label = html_escape(&self.label),
            theme = html_escape(&self.theme),
        )
    }

    fn unmount(&mut self) {
        self.mounted = None;
    }

    fn mounted(&self) -> Option<&str> {
        self.mounted.as_deref()
    }
}

/// Used when comments are disabled
#[derive(Debug, Clone, Default)]
pub struct NoComments {
    mounted: Option<String>,
}

impl CommentWidget for NoComments {
    fn mount(&mut self, article_key: &str) -> String {
        self.mounted = Some(article_key.to_string());
        String::new()
    }

    fn unmount(&mut self) {
        self.mounted = None;
    }

    fn mounted(&self) -> Option<&str> {
        self.mounted.as_deref()
    }
}

/// The widget the configuration asks for
pub fn from_config(config: &CommentsConfig) -> Box<dyn CommentWidget> {
    if config.enable && !config.repo.is_empty() {
        Box::new(Utterances::new(config))
    } else {
        Box::new(NoComments::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CommentsConfig {
        CommentsConfig {
            repo: "lucasd-coder/spacetraveling".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_utterances_markup() {
        let mut widget = Utterances::new(&config());
        let html = widget.mount("/post/como-utilizar-hooks/");
        assert!(html.starts_with(r#"<div id="inject-comments-for-uterances""#));
        assert!(html.contains(r#"src="https://utteranc.es/client.js""#));
        assert!(html.contains(r#"repo="lucasd-coder/spacetraveling""#));
        assert!(html.contains(r#"issue-term="pathname""#));
        assert!(html.contains(r#"theme="photon-dark""#));
        assert!(html.contains(r#"crossorigin="anonymous""#));
        assert_eq!(widget.mounted(), Some("/post/como-utilizar-hooks/"));
    }

    #[test]
    fn test_remount_and_unmount() {
        let mut widget = Utterances::new(&config());
        widget.mount("/post/a/");
        widget.mount("/post/b/");
        assert_eq!(widget.mounted(), Some("/post/b/"));
        widget.unmount();
        assert_eq!(widget.mounted(), None);
    }

    #[test]
    fn test_from_config() {
        let mut widget = from_config(&CommentsConfig::default());
        assert_eq!(widget.mount("/post/a/"), "");

        let mut disabled = config();
        disabled.enable = false;
        assert_eq!(from_config(&disabled).mount("/post/a/"), "");

        assert!(!from_config(&config()).mount("/post/a/").is_empty());
    }
}
