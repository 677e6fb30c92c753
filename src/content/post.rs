//! Post models in their canonical, backend-independent shape

use serde::{Deserialize, Serialize};

/// The listing view of an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Stable article key (the document uid, used in URLs)
    pub id: String,

    /// First publication timestamp, ISO-8601 as sent by the backend
    pub first_publication_date: Option<String>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A full article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub first_publication_date: Option<String>,

    /// Last publication timestamp; differs from the first one once edited
    pub last_publication_date: Option<String>,

    pub title: String,
    pub subtitle: String,
    pub author: String,

    /// Banner image URL, empty when the document has no banner
    pub banner_url: String,

    /// Article sections in backend order
    pub content: Vec<ContentSection>,
}

/// One headed section of an article body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    /// Section heading, empty when the backend sent none
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

/// A block of structured rich text (paragraph, heading, list item, image...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub spans: Vec<Span>,

    /// Source URL for image and embed blocks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Alternative text for image blocks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl Default for RichTextBlock {
    fn default() -> Self {
        Self {
            kind: "paragraph".to_string(),
            text: String::new(),
            spans: Vec::new(),
            url: None,
            alt: None,
        }
    }
}

impl RichTextBlock {
    /// A plain paragraph without inline formatting
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Inline formatting over a character range of a block's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start offset, in characters
    pub start: usize,
    /// End offset (exclusive), in characters
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

/// Extra span payload, e.g. the target of a hyperlink
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// A neighbouring article, for previous/next navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostLink {
    pub id: String,
    pub title: String,
}

impl From<&PostSummary> for PostLink {
    fn from(summary: &PostSummary) -> Self {
        Self {
            id: summary.id.clone(),
            title: summary.title.clone(),
        }
    }
}

/// One page of listing results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Summaries in backend order
    pub results: Vec<PostSummary>,

    /// Opaque cursor to the next page; `None` when this is the last one
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rich_text_block_defaults() {
        let block: RichTextBlock = serde_json::from_str(r#"{"text": "plain"}"#).unwrap();
        assert_eq!(block.kind, "paragraph");
        assert_eq!(block.text, "plain");
        assert!(block.spans.is_empty());
    }

    #[test]
    fn test_span_with_link() {
        let json = r#"{"start": 0, "end": 4, "type": "hyperlink",
                       "data": {"link_type": "Web", "url": "https://rust-lang.org"}}"#;
        let span: Span = serde_json::from_str(json).unwrap();
        assert_eq!(span.kind, "hyperlink");
        assert_eq!(
            span.data.and_then(|d| d.url).as_deref(),
            Some("https://rust-lang.org")
        );
    }
}
