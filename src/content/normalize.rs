//! Mapping of raw CMS documents into canonical post records
//!
//! Only the fields the blog declares survive normalization; everything
//! else the backend sends (slugs, tags, alternate languages...) is dropped.

use serde_json::Value;

use super::post::{ContentSection, Post, PostSummary, RichTextBlock};
use crate::cms::RawDocument;
use crate::error::{Error, Result};

/// Normalize a document into its listing view
pub fn normalize_summary(raw: &RawDocument) -> Result<PostSummary> {
    let id = identity(raw)?;
    Ok(PostSummary {
        id,
        first_publication_date: raw.first_publication_date.clone(),
        title: text_field(raw.data.get("title")),
        subtitle: text_field(raw.data.get("subtitle")),
        author: text_field(raw.data.get("author")),
    })
}

/// Normalize a document into a full article
pub fn normalize_post(raw: &RawDocument) -> Result<Post> {
    let summary = normalize_summary(raw)?;

    let banner_url = raw
        .data
        .get("banner")
        .and_then(|b| b.get("url"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let content = raw
        .data
        .get("content")
        .and_then(Value::as_array)
        .map(|sections| sections.iter().map(section).collect())
        .unwrap_or_default();

    Ok(Post {
        id: summary.id,
        first_publication_date: summary.first_publication_date,
        last_publication_date: raw.last_publication_date.clone(),
        title: summary.title,
        subtitle: summary.subtitle,
        author: summary.author,
        banner_url,
        content,
    })
}

/// The article key; documents without `id` or `uid` are rejected
fn identity(raw: &RawDocument) -> Result<String> {
    fn present(field: &Option<String>) -> bool {
        field.as_deref().is_some_and(|v| !v.trim().is_empty())
    }

    if !present(&raw.id) {
        return Err(Error::MalformedDocument { field: "id" });
    }
    match &raw.uid {
        Some(uid) if present(&raw.uid) => Ok(uid.clone()),
        _ => Err(Error::MalformedDocument { field: "uid" }),
    }
}

/// Read a text field that may be a plain string or a rich-text array
fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

fn section(value: &Value) -> ContentSection {
    let heading = text_field(value.get("heading"));
    let body = value
        .get("body")
        .and_then(Value::as_array)
        .map(|blocks| blocks.iter().filter_map(block).collect())
        .unwrap_or_default();
    ContentSection { heading, body }
}

fn block(value: &Value) -> Option<RichTextBlock> {
    match value {
        Value::String(text) => Some(RichTextBlock::paragraph(text.clone())),
        Value::Object(_) => match serde_json::from_value(value.clone()) {
            Ok(block) => Some(block),
            Err(e) => {
                tracing::warn!("Dropping unreadable rich text block: {}", e);
                None
            }
        },
        other => {
            tracing::warn!("Dropping unexpected rich text value: {}", other);
            None
        }
    }
}

impl From<&PostSummary> for RawDocument {
    fn from(summary: &PostSummary) -> Self {
        RawDocument {
            id: Some(summary.id.clone()),
            uid: Some(summary.id.clone()),
            doc_type: None,
            first_publication_date: summary.first_publication_date.clone(),
            last_publication_date: None,
            data: serde_json::json!({
                "title": summary.title,
                "subtitle": summary.subtitle,
                "author": summary.author,
            }),
        }
    }
}

impl From<&Post> for RawDocument {
    fn from(post: &Post) -> Self {
        let content: Vec<Value> = post
            .content
            .iter()
            .map(|s| serde_json::json!({ "heading": s.heading, "body": s.body }))
            .collect();
        RawDocument {
            id: Some(post.id.clone()),
            uid: Some(post.id.clone()),
            doc_type: None,
            first_publication_date: post.first_publication_date.clone(),
            last_publication_date: post.last_publication_date.clone(),
            data: serde_json::json!({
                "title": post.title,
                "subtitle": post.subtitle,
                "author": post.author,
                "banner": { "url": post.banner_url },
                "content": content,
            }),
        }
    }
}
