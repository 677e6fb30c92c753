//! HTML helper functions

use super::url::url_for;
use crate::config::SiteConfig;

/// Generate a CSS link tag
///
/// # Examples
/// ```ignore
/// css(&config, "style.css") // -> <link rel="stylesheet" href="/blog/css/style.css">
/// ```
pub fn css(config: &SiteConfig, path: &str) -> String {
    let path = if path.ends_with(".css") {
        path.to_string()
    } else {
        format!("{}.css", path)
    };
    let href = url_for(config, &format!("css/{}", path.trim_start_matches('/')));
    format!(r#"<link rel="stylesheet" href="{}">"#, href)
}

/// Generate an anchor tag
///
/// # Examples
/// ```ignore
/// link_to(&config, "/post/hello/", "Hello", None) // -> <a href="/blog/post/hello/">Hello</a>
/// ```
pub fn link_to(config: &SiteConfig, path: &str, text: &str, class: Option<&str>) -> String {
    let href = if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        url_for(config, path)
    };
    let class_attr = class
        .map(|c| format!(r#" class="{}""#, html_escape(c)))
        .unwrap_or_default();

    format!(
        r#"<a href="{}"{}>{}</a>"#,
        html_escape(&href),
        class_attr,
        html_escape(text)
    )
}

/// Generate an image tag; empty sources produce nothing
pub fn image_tag(src: &str, alt: &str, class: Option<&str>) -> String {
    if src.is_empty() {
        return String::new();
    }
    let class_attr = class
        .map(|c| format!(r#" class="{}""#, html_escape(c)))
        .unwrap_or_default();
    format!(
        r#"<img src="{}" alt="{}"{}>"#,
        html_escape(src),
        html_escape(alt),
        class_attr
    )
}

/// Generate meta generator tag
pub fn meta_generator() -> String {
    format!(
        r#"<meta name="generator" content="spacetraveling {}">"#,
        env!("CARGO_PKG_VERSION")
    )
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
