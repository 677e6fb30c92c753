//! URL helper functions

use crate::cms::encode_value;
use crate::config::SiteConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/css/style.css") // -> "/blog/css/style.css"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Site path of an article page, relative to the root
pub fn post_path(uid: &str) -> String {
    format!("post/{}/", encode_value(uid))
}

/// Output file of an article page, relative to the public directory
///
/// The uid is used as is, since the server decodes request paths before
/// looking them up. `None` when the uid cannot name a single directory.
pub fn post_output_path(uid: &str) -> Option<String> {
    if uid.is_empty() || uid == "." || uid == ".." || uid.contains(&['/', '\\'][..]) {
        return None;
    }
    Some(format!("post/{}/index.html", uid))
}

/// URL of the "load more" endpoint for a cursor
pub fn load_more_url(config: &SiteConfig, cursor: &str) -> String {
    format!(
        "{}?cursor={}",
        url_for(config, "api/posts"),
        encode_value(cursor)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        SiteConfig {
            url: "https://example.com".to_string(),
            root: "/blog/".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/css/style.css"), "/blog/css/style.css");
        assert_eq!(url_for(&config, "about/"), "/blog/about/");
        assert_eq!(url_for(&config, ""), "/blog/");
    }

    #[test]
    fn test_post_output_path() {
        assert_eq!(
            post_output_path("como-utilizar-hooks").as_deref(),
            Some("post/como-utilizar-hooks/index.html")
        );
        assert_eq!(post_output_path("a b").as_deref(), Some("post/a b/index.html"));
        assert_eq!(post_output_path(".."), None);
        assert_eq!(post_output_path("a/b"), None);
        assert_eq!(post_output_path(""), None);
    }

    #[test]
    fn test_post_path_encoded() {
        assert_eq!(post_path("como-utilizar-hooks"), "post/como-utilizar-hooks/");
        assert_eq!(post_path("a b"), "post/a%20b/");
    }

    #[test]
    fn test_load_more_url() {
        let config = test_config();
        assert_eq!(
            load_more_url(&config, "https://x.io/search?page=2&ref=a"),
            "/blog/api/posts?cursor=https%3A%2F%2Fx.io%2Fsearch%3Fpage%3D2%26ref%3Da"
        );
    }
}
