//! Page templates
//!
//! Pages are small enough that they are assembled directly with the
//! HTML helpers instead of a template engine.

use serde::Serialize;

use crate::comments::CommentWidget;
use crate::content::{estimate_reading_time, rich_text, Page, Post, PostLink, PostSummary};
use crate::helpers::{
    html_escape, image_tag, link_to, load_more_url, meta_generator, post_path, time_tag, Helpers,
};
use crate::pagination::PaginationState;

/// Listing entry with derived display fields, as sent to the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryView {
    pub id: String,
    pub url: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Display date, or a placeholder when unknown
    pub first_publication_date: String,
}

/// A page of listing entries for the "load more" endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub results: Vec<SummaryView>,
    pub next_cursor: Option<String>,
    /// Endpoint URL for the page after this one
    pub next_url: Option<String>,
    /// Pre-rendered listing entries, appended as-is by the page script
    pub html: String,
}

/// Renders site pages
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    helpers: Helpers,
}

const LOAD_MORE_SCRIPT: &str = r#"<script>
(function() {
    var button = document.getElementById('load-more');
    var list = document.getElementById('posts');
    var error = document.getElementById('load-more-error');
    if (!button) return;
    button.addEventListener('click', function() {
        button.disabled = true;
        error.hidden = true;
        fetch(button.dataset.url)
            .then(function(res) {
                if (!res.ok) throw new Error(res.status);
                return res.json();
            })
            .then(function(page) {
                list.insertAdjacentHTML('beforeend', page.html);
                if (page.next_url) {
                    button.dataset.url = page.next_url;
                    button.disabled = false;
                } else {
                    button.remove();
                }
            })
            .catch(function() {
                error.hidden = false;
                button.disabled = false;
            });
    });
})();
</script>"#;

impl TemplateRenderer {
    pub fn new(helpers: Helpers) -> Self {
        Self { helpers }
    }

    pub fn helpers(&self) -> &Helpers {
        &self.helpers
    }

    /// Listing entry view of a summary
    pub fn summary_view(&self, summary: &PostSummary) -> SummaryView {
        SummaryView {
            id: summary.id.clone(),
            url: self.helpers.post_url(&summary.id),
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            first_publication_date: self
                .helpers
                .date(summary.first_publication_date.as_deref()),
        }
    }

    /// Response body of the "load more" endpoint
    pub fn page_view(&self, page: &Page) -> PageView {
        PageView {
            results: page.results.iter().map(|p| self.summary_view(p)).collect(),
            next_cursor: page.next_cursor.clone(),
            next_url: page
                .next_cursor
                .as_deref()
                .map(|c| load_more_url(self.helpers.config(), c)),
            html: self.render_entries(&page.results),
        }
    }

    /// HTML for a run of listing entries
    pub fn render_entries(&self, posts: &[PostSummary]) -> String {
        posts.iter().map(|p| self.render_entry(p)).collect()
    }

    fn render_entry(&self, summary: &PostSummary) -> String {
        format!(
            concat!(
                r#"<article class="postContainer">"#,
                r#"<a href="{url}"><h1>{title}</h1></a>"#,
                "<p>{subtitle}</p>",
                r#"<div class="postInfo"><span class="calendar">{date}</span>"#,
                r#"<span class="user">{author}</span></div>"#,
                "</article>"
            ),
            url = html_escape(&self.helpers.post_url(&summary.id)),
            title = html_escape(&summary.title),
            subtitle = html_escape(&summary.subtitle),
            date = time_tag(
                self.helpers.dates(),
                summary.first_publication_date.as_deref()
            ),
            author = html_escape(&summary.author),
        )
    }

    /// The listing page
    pub fn render_index(&self, state: &PaginationState, preview: bool) -> String {
        let mut body = format!(
            r#"<section class="container"><div id="posts">{}</div>"#,
            self.render_entries(&state.loaded_posts)
        );

        if let Some(cursor) = &state.next_cursor {
            body.push_str(&format!(
                r#"<button type="button" id="load-more" class="nextPost" data-url="{}">Carregar mais posts</button>"#,
                html_escape(&load_more_url(self.helpers.config(), cursor))
            ));
            body.push_str(
                r#"<p id="load-more-error" class="error" hidden>Não foi possível carregar mais posts. Tente novamente.</p>"#,
            );
        }
        body.push_str(&self.preview_banner(preview));
        body.push_str("</section>");
        if state.has_more() {
            body.push_str(LOAD_MORE_SCRIPT);
        }

        self.layout(&self.helpers.config().title, &body)
    }

    /// An article page
    pub fn render_post(
        &self,
        post: &Post,
        prev: Option<&PostLink>,
        next: Option<&PostLink>,
        comments: &mut dyn CommentWidget,
        preview: bool,
    ) -> String {
        let dates = self.helpers.dates();
        let mut body = image_tag(&post.banner_url, "banner", Some("postBanner"));

        body.push_str(&format!(
            concat!(
                r#"<section class="container post"><h1>{title}</h1>"#,
                r#"<div class="postInfo">"#,
                r#"<span class="calendar">{date}</span>"#,
                r#"<span class="user">{author}</span>"#,
                r#"<span class="clock">{minutes} min</span>"#,
                "</div>"
            ),
            title = html_escape(&post.title),
            date = time_tag(dates, post.first_publication_date.as_deref()),
            author = html_escape(&post.author),
            minutes = estimate_reading_time(&post.content),
        ));

        if let Some(note) = dates.edited_note(
            post.first_publication_date.as_deref(),
            post.last_publication_date.as_deref(),
        ) {
            body.push_str(&format!(r#"<span class="edited">{}</span>"#, html_escape(&note)));
        }

        for section in &post.content {
            body.push_str(&format!(
                r#"<div class="section"><h2>{}</h2><div class="postSection">{}</div></div>"#,
                html_escape(&section.heading),
                rich_text::render_html(&section.body)
            ));
        }

        body.push_str(&self.render_navigation(prev, next));
        body.push_str(&comments.mount(&self.helpers.post_url(&post.id)));
        body.push_str(&self.preview_banner(preview));
        body.push_str("</section>");

        let title = format!("{} | {}", post.title, self.helpers.config().title);
        self.layout(&title, &body)
    }

    fn render_navigation(&self, prev: Option<&PostLink>, next: Option<&PostLink>) -> String {
        let link = |post: Option<&PostLink>, label: &str| {
            post.map(|p| {
                format!(
                    "<h3>{}</h3>{}",
                    html_escape(&p.title),
                    self.helpers.link_to(&post_path(&p.id), label)
                )
            })
            .unwrap_or_default()
        };
        format!(
            r#"<nav class="navigation"><div>{}</div><div>{}</div></nav>"#,
            link(prev, "Post anterior"),
            link(next, "Próximo post")
        )
    }

    fn preview_banner(&self, preview: bool) -> String {
        if !preview {
            return String::new();
        }
        format!(
            r#"<aside>{}</aside>"#,
            link_to(
                self.helpers.config(),
                "api/exit-preview",
                "Sair do modo Preview",
                Some("preview")
            )
        )
    }

    /// Wrap page content in the site layout
    pub fn layout(&self, title: &str, body: &str) -> String {
        let config = self.helpers.config();
        format!(
            concat!(
                "<!DOCTYPE html>\n",
                r#"<html lang="{lang}"><head><meta charset="utf-8">"#,
                r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
                "{generator}<title>{title}</title>{css}</head>",
                r#"<body><header class="header">{home}</header>{body}</body></html>"#,
                "\n"
            ),
            lang = html_escape(&config.language),
            generator = meta_generator(),
            title = html_escape(title),
            css = self.helpers.css("style"),
            home = self.helpers.link_to("/", &config.title),
            body = body,
        )
    }
}
