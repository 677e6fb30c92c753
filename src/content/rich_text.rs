//! Rich text to HTML rendering

use super::post::{RichTextBlock, Span};
use crate::helpers::html_escape;

/// Render body blocks to HTML
///
/// Consecutive `list-item` / `o-list-item` blocks are grouped into a
/// single `<ul>` / `<ol>`.
pub fn render_html(blocks: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list_tag = match block.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        html.push_str(&render_block(block));
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

fn render_block(block: &RichTextBlock) -> String {
    let inner = render_spans(&block.text, &block.spans);
    match block.kind.as_str() {
        "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
            let level = &block.kind["heading".len()..];
            format!("<h{0}>{1}</h{0}>", level, inner)
        }
        "preformatted" => format!("<pre>{}</pre>", inner),
        "list-item" | "o-list-item" => format!("<li>{}</li>", inner),
        "image" => {
            let src = block.url.as_deref().unwrap_or_default();
            let alt = block.alt.as_deref().unwrap_or_default();
            format!(
                r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
                html_escape(src),
                html_escape(alt)
            )
        }
        _ => format!("<p>{}</p>", inner),
    }
}

/// Apply inline spans over `text`
///
/// Offsets are in characters. Overlapping spans are split at every
/// boundary so the output is always well nested.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut bounds: Vec<usize> = vec![0, len];
    for span in spans {
        bounds.push(span.start.min(len));
        bounds.push(span.end.min(len));
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut html = String::new();
    for window in bounds.windows(2) {
        let (start, end) = (window[0], window[1]);
        let segment: String = chars[start..end].iter().collect();
        let mut segment = html_escape(&segment).replace('\n', "<br />");

        for span in spans.iter().filter(|s| s.start <= start && s.end >= end) {
            segment = wrap(span, segment);
        }
        html.push_str(&segment);
    }

    html
}

fn wrap(span: &Span, inner: String) -> String {
    match span.kind.as_str() {
        "strong" => format!("<strong>{}</strong>", inner),
        "em" => format!("<em>{}</em>", inner),
        "hyperlink" => {
            let data = span.data.as_ref();
            let url = data.and_then(|d| d.url.as_deref()).unwrap_or_default();
            let target = data
                .and_then(|d| d.target.as_deref())
                .map(|t| format!(r#" target="{}" rel="noopener""#, html_escape(t)))
                .unwrap_or_default();
            format!(r#"<a href="{}"{}>{}</a>"#, html_escape(url), target, inner)
        }
        "label" => format!("<span>{}</span>", inner),
        _ => inner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::SpanData;

    fn span(start: usize, end: usize, kind: &str) -> Span {
        Span {
            start,
            end,
            kind: kind.to_string(),
            data: None,
        }
    }

    #[test]
    fn test_paragraph_escaped() {
        let html = render_html(&[RichTextBlock::paragraph("a < b & c")]);
        assert_eq!(html, "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_spans() {
        let mut block = RichTextBlock::paragraph("Hello brave world");
        block.spans = vec![span(0, 5, "strong"), span(6, 11, "em")];
        assert_eq!(
            render_html(&[block]),
            "<p><strong>Hello</strong> <em>brave</em> world</p>"
        );
    }

    #[test]
    fn test_overlapping_spans() {
        let mut block = RichTextBlock::paragraph("abc");
        block.spans = vec![span(0, 3, "strong"), span(1, 2, "em")];
        assert_eq!(
            render_html(&[block]),
            "<p><strong>a</strong><em><strong>b</strong></em><strong>c</strong></p>"
        );
    }

    #[test]
    fn test_hyperlink() {
        let mut block = RichTextBlock::paragraph("Rust é ótimo");
        block.spans = vec![Span {
            start: 7,
            end: 12,
            kind: "hyperlink".to_string(),
            data: Some(SpanData {
                url: Some("https://rust-lang.org".to_string()),
                target: None,
            }),
        }];
        assert_eq!(
            render_html(&[block]),
            r#"<p>Rust é <a href="https://rust-lang.org">ótimo</a></p>"#
        );
    }

    #[test]
    fn test_lists_grouped() {
        let item = |kind: &str, text: &str| RichTextBlock {
            kind: kind.to_string(),
            ..RichTextBlock::paragraph(text)
        };
        let html = render_html(&[
            item("list-item", "one"),
            item("list-item", "two"),
            item("o-list-item", "first"),
            item("paragraph", "after"),
        ]);
        assert_eq!(
            html,
            "<ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><p>after</p>"
        );
    }

    #[test]
    fn test_heading_and_preformatted() {
        let heading = RichTextBlock {
            kind: "heading3".to_string(),
            ..RichTextBlock::paragraph("Title")
        };
        let pre = RichTextBlock {
            kind: "preformatted".to_string(),
            ..RichTextBlock::paragraph("line1\nline2")
        };
        assert_eq!(
            render_html(&[heading, pre]),
            "<h3>Title</h3><pre>line1<br />line2</pre>"
        );
    }
}
