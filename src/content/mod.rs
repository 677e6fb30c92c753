//! Content module - canonical post records and derived fields

pub mod normalize;
mod post;
pub mod reading_time;
pub mod rich_text;

pub use normalize::{normalize_post, normalize_summary};
pub use post::{ContentSection, Page, Post, PostLink, PostSummary, RichTextBlock, Span, SpanData};
pub use reading_time::estimate as estimate_reading_time;
