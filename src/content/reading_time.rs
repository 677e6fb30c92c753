//! Reading time estimate for an article

use lazy_static::lazy_static;
use regex::Regex;

use super::post::ContentSection;

/// Average reading speed used for estimates
pub const WORDS_PER_MINUTE: usize = 200;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Count whitespace-separated words; runs of whitespace count once
pub fn count_words(text: &str) -> usize {
    WHITESPACE.split(text).filter(|t| !t.is_empty()).count()
}

/// Total words over every heading and body block
pub fn total_words(content: &[ContentSection]) -> usize {
    content
        .iter()
        .map(|section| {
            count_words(&section.heading)
                + section
                    .body
                    .iter()
                    .map(|block| count_words(&block.text))
                    .sum::<usize>()
        })
        .sum()
}

/// Estimated minutes to read `content`, rounded up
///
/// Empty content reads in zero minutes.
pub fn estimate(content: &[ContentSection]) -> u32 {
    total_words(content).div_ceil(WORDS_PER_MINUTE) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RichTextBlock;

    fn section_with_words(heading: &str, words: usize) -> ContentSection {
        ContentSection {
            heading: heading.to_string(),
            body: vec![RichTextBlock::paragraph(vec!["palavra"; words].join(" "))],
        }
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("one two three"), 3);
        assert_eq!(count_words("  one   two\t\nthree  "), 3);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(estimate(&[]), 0);
        let blank = ContentSection {
            heading: String::new(),
            body: vec![RichTextBlock::paragraph("   ")],
        };
        assert_eq!(estimate(&[blank]), 0);
    }

    #[test]
    fn test_ceiling() {
        assert_eq!(estimate(&[section_with_words("", 200)]), 1);
        assert_eq!(estimate(&[section_with_words("", 201)]), 2);
        assert_eq!(estimate(&[section_with_words("", 1)]), 1);
    }

    #[test]
    fn test_headings_counted() {
        // 199 body words + a two-word heading
        let content = vec![section_with_words("Two words", 199)];
        assert_eq!(total_words(&content), 201);
        assert_eq!(estimate(&content), 2);
    }

    #[test]
    fn test_sums_across_sections() {
        let content = vec![section_with_words("a", 99), section_with_words("b", 100)];
        assert_eq!(total_words(&content), 201);
    }
}
