//! Virtualized windowing over a paragraph list.

use crate::models::VisibleWindow;
use regex::Regex;
use std::sync::LazyLock;

static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\n+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualizationConfig {
    pub enabled: bool,
    /// Estimated height of one paragraph
    pub item_height: f64,
    /// Extra paragraphs rendered above and below the viewport
    pub buffer: usize,
    pub max_render: usize,
}

impl Default for VirtualizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            item_height: 150.0,
            buffer: 5,
            max_render: 30,
        }
    }
}

impl VirtualizationConfig {
    pub fn window(&self, scroll_offset: f64, viewport_height: f64, paragraph_count: usize) -> VisibleWindow {
        if !self.enabled {
            return VisibleWindow {
                start: 0,
                end: paragraph_count,
            };
        }
        compute_window(
            scroll_offset,
            viewport_height,
            self.item_height,
            self.buffer,
            paragraph_count,
            self.max_render,
        )
    }
}

/// Paragraphs to render for a scroll position.
///
/// The result always satisfies `start <= end <= paragraph_count` and
/// `end - start <= max_render`. Negative or non-finite offsets count as 0.
pub fn compute_window(
    scroll_offset: f64,
    viewport_height: f64,
    item_height: f64,
    buffer: usize,
    paragraph_count: usize,
    max_render: usize,
) -> VisibleWindow {
    let item_height = if item_height.is_finite() && item_height > 0.0 {
        item_height
    } else {
        1.0
    };
    let rows = |pixels: f64| {
        if pixels.is_finite() && pixels > 0.0 {
            pixels / item_height
        } else {
            0.0
        }
    };

    let first_visible = rows(scroll_offset).floor() as usize;
    let start = first_visible.saturating_sub(buffer).min(paragraph_count);
    let visible = (rows(viewport_height).ceil() as usize).saturating_add(buffer.saturating_mul(2));
    let end = start.saturating_add(visible.min(max_render)).min(paragraph_count);

    VisibleWindow { start, end }
}

/// Non-empty paragraphs separated by blank lines.
pub fn split_paragraphs(content: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(content)
        .filter(|paragraph| !paragraph.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Synthetic paragraphs of `words_per_chunk` words, for texts whose raw
/// content was not kept.
pub fn chunk_words(words: &[String], words_per_chunk: usize) -> Vec<String> {
    words
        .chunks(words_per_chunk.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Paragraphs from the raw content when present, else from word chunks.
pub fn paragraphs_for(content: Option<&str>, words: &[String], words_per_chunk: usize) -> Vec<String> {
    match content {
        Some(content) if !content.is_empty() => split_paragraphs(content),
        _ => chunk_words(words, words_per_chunk),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_formula() {
        // floor(1000/100) - 2 = 8; ceil(450/100) + 4 = 9
        let window = compute_window(1000.0, 450.0, 100.0, 2, 100, 30);
        assert_eq!(window, VisibleWindow { start: 8, end: 17 });
    }

    #[test]
    fn test_window_capped_by_max_render_and_count() {
        let window = compute_window(0.0, 10_000.0, 100.0, 5, 1_000, 30);
        assert_eq!(window, VisibleWindow { start: 0, end: 30 });

        let window = compute_window(0.0, 10_000.0, 100.0, 5, 12, 30);
        assert_eq!(window, VisibleWindow { start: 0, end: 12 });
    }

    #[test]
    fn test_window_past_the_end_is_empty() {
        let window = compute_window(1e7, 500.0, 100.0, 2, 10, 30);
        assert_eq!(window, VisibleWindow { start: 10, end: 10 });
        assert!(window.is_empty());
    }

    #[test]
    fn test_window_tolerates_bad_input() {
        let window = compute_window(-50.0, f64::NAN, 0.0, 3, 10, 5);
        assert!(window.start <= window.end && window.end <= 10);
        assert!(window.len() <= 5);
    }

    #[test]
    fn test_disabled_virtualization_covers_everything() {
        let config = VirtualizationConfig {
            enabled: false,
            ..VirtualizationConfig::default()
        };
        assert_eq!(config.window(5_000.0, 100.0, 400), VisibleWindow { start: 0, end: 400 });
    }

    #[test]
    fn test_split_paragraphs() {
        let paragraphs = split_paragraphs("One.\n\n\n\nTwo\nlines.\n\n  \n\nThree.");
        assert_eq!(paragraphs, vec!["One.", "Two\nlines.", "Three."]);
    }

    #[test]
    fn test_chunk_words_and_fallback() {
        let words: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|w| w.to_string()).collect();
        assert_eq!(chunk_words(&words, 2), vec!["a b", "c d", "e"]);
        assert_eq!(paragraphs_for(None, &words, 5), vec!["a b c d e"]);
        assert_eq!(paragraphs_for(Some("x\n\ny"), &words, 5), vec!["x", "y"]);
    }
}
