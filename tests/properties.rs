use lectern::tokenizer::{TokenizerConfig, tokenize};
use lectern::transform::{
    Style, TransformOptions, compute_render_token, highlight_count, transform_text, TextSegment,
};
use lectern::window::compute_window;
use proptest::prelude::*;

/// Tiny chunks so short inputs cross chunk boundaries and take the bulk path.
fn tiny_chunks() -> TokenizerConfig {
    TokenizerConfig {
        chunk_chars: 7,
        large_threshold: 60,
        filter_chunk: 3,
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

proptest! {
    #[test]
    fn test_tokens_join_to_collapsed_text(text in "[a-zA-Zé.,'\\- \\n\\t]{0,160}") {
        for config in [TokenizerConfig::default(), tiny_chunks()] {
            let tokens = tokenize(&text, config, |_| {});
            let joined = tokens.join(" ");
            prop_assert_eq!(joined.trim(), collapse(&text));
        }
    }

    #[test]
    fn test_tokenize_is_idempotent(text in "[a-z \\n]{0,160}") {
        let first = tokenize(&text, tiny_chunks(), |_| {});
        let second = tokenize(&first.join(" "), tiny_chunks(), |_| {});
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_progress_is_monotonic_and_ends_at_100(text in "[a-z ]{0,120}") {
        let mut seen = Vec::new();
        tokenize(&text, tiny_chunks(), |progress| seen.push(progress));
        prop_assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
        prop_assert_eq!(seen.last().copied(), Some(100));
    }

    #[test]
    fn test_highlight_monotonic_in_strength(len in 1usize..40, strength in 1u8..5) {
        let lower = highlight_count(len, strength);
        let higher = highlight_count(len, strength + 1);
        prop_assert!(lower <= higher);
        prop_assert!(higher <= len);
        prop_assert!(lower >= 1);
    }

    #[test]
    fn test_render_token_preserves_word(word in "[(\"]?[a-zA-Z]{1,15}[.,;!?\")]{0,2}", strength in 1u8..=5, center in any::<bool>()) {
        let options = TransformOptions {
            style: if center { Style::BoldCenter } else { Style::BoldStart },
            fixation_strength: strength,
            ..TransformOptions::default()
        };
        let token = compute_render_token(&word, 0, &options);
        prop_assert_eq!(token.text(), word.clone());
        let core = word.chars().filter(|c| c.is_alphabetic()).count();
        let highlighted_letters = token.highlighted.chars().filter(|c| c.is_alphabetic()).count();
        prop_assert!(highlighted_letters <= core);
        if !center {
            prop_assert_eq!(highlighted_letters, highlight_count(core, strength));
        }
    }

    #[test]
    fn test_rhythm_stride_selects_every_kth_word(words in prop::collection::vec("[a-z]{1,8}", 1..30), stride in 1u8..=3) {
        let options = TransformOptions {
            rhythm_stride: stride,
            skip_common_words: false,
            ..TransformOptions::default()
        };
        for (index, word) in words.iter().enumerate() {
            let token = compute_render_token(word, index, &options);
            prop_assert_eq!(!token.is_skipped, index % stride as usize == 0);
        }

        let text = words.join("  ");
        let emphasized: Vec<bool> = transform_text(&text, &options)
            .into_iter()
            .filter_map(|segment| match segment {
                TextSegment::Word(token) => Some(!token.is_skipped),
                TextSegment::Whitespace(_) => None,
            })
            .collect();
        let expected: Vec<bool> = (0..words.len()).map(|i| i % stride as usize == 0).collect();
        prop_assert_eq!(emphasized, expected);
    }

    #[test]
    fn test_window_bounds(
        offset in 0.0f64..1e7,
        viewport in 0.0f64..5_000.0,
        item_height in 1.0f64..500.0,
        buffer in 0usize..20,
        count in 0usize..10_000,
        max_render in 0usize..200,
    ) {
        let window = compute_window(offset, viewport, item_height, buffer, count, max_render);
        prop_assert!(window.start <= window.end);
        prop_assert!(window.end <= count);
        prop_assert!(window.end - window.start <= max_render);
    }
}

#[test]
fn test_jumping_scenario() {
    let token = compute_render_token("jumping", 0, &TransformOptions::default());
    assert_eq!(token.highlighted, "jump");
    assert_eq!(token.rest, "ing");
}
