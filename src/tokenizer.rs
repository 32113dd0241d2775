//! Whitespace tokenizer that works in bounded chunks.
//!
//! [`Tokenizer::step`] processes one chunk and returns, so a host loop can
//! interleave other work. [`tokenize`] drives it to completion and
//! [`spawn_tokenize`] does the same on a worker thread.

use std::sync::mpsc::{self, Receiver};
use std::thread;

/// Ordered words of a document. Never contains empty tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenStream {
    tokens: Vec<String>,
}

impl TokenStream {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Up to `count` tokens starting at `start`, empty past the end.
    pub fn range(&self, start: usize, count: usize) -> &[String] {
        let start = start.min(self.tokens.len());
        let end = start.saturating_add(count).min(self.tokens.len());
        &self.tokens[start..end]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.tokens.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.tokens
    }

    pub fn join(&self, separator: &str) -> String {
        self.tokens.join(separator)
    }
}

impl From<Vec<String>> for TokenStream {
    fn from(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Characters scanned per step on the windowed path
    pub chunk_chars: usize,
    /// Inputs longer than this many characters take the bulk-split path
    pub large_threshold: usize,
    /// Split fragments filtered per step on the bulk-split path
    pub filter_chunk: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            chunk_chars: 100_000,
            large_threshold: 500_000,
            filter_chunk: 50_000,
        }
    }
}

enum Mode<'a> {
    /// Byte offset of the next window
    Windowed { position: usize, consumed_chars: usize },
    Bulk { parts: Vec<&'a str>, next: usize },
}

pub struct Tokenizer<'a> {
    text: &'a str,
    config: TokenizerConfig,
    total_chars: usize,
    mode: Mode<'a>,
    tokens: Vec<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str, config: TokenizerConfig) -> Self {
        let total_chars = text.chars().count();
        let mode = if total_chars > config.large_threshold {
            Mode::Bulk {
                parts: text.split(char::is_whitespace).collect(),
                next: 0,
            }
        } else {
            Mode::Windowed {
                position: 0,
                consumed_chars: 0,
            }
        };
        Self {
            text,
            config,
            total_chars,
            mode,
            tokens: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        match &self.mode {
            Mode::Windowed { position, .. } => *position >= self.text.len(),
            Mode::Bulk { parts, next } => *next >= parts.len(),
        }
    }

    /// Process one chunk. Returns the completion percentage measured at the
    /// start of that chunk, or `None` once everything has been consumed.
    pub fn step(&mut self) -> Option<u8> {
        if self.is_done() {
            return None;
        }
        match &mut self.mode {
            Mode::Windowed {
                position,
                consumed_chars,
            } => {
                let progress = percent(*consumed_chars, self.total_chars);
                let end = window_end(self.text, *position, self.config.chunk_chars.max(1));
                let chunk = &self.text[*position..end];
                self.tokens.extend(chunk.split_whitespace().map(str::to_string));
                *consumed_chars += chunk.chars().count();
                *position = end;
                Some(progress)
            }
            Mode::Bulk { parts, next } => {
                let progress = percent(*next, parts.len());
                let end = next.saturating_add(self.config.filter_chunk.max(1)).min(parts.len());
                self.tokens.extend(
                    parts[*next..end]
                        .iter()
                        .filter(|part| !part.is_empty())
                        .map(|part| part.to_string()),
                );
                *next = end;
                Some(progress)
            }
        }
    }

    pub fn finish(self) -> TokenStream {
        TokenStream {
            tokens: self.tokens,
        }
    }
}

/// Byte offset `chunk_chars` characters past `start`, pushed forward to the
/// next whitespace so no word straddles two windows.
fn window_end(text: &str, start: usize, chunk_chars: usize) -> usize {
    let rest = &text[start..];
    let Some((offset, _)) = rest.char_indices().nth(chunk_chars) else {
        return text.len();
    };
    let end = start + offset;
    text[end..]
        .find(char::is_whitespace)
        .map_or(text.len(), |ws| end + ws)
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

/// Tokenize `text` completely, reporting progress in `0..=100` after every
/// chunk and a final `100`.
pub fn tokenize(
    text: &str,
    config: TokenizerConfig,
    mut on_progress: impl FnMut(u8),
) -> TokenStream {
    let mut tokenizer = Tokenizer::new(text, config);
    while let Some(progress) = tokenizer.step() {
        on_progress(progress);
    }
    on_progress(100);
    tokenizer.finish()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeEvent {
    Progress(u8),
    Done(TokenStream),
}

/// Tokenize on a worker thread. The receiver yields `Progress` events and a
/// single final `Done`.
pub fn spawn_tokenize(text: String, config: TokenizerConfig) -> Receiver<TokenizeEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stream = tokenize(&text, config, |progress| {
            let _ = tx.send(TokenizeEvent::Progress(progress));
        });
        let _ = tx.send(TokenizeEvent::Done(stream));
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_chunks() -> TokenizerConfig {
        TokenizerConfig {
            chunk_chars: 4,
            large_threshold: 1_000,
            filter_chunk: 2,
        }
    }

    #[test]
    fn test_tokenize_splits_on_whitespace_runs() {
        let stream = tokenize("  Hello,\tworld!\n\n• next  ", TokenizerConfig::default(), |_| {});
        assert_eq!(stream.as_slice(), ["Hello,", "world!", "•", "next"]);
    }

    #[test]
    fn test_tokenize_empty_input() {
        let mut reports = Vec::new();
        let stream = tokenize("   \n ", TokenizerConfig::default(), |p| reports.push(p));
        assert!(stream.is_empty());
        assert_eq!(reports.last(), Some(&100));
    }

    #[test]
    fn test_windows_never_split_words() {
        let text = "extraordinary words straddle every tiny window";
        let stream = tokenize(text, small_chunks(), |_| {});
        let expected: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(stream.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_windows_respect_multibyte_characters() {
        let text = "héllo wörld ünïcödé ☃☃☃ 終わり";
        let stream = tokenize(text, small_chunks(), |_| {});
        assert_eq!(stream.as_slice(), ["héllo", "wörld", "ünïcödé", "☃☃☃", "終わり"]);
    }

    #[test]
    fn test_bulk_path_matches_windowed_path() {
        let text = "one  two\tthree\n\nfour ".repeat(20);
        let windowed = tokenize(&text, small_chunks(), |_| {});
        let bulk = tokenize(
            &text,
            TokenizerConfig {
                large_threshold: 10,
                ..small_chunks()
            },
            |_| {},
        );
        assert_eq!(windowed, bulk);
        assert_eq!(bulk.len(), 80);
    }

    #[test]
    fn test_progress_is_monotonic_and_ends_at_100() {
        let text = "word ".repeat(50);
        let mut reports = Vec::new();
        tokenize(&text, small_chunks(), |p| reports.push(p));
        assert_eq!(reports.first(), Some(&0));
        assert_eq!(reports.last(), Some(&100));
        assert!(reports.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_step_is_resumable() {
        let mut tokenizer = Tokenizer::new("a b c d e f g h", small_chunks());
        let mut steps = 0;
        while tokenizer.step().is_some() {
            steps += 1;
        }
        assert!(steps > 1);
        assert!(tokenizer.is_done());
        assert_eq!(tokenizer.step(), None);
        assert_eq!(tokenizer.finish().len(), 8);
    }

    #[test]
    fn test_spawn_tokenize_reports_done() {
        let rx = spawn_tokenize("alpha beta gamma".to_string(), TokenizerConfig::default());
        let events: Vec<TokenizeEvent> = rx.iter().collect();
        assert!(matches!(events.first(), Some(TokenizeEvent::Progress(0))));
        match events.last() {
            Some(TokenizeEvent::Done(stream)) => assert_eq!(stream.len(), 3),
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[test]
    fn test_token_stream_range_and_get() {
        let stream = TokenStream::from(vec!["a".to_string(), String::new(), "b".into(), "c".into()]);
        assert_eq!(stream.len(), 3);
        assert_eq!(stream.get(1), Some("b"));
        assert_eq!(stream.get(3), None);
        assert_eq!(stream.range(1, 5), ["b", "c"]);
        assert!(stream.range(10, 2).is_empty());
    }
}
