//! Transform Engine: per-word emphasis spans plus per-character reading aids.
//!
//! Everything here is pure. The same word at the same index with the same
//! options always yields the same [`RenderToken`], whether it comes from the
//! batch [`transform_text`] or a real-time caller.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;
use textwrap::{Options, WrapAlgorithm};

static COMMON_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "as", "is", "was", "are", "were", "been", "be", "have", "has", "had", "do",
        "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
        "can", "need", "it", "its", "this", "that", "these", "those", "i", "you", "he", "she",
        "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "our", "their",
    ]
    .into_iter()
    .collect()
});

static HOMOPHONES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("there", "location"),
        ("their", "possession"),
        ("they're", "they are"),
        ("your", "possession"),
        ("you're", "you are"),
        ("its", "possession"),
        ("it's", "it is"),
        ("to", "direction"),
        ("too", "also/excessive"),
        ("two", "number 2"),
        ("then", "time/sequence"),
        ("than", "comparison"),
        ("affect", "verb: influence"),
        ("effect", "noun: result"),
        ("accept", "receive"),
        ("except", "exclude"),
        ("weather", "climate"),
        ("whether", "if"),
        ("principal", "main/school head"),
        ("principle", "rule/belief"),
        ("stationary", "not moving"),
        ("stationery", "paper/pens"),
        ("complement", "complete"),
        ("compliment", "praise"),
        ("pair", "two items"),
        ("pear", "fruit"),
        ("pare", "trim/peel"),
        ("break", "shatter"),
        ("brake", "stop"),
        ("bare", "naked/empty"),
        ("bear", "animal/carry"),
        ("hear", "listen"),
        ("here", "location"),
        ("know", "understand"),
        ("no", "negative"),
        ("new", "recent"),
        ("knew", "past of know"),
        ("write", "compose"),
        ("right", "correct/direction"),
        ("by", "near"),
        ("buy", "purchase"),
        ("bye", "farewell"),
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    #[default]
    BoldStart,
    BoldCenter,
    ColorStart,
    ColorCenter,
    Opacity,
}

/// How the caller should render the highlighted span; the rest span is only
/// styled for [`Emphasis::Faded`], at the configured opacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Bold,
    Accent,
    Faded,
}

impl Style {
    pub fn is_center(self) -> bool {
        matches!(self, Style::BoldCenter | Style::ColorCenter)
    }

    pub fn emphasis(self) -> Emphasis {
        match self {
            Style::BoldStart | Style::BoldCenter => Emphasis::Bold,
            Style::ColorStart | Style::ColorCenter => Emphasis::Accent,
            Style::Opacity => Emphasis::Faded,
        }
    }
}

pub const FIXATION_RANGE: (u8, u8) = (1, 5);
pub const RHYTHM_RANGE: (u8, u8) = (1, 3);
pub const OPACITY_RANGE: (f32, f32) = (0.3, 0.7);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOptions {
    pub style: Style,
    pub fixation_strength: u8,
    /// Emphasize every n-th word only
    pub rhythm_stride: u8,
    pub skip_common_words: bool,
    pub opacity: f32,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            style: Style::BoldStart,
            fixation_strength: 3,
            rhythm_stride: 1,
            skip_common_words: false,
            opacity: 0.5,
        }
    }
}

impl TransformOptions {
    pub fn clamped(self) -> Self {
        let opacity = if self.opacity.is_nan() {
            Self::default().opacity
        } else {
            self.opacity.clamp(OPACITY_RANGE.0, OPACITY_RANGE.1)
        };
        Self {
            fixation_strength: self.fixation_strength.clamp(FIXATION_RANGE.0, FIXATION_RANGE.1),
            rhythm_stride: self.rhythm_stride.clamp(RHYTHM_RANGE.0, RHYTHM_RANGE.1),
            opacity,
            ..self
        }
    }
}

/// Render instructions for one word. `before + highlighted + rest` is always
/// the original word.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderToken {
    /// Leading part outside a center highlight, empty for start styles
    pub before: String,
    pub highlighted: String,
    pub rest: String,
    pub has_center_marker: bool,
    pub is_skipped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanRole {
    Before,
    Highlight,
    Rest,
}

impl RenderToken {
    fn skipped(word: &str) -> Self {
        Self {
            rest: word.to_string(),
            is_skipped: true,
            ..Self::default()
        }
    }

    /// Non-empty parts in reading order.
    pub fn spans(&self) -> Vec<(&str, SpanRole)> {
        [
            (self.before.as_str(), SpanRole::Before),
            (self.highlighted.as_str(), SpanRole::Highlight),
            (self.rest.as_str(), SpanRole::Rest),
        ]
        .into_iter()
        .filter(|(text, _)| !text.is_empty())
        .collect()
    }

    pub fn text(&self) -> String {
        format!("{}{}{}", self.before, self.highlighted, self.rest)
    }
}

/// Letters to emphasize in a core of `len` letters.
///
/// Short cores use `min(strength, ceil(len/2))`, longer ones a proportional
/// rule capped at 60%. Growth jumps between lengths 3 and 4.
pub fn highlight_count(len: usize, fixation_strength: u8) -> usize {
    if len <= 1 {
        return 1;
    }
    let strength = fixation_strength as usize;
    if len <= 3 {
        return strength.min(len.div_ceil(2));
    }
    let len_f = len as f64;
    let base = (len_f * (fixation_strength as f64 / 10.0 + 0.2)).ceil() as usize;
    base.min((len_f * 0.6).ceil() as usize)
}

/// `[start, end)` of a center highlight within a core of `len` letters.
pub fn center_range(len: usize, fixation_strength: u8) -> (usize, usize) {
    if len <= 2 {
        return (0, len);
    }
    let count = highlight_count(len, fixation_strength);
    let start = (len / 2).saturating_sub(count / 2);
    (start, len.min(start + count))
}

fn letters_only(word: &str) -> String {
    word.chars().filter(|c| c.is_alphabetic()).collect()
}

pub fn is_common_word(word: &str) -> bool {
    COMMON_WORDS.contains(letters_only(word).to_lowercase().as_str())
}

pub fn compute_render_token(word: &str, index: usize, options: &TransformOptions) -> RenderToken {
    let options = options.clamped();
    let clean = letters_only(word);
    let common = options.skip_common_words && COMMON_WORDS.contains(clean.to_lowercase().as_str());
    let rhythm_skip = options.rhythm_stride > 1 && index % options.rhythm_stride as usize != 0;
    if common || rhythm_skip || clean.is_empty() {
        return RenderToken::skipped(word);
    }

    // Byte bounds of the letter core: first letter through last letter.
    let Some(core_start) = word.find(char::is_alphabetic) else {
        return RenderToken::skipped(word);
    };
    let core_end = word
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphabetic())
        .map_or(word.len(), |(idx, c)| idx + c.len_utf8());
    let (prefix, core, suffix) = (
        &word[..core_start],
        &word[core_start..core_end],
        &word[core_end..],
    );
    let core_len = core.chars().count();

    if options.style.is_center() {
        let (start, end) = center_range(core_len, options.fixation_strength);
        let start_byte = char_offset(core, start);
        let end_byte = char_offset(core, end);
        RenderToken {
            before: format!("{prefix}{}", &core[..start_byte]),
            highlighted: core[start_byte..end_byte].to_string(),
            rest: format!("{}{suffix}", &core[end_byte..]),
            has_center_marker: true,
            is_skipped: false,
        }
    } else {
        let count = highlight_count(core_len, options.fixation_strength);
        let split = char_offset(core, count);
        RenderToken {
            before: String::new(),
            highlighted: format!("{prefix}{}", &core[..split]),
            rest: format!("{}{suffix}", &core[split..]),
            has_center_marker: false,
            is_skipped: false,
        }
    }
}

/// Byte offset of the `n`-th char, or the end of `s`.
fn char_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(idx, _)| idx)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSegment {
    Whitespace(String),
    Word(RenderToken),
}

/// Transform running text, keeping its whitespace. Word indices count only
/// the words, so rhythm skipping matches [`compute_render_token`] callers
/// that work from a token stream.
pub fn transform_text(text: &str, options: &TransformOptions) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut index = 0;
    let mut rest = text;

    while !rest.is_empty() {
        let starts_with_space = rest.starts_with(char::is_whitespace);
        let boundary = rest
            .find(|c: char| c.is_whitespace() != starts_with_space)
            .unwrap_or(rest.len());
        let (segment, tail) = rest.split_at(boundary);
        if starts_with_space {
            segments.push(TextSegment::Whitespace(segment.to_string()));
        } else {
            segments.push(TextSegment::Word(compute_render_token(segment, index, options)));
            index += 1;
        }
        rest = tail;
    }
    segments
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid colour {value:?}, expected #RRGGBB"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterColors {
    pub b: Color,
    pub d: Color,
    pub p: Color,
    pub q: Color,
}

impl LetterColors {
    pub fn for_char(&self, c: char) -> Option<Color> {
        match c.to_ascii_lowercase() {
            'b' => Some(self.b),
            'd' => Some(self.d),
            'p' => Some(self.p),
            'q' => Some(self.q),
            _ => None,
        }
    }
}

/// Per-character aids; `None` disables an aid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharacterAids {
    /// Alternating colours for consecutive syllables
    pub syllable_colors: Option<[Color; 2]>,
    /// Mirror-letter disambiguation
    pub letter_colors: Option<LetterColors>,
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

fn is_consonant(c: char) -> bool {
    c.is_ascii_alphabetic() && !is_vowel(c)
}

/// Rough syllables: split before a consonant sitting between two vowels.
/// Words of three letters or fewer stay whole.
pub fn syllables(word: &str) -> Vec<&str> {
    if word.chars().filter(char::is_ascii_alphabetic).count() <= 3 {
        return vec![word];
    }
    let chars: Vec<(usize, char)> = word.char_indices().collect();
    let mut parts = Vec::new();
    let mut start = 0;
    for i in 1..chars.len().saturating_sub(1) {
        let (at, current) = chars[i];
        if is_vowel(chars[i - 1].1) && is_consonant(current) && is_vowel(chars[i + 1].1) && at > start
        {
            parts.push(&word[start..at]);
            start = at;
        }
    }
    parts.push(&word[start..]);
    parts
}

/// Every character of `text` paired with its aid colour. Letter colours win
/// over syllable colours; whitespace is never coloured.
pub fn styled_chars(text: &str, aids: &CharacterAids) -> Vec<(char, Option<Color>)> {
    let mut styled = Vec::with_capacity(text.len());
    for piece in text.split_inclusive(char::is_whitespace) {
        let word = piece.trim_end_matches(char::is_whitespace);
        let parts = match aids.syllable_colors {
            Some(_) => syllables(word),
            None => vec![word],
        };
        let alternate = parts.len() > 1;
        for (i, part) in parts.into_iter().enumerate() {
            let base = aids.syllable_colors.filter(|_| alternate).map(|colors| colors[i % 2]);
            for c in part.chars() {
                let letter = aids.letter_colors.and_then(|colors| colors.for_char(c));
                styled.push((c, letter.or(base)));
            }
        }
        styled.extend(piece[word.len()..].chars().map(|c| (c, None)));
    }
    styled
}

/// Meaning hint for commonly confused words.
pub fn homophone_hint(word: &str) -> Option<&'static str> {
    let clean: String = word
        .chars()
        .map(|c| if c == '\u{2019}' { '\'' } else { c.to_ascii_lowercase() })
        .filter(|c| c.is_ascii_lowercase() || *c == '\'')
        .collect();
    HOMOPHONES.get(clean.as_str()).copied()
}

/// Greedy line split for gradient rendering; words are never broken.
pub fn beeline_lines(text: &str, chars_per_line: usize) -> Vec<String> {
    let options = Options::new(chars_per_line.max(1))
        .break_words(false)
        .wrap_algorithm(WrapAlgorithm::FirstFit);
    textwrap::wrap(text, options)
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// `(start, end)` gradient colours for a line; they swap on odd lines so
/// the eye carries the colour across the line break.
pub fn beeline_gradient(line_index: usize, colors: [Color; 2]) -> (Color, Color) {
    if line_index % 2 == 0 {
        (colors[0], colors[1])
    } else {
        (colors[1], colors[0])
    }
}
