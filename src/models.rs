use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared kind of a raw source handed to the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    Epub,
    Text,
}

/// Raw input. Consumed by normalization and dropped afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
    /// File name or URL the bytes came from, used for default titles
    pub name: Option<String>,
}

impl SourceDocument {
    pub fn new(kind: DocumentKind, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            bytes: bytes.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Ways a document can enter a reading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    Paste,
    TxtFile,
    MdFile,
    EpubFile,
    Url,
}

/// Coarse origin recorded on reading content and history entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    Epub,
    Url,
    Paste,
}

impl From<SourceKind> for ContentSource {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::EpubFile => ContentSource::Epub,
            SourceKind::Url => ContentSource::Url,
            SourceKind::Paste | SourceKind::TxtFile | SourceKind::MdFile => ContentSource::Paste,
        }
    }
}

/// Plain text with paragraph breaks as blank lines and list items as
/// bulleted lines.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub title: String,
    pub content: String,
}

/// Reading position shared by the schedulers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackCursor {
    pub index: usize,
    pub playing: bool,
}

impl PlaybackCursor {
    /// Move to `index`, clamped to `[0, token_count - 1]`.
    pub fn set_index(&mut self, index: usize, token_count: usize) {
        self.index = clamp_index(index, token_count);
    }

    /// Move by a signed number of words, clamped like [`set_index`](Self::set_index).
    pub fn step(&mut self, delta: isize, token_count: usize) {
        let target = if delta.is_negative() {
            self.index.saturating_sub(delta.unsigned_abs())
        } else {
            self.index.saturating_add(delta as usize)
        };
        self.set_index(target, token_count);
    }
}

pub fn clamp_index(index: usize, token_count: usize) -> usize {
    index.min(token_count.saturating_sub(1))
}

/// Visible sub-range `[start, end)` of a paragraph list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleWindow {
    pub start: usize,
    pub end: usize,
}

impl VisibleWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// A document prepared for a reading session.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingContent {
    pub id: String,
    pub title: String,
    pub source: ContentSource,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
    /// Raw text, retained only for short documents
    pub content: Option<String>,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub source: ContentSource,
    pub word_count: usize,
    pub current_index: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&ReadingContent> for HistoryEntry {
    fn from(content: &ReadingContent) -> Self {
        Self {
            id: content.id.clone(),
            title: content.title.clone(),
            source: content.source,
            word_count: content.word_count,
            current_index: 0,
            created_at: content.created_at,
        }
    }
}

pub const MAX_HISTORY_ENTRIES: usize = 20;

/// Recently opened documents, newest first. Metadata only, never words.
///
/// Library API for hosts that keep several documents open over time. The
/// `lectern` binary reads one document per run and keeps no history; nothing
/// here is persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadingHistory {
    entries: Vec<HistoryEntry>,
}

impl ReadingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, content: &ReadingContent) {
        self.entries.retain(|entry| entry.id != content.id);
        self.entries.insert(0, HistoryEntry::from(content));
        self.entries.truncate(MAX_HISTORY_ENTRIES);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
