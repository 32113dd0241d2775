//! Ingestion entry points: raw source in, titled document or reading
//! content out.

use crate::ebook::normalize_epub;
use crate::errors::{IngestError, Result};
use crate::fetch::{DEFAULT_TIMEOUT, fetch_url};
use crate::models::{
    ContentSource, DocumentKind, NormalizedDocument, ReadingContent, SourceDocument, SourceKind,
};
use crate::parser::normalize_html;
use crate::tokenizer::TokenStream;
use chrono::Utc;
use sha1::{Digest, Sha1};
use std::path::Path;
use std::time::Duration;

pub const PASTED_TITLE: &str = "Pasted Text";

/// Raw content is kept on [`ReadingContent`] only below this many chars.
pub const CONTENT_RETENTION_LIMIT: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ingestor {
    pub timeout: Duration,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Ingestor {
    /// Normalize `payload` as `kind`.
    ///
    /// `payload` is the text for pastes, the file bytes for files and the
    /// address for URLs. `name` is the file name used for default titles.
    pub fn ingest(
        &self,
        kind: SourceKind,
        payload: &[u8],
        name: Option<&str>,
    ) -> Result<NormalizedDocument> {
        let document = match kind {
            SourceKind::Paste => text_document(PASTED_TITLE.to_string(), payload),
            SourceKind::TxtFile | SourceKind::MdFile => {
                let title = name
                    .map(text_title)
                    .unwrap_or_else(|| PASTED_TITLE.to_string());
                text_document(title, payload)
            }
            SourceKind::EpubFile => normalize_epub(payload, name),
            SourceKind::Url => {
                let url = std::str::from_utf8(payload).map_err(|_| {
                    IngestError::InvalidFormat("URL is not valid UTF-8".to_string())
                })?;
                fetch_url(url, self.timeout)
            }
        }?;

        if document.content.trim().is_empty() {
            return Err(IngestError::NoContent("the source contains no text".to_string()));
        }
        log::info!(
            "ingested {:?} \"{}\": {} chars",
            kind,
            document.title,
            document.content.len()
        );
        Ok(document)
    }
}

/// [`Ingestor::ingest`] with the default network timeout.
pub fn ingest(kind: SourceKind, payload: &[u8], name: Option<&str>) -> Result<NormalizedDocument> {
    Ingestor::default().ingest(kind, payload, name)
}

/// Normalize an already-loaded source by its declared kind.
pub fn normalize(source: &SourceDocument) -> Result<NormalizedDocument> {
    let document = match source.kind {
        DocumentKind::Html => {
            let markup = String::from_utf8_lossy(strip_bom(&source.bytes));
            let mut document = normalize_html(&markup);
            if document.title.is_empty() {
                document.title = source.name.as_deref().map(text_title).unwrap_or_default();
            }
            document
        }
        DocumentKind::Epub => normalize_epub(&source.bytes, source.name.as_deref())?,
        DocumentKind::Text => {
            let title = source
                .name
                .as_deref()
                .map(text_title)
                .unwrap_or_else(|| PASTED_TITLE.to_string());
            text_document(title, &source.bytes)?
        }
    };
    if document.content.trim().is_empty() {
        return Err(IngestError::NoContent("the source contains no text".to_string()));
    }
    Ok(document)
}

fn text_document(title: String, bytes: &[u8]) -> Result<NormalizedDocument> {
    let content = String::from_utf8_lossy(strip_bom(bytes)).into_owned();
    Ok(NormalizedDocument { title, content })
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

/// File name without directories and without a text or markup extension.
pub fn text_title(name: &str) -> String {
    let file_name = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    for extension in [".txt", ".md", ".html", ".htm"] {
        if let Some(stem) = file_name.strip_suffix(extension) {
            return stem.to_string();
        }
    }
    file_name
}

/// Stable id: the same title and text always hash to the same id.
pub fn content_id(title: &str, text: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(title.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Bundle a normalized document and its tokens for a reading session.
pub fn create_content(
    document: NormalizedDocument,
    source: ContentSource,
    tokens: TokenStream,
) -> ReadingContent {
    let id = content_id(&document.title, &document.content);
    let keep_content = document.content.chars().count() < CONTENT_RETENTION_LIMIT;
    let words = tokens.into_vec();

    ReadingContent {
        id,
        title: document.title,
        source,
        word_count: words.len(),
        created_at: Utc::now(),
        content: keep_content.then_some(document.content),
        words,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{TokenizerConfig, tokenize};

    #[test]
    fn test_paste_titles_and_content() {
        let doc = ingest(SourceKind::Paste, "  some pasted words ".as_bytes(), None).unwrap();
        assert_eq!(doc.title, PASTED_TITLE);
        assert_eq!(doc.content, "  some pasted words ");
    }

    #[test]
    fn test_text_file_titles() {
        let doc = ingest(SourceKind::TxtFile, b"body", Some("/tmp/notes.txt")).unwrap();
        assert_eq!(doc.title, "notes");
        let doc = ingest(SourceKind::MdFile, b"\xEF\xBB\xBF# Heading", Some("README.md")).unwrap();
        assert_eq!(doc.title, "README");
        assert_eq!(doc.content, "# Heading");
    }

    #[test]
    fn test_empty_text_is_no_content() {
        let err = ingest(SourceKind::Paste, b" \n\t ", None).unwrap_err();
        assert!(matches!(err, IngestError::NoContent(_)));
    }

    #[test]
    fn test_invalid_url_is_invalid_format() {
        let err = ingest(SourceKind::Url, b"not a url", None).unwrap_err();
        assert!(matches!(err, IngestError::InvalidFormat(_)));
    }

    #[test]
    fn test_invalid_epub_bytes() {
        let err = ingest(SourceKind::EpubFile, b"PK but not really", Some("x.epub")).unwrap_err();
        assert!(matches!(err, IngestError::InvalidFormat(_)));
    }

    #[test]
    fn test_normalize_html_source_uses_file_name_title() {
        let source = SourceDocument::new(DocumentKind::Html, "<p>Hello <b>there</b></p>")
            .with_name("page.html");
        let doc = normalize(&source).unwrap();
        assert_eq!(doc.title, "page");
        assert_eq!(doc.content, "Hello there");
    }

    #[test]
    fn test_local_html_with_challenge_phrase_normalizes() {
        let source = SourceDocument::new(
            DocumentKind::Html,
            "<html><head><title>Just a moment...</title></head>\
             <body><p>\"Just a moment...\" she said.</p></body></html>",
        )
        .with_name("novel.html");
        let doc = normalize(&source).unwrap();
        assert_eq!(doc.title, "Just a moment...");
        assert_eq!(doc.content, "\"Just a moment...\" she said.");
    }

    #[test]
    fn test_content_id_is_stable() {
        assert_eq!(content_id("t", "body"), content_id("t", "body"));
        assert_ne!(content_id("t", "body"), content_id("t2", "body"));
        assert_eq!(content_id("t", "body").len(), 40);
    }

    #[test]
    fn test_create_content_retains_small_text_only() {
        let small = NormalizedDocument {
            title: "Small".to_string(),
            content: "a b c".to_string(),
        };
        let tokens = tokenize(&small.content, TokenizerConfig::default(), |_| {});
        let content = create_content(small, ContentSource::Paste, tokens);
        assert_eq!(content.word_count, 3);
        assert_eq!(content.content.as_deref(), Some("a b c"));

        let big_text = "word ".repeat(CONTENT_RETENTION_LIMIT / 5);
        let big = NormalizedDocument {
            title: "Big".to_string(),
            content: big_text,
        };
        let tokens = tokenize(&big.content, TokenizerConfig::default(), |_| {});
        let content = create_content(big, ContentSource::Epub, tokens);
        assert_eq!(content.content, None);
        assert_eq!(content.word_count, CONTENT_RETENTION_LIMIT / 5);
    }
}
