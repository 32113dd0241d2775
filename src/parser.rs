//! HTML path of the document normalizer.
//!
//! Markup is scanned with regular expressions; block elements become line
//! breaks, list items become bulleted lines, everything else is flattened to
//! text. Callers only see [`normalize_html`] and [`chapter_text`], so the
//! scanner can be swapped without touching them.

use crate::models::NormalizedDocument;
use regex::{Captures, Regex};
use std::sync::LazyLock;

pub const BULLET: &str = "• ";

/// Markup dialects with slightly different block rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    /// A fetched web page: boilerplate regions stripped, main region selected
    Page,
    /// An EPUB content document: `<head>` stripped, containers become breaks
    Chapter,
}

fn element_block(name: &str) -> Regex {
    Regex::new(&format!(r"(?is)<{name}(?:\s[^>]*)?>(.*?)</{name}\s*>")).unwrap()
}

static PAGE_NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "noscript", "nav", "header", "footer", "aside"]
        .iter()
        .map(|name| element_block(name))
        .collect()
});

static CHAPTER_NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let mut patterns = vec![
        Regex::new(r"(?i)<\?xml[^>]*\?>").unwrap(),
        Regex::new(r"(?i)<!DOCTYPE[^>]*>").unwrap(),
    ];
    patterns.extend(["head", "script", "style"].iter().map(|name| element_block(name)));
    patterns
});

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Preferred content regions, most specific first.
static REGIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["article", "main", "body"]
        .iter()
        .map(|name| element_block(name))
        .collect()
});

static HEADINGS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    (1..=6).map(|level| element_block(&format!("h{level}"))).collect()
});

static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| element_block("p"));
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| element_block("li"));
static LIST_EDGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(?:ul|ol)(?:\s[^>]*)?>").unwrap());
static CONTAINER_EDGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(?:div|section|article)(?:\s[^>]*)?>").unwrap());
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title[^>]*>([^<]+)</title\s*>").unwrap());

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});").unwrap()
});

static HORIZONTAL_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\t \x0B\x0C]+").unwrap());

/// Convert a web page into a titled plain-text document.
pub fn normalize_html(markup: &str) -> NormalizedDocument {
    NormalizedDocument {
        title: extract_title(markup).unwrap_or_default(),
        content: blocks_to_text(markup, Flavor::Page),
    }
}

/// Text of one EPUB content document.
pub fn chapter_text(markup: &str) -> String {
    blocks_to_text(markup, Flavor::Chapter)
}

/// Text of the first `<title>` element, entity-decoded and trimmed.
pub fn extract_title(markup: &str) -> Option<String> {
    let caps = TITLE.captures(markup)?;
    let title = decode_entities(caps[1].trim());
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

fn blocks_to_text(markup: &str, flavor: Flavor) -> String {
    let mut text = markup.replace("\r\n", "\n").replace('\r', "\n");

    let noise: &[Regex] = match flavor {
        Flavor::Page => PAGE_NOISE.as_slice(),
        Flavor::Chapter => CHAPTER_NOISE.as_slice(),
    };
    for pattern in noise {
        text = pattern.replace_all(&text, "").into_owned();
    }
    text = COMMENT.replace_all(&text, "").into_owned();

    if flavor == Flavor::Page {
        text = select_main_region(&text).to_string();
    }

    for heading in HEADINGS.iter() {
        text = heading.replace_all(&text, "\n\n${1}\n\n").into_owned();
    }
    let paragraph = match flavor {
        Flavor::Page => "\n\n${1}\n\n",
        Flavor::Chapter => "\n\n${1}",
    };
    text = PARAGRAPH.replace_all(&text, paragraph).into_owned();
    text = LINE_BREAK.replace_all(&text, "\n").into_owned();
    text = LIST_ITEM
        .replace_all(&text, format!("\n{BULLET}${{1}}").as_str())
        .into_owned();
    text = match flavor {
        Flavor::Page => LIST_EDGE.replace_all(&text, "\n").into_owned(),
        Flavor::Chapter => CONTAINER_EDGE.replace_all(&text, "\n").into_owned(),
    };

    text = ANY_TAG.replace_all(&text, " ").into_owned();
    text = decode_entities(&text);
    collapse_whitespace(&text)
}

/// `<article>`, else `<main>`, else `<body>`, else the whole document.
fn select_main_region(markup: &str) -> &str {
    REGIONS
        .iter()
        .find_map(|region| region.captures(markup))
        .and_then(|caps| caps.get(1))
        .map_or(markup, |m| m.as_str())
}

/// Decode named, decimal and hexadecimal character references in one pass.
/// Unknown references are left as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &Captures| match decode_entity(&caps[1]) {
            Some(ch) => ch.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(numeric) = entity.strip_prefix('#') {
        let hex = numeric.strip_prefix('x').or_else(|| numeric.strip_prefix('X'));
        let value = match hex {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(value);
    }
    named_entity(entity)
}

fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" | "AMP" => '&',
        "lt" | "LT" => '<',
        "gt" | "GT" => '>',
        "quot" | "QUOT" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "mdash" => '—',
        "ndash" => '–',
        "hellip" => '…',
        "ldquo" | "rdquo" | "laquo" | "raquo" | "bdquo" => '"',
        "lsquo" | "rsquo" | "sbquo" => '\'',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "deg" => '°',
        "middot" => '·',
        "bull" => '•',
        "shy" => '\u{AD}',
        "iexcl" => '¡',
        "iquest" => '¿',
        "aacute" => 'á',
        "eacute" => 'é',
        "iacute" => 'í',
        "oacute" => 'ó',
        "uacute" => 'ú',
        "Aacute" => 'Á',
        "Eacute" => 'É',
        "Iacute" => 'Í',
        "Oacute" => 'Ó',
        "Uacute" => 'Ú',
        "agrave" => 'à',
        "egrave" => 'è',
        "igrave" => 'ì',
        "ograve" => 'ò',
        "ugrave" => 'ù',
        "acirc" => 'â',
        "ecirc" => 'ê',
        "icirc" => 'î',
        "ocirc" => 'ô',
        "ucirc" => 'û',
        "auml" => 'ä',
        "euml" => 'ë',
        "iuml" => 'ï',
        "ouml" => 'ö',
        "uuml" => 'ü',
        "Auml" => 'Ä',
        "Ouml" => 'Ö',
        "Uuml" => 'Ü',
        "szlig" => 'ß',
        "ntilde" => 'ñ',
        "Ntilde" => 'Ñ',
        "ccedil" => 'ç',
        "Ccedil" => 'Ç',
        _ => return None,
    };
    Some(ch)
}

/// Trim every line, squeeze horizontal runs to one space and keep at most
/// one blank line between paragraphs.
fn collapse_whitespace(text: &str) -> String {
    let squeezed = HORIZONTAL_SPACE.replace_all(text, " ");
    let mut out = String::with_capacity(squeezed.len());
    let mut pending_blank = false;

    for line in squeezed.lines() {
        let line = line.trim();
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push_str(if pending_blank { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        pending_blank = false;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_html_prefers_article() {
        let html = r#"<html><head><title>My Page</title></head><body>
            <nav>Home | About</nav>
            <main><p>Main text</p></main>
            <article><h1>Heading</h1><p>First paragraph.</p><p>Second paragraph.</p></article>
        </body></html>"#;

        let doc = normalize_html(html);
        assert_eq!(doc.title, "My Page");
        assert_eq!(doc.content, "Heading\n\nFirst paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_normalize_html_falls_back_to_main_then_body() {
        let with_main = "<body><p>outside</p><main><p>inside</p></main></body>";
        assert_eq!(normalize_html(with_main).content, "inside");

        let body_only = "<html><body><p>just body</p></body></html>";
        assert_eq!(normalize_html(body_only).content, "just body");

        let fragment = "<p>bare fragment</p>";
        assert_eq!(normalize_html(fragment).content, "bare fragment");
    }

    #[test]
    fn test_normalize_html_strips_noise_blocks() {
        let html = r#"<body>
            <header>Site header</header>
            <script>var x = "<p>not text</p>";</script>
            <style>p { color: red; }</style>
            <noscript>Enable JS</noscript>
            <!-- a comment -->
            <p>Kept</p>
            <aside>Related links</aside>
            <footer>Copyright</footer>
        </body>"#;
        assert_eq!(normalize_html(html).content, "Kept");
    }

    #[test]
    fn test_normalize_html_lists_and_breaks() {
        let html = "<body><p>Items:</p><ul><li>One</li><li>Two</li></ul><p>Line one<br>Line two<br/>end</p></body>";
        let doc = normalize_html(html);
        assert_eq!(
            doc.content,
            "Items:\n\n• One\n• Two\n\nLine one\nLine two\nend"
        );
    }

    #[test]
    fn test_normalize_html_missing_title_is_empty() {
        let doc = normalize_html("<p>text</p>");
        assert_eq!(doc.title, "");
    }

    #[test]
    fn test_normalize_html_keeps_challenge_phrases_in_prose() {
        let html = "<p>\"Just a moment...\" she said, and left.</p>";
        let doc = normalize_html(html);
        assert_eq!(doc.content, "\"Just a moment...\" she said, and left.");
    }

    #[test]
    fn test_decode_entities_named_and_numeric() {
        assert_eq!(decode_entities("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("it&#39;s &#x41;&#X42;"), "it's AB");
        assert_eq!(decode_entities("&ldquo;hi&rdquo; &mdash; &hellip;"), "\"hi\" — …");
        assert_eq!(decode_entities("caf&eacute;"), "café");
    }

    #[test]
    fn test_decode_entities_single_pass() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_decode_entities_leaves_unknown() {
        assert_eq!(decode_entities("&bogus; & &#xZZ;"), "&bogus; & &#xZZ;");
        assert_eq!(decode_entities("&#1114112;"), "&#1114112;");
    }

    #[test]
    fn test_title_is_decoded() {
        let html = "<title> Tom &amp; Jerry </title>";
        assert_eq!(extract_title(html), Some("Tom & Jerry".to_string()));
        assert_eq!(extract_title("<title>   </title>"), None);
    }

    #[test]
    fn test_chapter_text_strips_head_and_declarations() {
        let xhtml = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Chapter One</title><style>body{}</style></head>
<body><section><h2>Chapter One</h2><p>It was a dark night.</p><div>A storm.</div></section></body>
</html>"#;
        assert_eq!(
            chapter_text(xhtml),
            "Chapter One\n\nIt was a dark night.\nA storm."
        );
    }

    #[test]
    fn test_chapter_text_keeps_header_elements() {
        let xhtml = "<body><header><h1>Title</h1></header><p>Body</p></body>";
        assert_eq!(chapter_text(xhtml), "Title\n\nBody");
    }

    #[test]
    fn test_paragraph_rule_does_not_match_pre() {
        let html = "<body><pre>code  here</pre></body>";
        assert_eq!(normalize_html(html).content, "code here");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b  \n\n\n\n  c\n d  "), "a b\n\nc\nd");
        assert_eq!(collapse_whitespace("\n\n\n"), "");
    }
}
