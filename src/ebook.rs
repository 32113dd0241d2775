//! EPUB path of the document normalizer.
//!
//! Resolution is deliberately forgiving: the container, the package document
//! and every spine item are looked up through a chain of fallbacks, and only
//! when all of them are exhausted does an error reach the caller.

use crate::errors::{IngestError, Result};
use crate::models::NormalizedDocument;
use crate::parser::{chapter_text, decode_entities};
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use zip::ZipArchive;

pub const CONTAINER_PATH: &str = "META-INF/container.xml";
pub const DEFAULT_FILENAME: &str = "book.epub";

/// Chapters recovered by the whole-archive scan must be longer than this
/// (in characters) to count as content rather than navigation.
pub const MIN_SCANNED_CHAPTER_CHARS: usize = 50;

static ROOTFILE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)<rootfile\b[^>]*?\bfull-path\s*=\s*"([^"]+)""#,
        r#"(?i)<rootfile\b[^>]*?\bfull-path\s*=\s*'([^']+)'"#,
        r#"(?i)full-path\s*=\s*"([^"]+)""#,
        r#"(?i)full-path\s*=\s*'([^']+)'"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static TITLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)<dc:title[^>]*>([^<]+)</dc:title\s*>",
        r"(?is)<dc:title[^>]*>\s*<!\[CDATA\[(.*?)\]\]>\s*</dc:title\s*>",
        r"(?i)<title[^>]*>([^<]+)</title\s*>",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static ITEMREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<itemref\b[^>]*?\bidref\s*=\s*["']([^"']+)["']"#).unwrap()
});
static ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<item\s+([^>]+)>").unwrap());
static ITEM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(?:^|\s)id\s*=\s*["']([^"']+)["']"#).unwrap());
static ITEM_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(?:^|\s)href\s*=\s*["']([^"']+)["']"#).unwrap());
static HTML_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(?:xhtml|html?)$").unwrap());

/// What the normalizer needs from an OPF package document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Package {
    pub title: Option<String>,
    /// Manifest item id -> href (percent-decoded)
    pub manifest: HashMap<String, String>,
    /// Manifest ids in reading order, without duplicates
    pub spine: Vec<String>,
}

/// Convert raw EPUB bytes into a titled plain-text document.
///
/// `filename` provides the fallback title when the package declares none.
pub fn normalize_epub(bytes: &[u8], filename: Option<&str>) -> Result<NormalizedDocument> {
    let mut archive = EpubArchive::open(bytes)?;
    let opf_path = locate_package(&mut archive)?;
    let opf_name = archive.find_path(&opf_path).ok_or_else(|| {
        IngestError::NotFound(format!("cannot read OPF file {opf_path}"))
    })?;
    let opf = archive.read_text(&opf_name)?;
    let package = parse_package(&opf);
    log::debug!(
        "package {}: {} manifest items, {} spine items",
        opf_name,
        package.manifest.len(),
        package.spine.len()
    );

    let opf_dir = parent_dir(&opf_name);
    let mut chapters = read_spine(&mut archive, &package, opf_dir);
    if chapters.is_empty() {
        log::debug!("spine yielded no text, scanning every HTML file in the archive");
        chapters = scan_html_files(&mut archive);
    }

    let content = chapters.join("\n\n");
    if content.trim().is_empty() {
        return Err(IngestError::NoContent(
            "Could not extract any readable content from EPUB".to_string(),
        ));
    }

    let title = package
        .title
        .unwrap_or_else(|| title_from_filename(filename.unwrap_or(DEFAULT_FILENAME)));
    log::info!("extracted {} chapters from \"{}\"", chapters.len(), title);

    Ok(NormalizedDocument { title, content })
}

struct EpubArchive<'a> {
    zip: ZipArchive<Cursor<&'a [u8]>>,
    /// Member names in archive order, directories excluded
    names: Vec<String>,
}

impl<'a> EpubArchive<'a> {
    fn open(bytes: &'a [u8]) -> Result<Self> {
        let zip = ZipArchive::new(Cursor::new(bytes)).map_err(|err| {
            IngestError::InvalidFormat(format!("not a zip archive: {err}"))
        })?;
        let names = zip
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect();
        Ok(Self { zip, names })
    }

    /// Exact member name, else the first case-insensitive match.
    fn find_path(&self, path: &str) -> Option<String> {
        if let Some(name) = self.names.iter().find(|name| *name == path) {
            return Some(name.clone());
        }
        self.names
            .iter()
            .find(|name| name.eq_ignore_ascii_case(path))
            .cloned()
    }

    fn find_by(&self, predicate: impl Fn(&str) -> bool) -> Option<String> {
        self.names.iter().find(|name| predicate(name)).cloned()
    }

    fn read_text(&mut self, name: &str) -> Result<String> {
        let mut file = self.zip.by_name(name)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

fn is_package_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".opf")
}

/// Path of the OPF package document inside the archive.
fn locate_package(archive: &mut EpubArchive) -> Result<String> {
    let container = archive.find_path(CONTAINER_PATH).or_else(|| {
        archive.find_by(|name| name.to_ascii_lowercase().ends_with("container.xml"))
    });

    let Some(container) = container else {
        log::debug!("no container.xml, looking for an .opf file directly");
        return archive.find_by(is_package_name).ok_or_else(|| {
            IngestError::InvalidFormat(
                "Invalid EPUB: missing container.xml and no OPF file found".to_string(),
            )
        });
    };

    let container_xml = archive.read_text(&container)?;
    if let Some(path) = container_rootfile(&container_xml) {
        return Ok(path);
    }

    log::debug!("container.xml names no rootfile, looking for an .opf file directly");
    archive
        .find_by(is_package_name)
        .ok_or_else(|| IngestError::InvalidFormat("Invalid EPUB: cannot find OPF file".to_string()))
}

/// `full-path` of the container's root file, accepting either quote style
/// and any attribute order.
pub fn container_rootfile(container_xml: &str) -> Option<String> {
    ROOTFILE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(container_xml)
            .map(|caps| caps[1].trim().to_string())
            .filter(|path| !path.is_empty())
    })
}

pub fn parse_package(opf: &str) -> Package {
    let title = TITLE_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.captures(opf)?;
        let title = decode_entities(caps[1].trim());
        let title = title.trim();
        (!title.is_empty()).then(|| title.to_string())
    });

    let mut seen = HashSet::new();
    let spine = ITEMREF
        .captures_iter(opf)
        .map(|caps| caps[1].to_string())
        .filter(|idref| seen.insert(idref.clone()))
        .collect();

    let mut manifest = HashMap::new();
    for item in ITEM.captures_iter(opf) {
        let attrs = &item[1];
        let (Some(id), Some(href)) = (ITEM_ID.captures(attrs), ITEM_HREF.captures(attrs)) else {
            continue;
        };
        let href = &href[1];
        let decoded = percent_decode_str(href)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| href.to_string());
        manifest.insert(id[1].to_string(), decoded);
    }

    Package {
        title,
        manifest,
        spine,
    }
}

fn read_spine(archive: &mut EpubArchive, package: &Package, opf_dir: &str) -> Vec<String> {
    let mut chapters = Vec::new();

    for idref in &package.spine {
        let Some(href) = package.manifest.get(idref) else {
            log::debug!("spine item {idref} is not in the manifest");
            continue;
        };
        let Some(name) = candidate_paths(opf_dir, href)
            .iter()
            .find_map(|candidate| archive.find_path(candidate))
        else {
            log::debug!("could not find spine file {href}");
            continue;
        };

        match archive.read_text(&name) {
            Ok(markup) => {
                let text = chapter_text(&markup);
                if !text.trim().is_empty() {
                    chapters.push(text);
                }
            }
            Err(err) => log::warn!("skipping unreadable chapter {name}: {err}"),
        }
    }

    chapters
}

fn scan_html_files(archive: &mut EpubArchive) -> Vec<String> {
    let mut names: Vec<String> = archive
        .names
        .iter()
        .filter(|name| HTML_NAME.is_match(name))
        .filter(|name| {
            let lower = name.to_ascii_lowercase();
            !lower.contains("toc") && !lower.contains("nav")
        })
        .cloned()
        .collect();
    names.sort();

    let mut chapters = Vec::new();
    for name in names {
        match archive.read_text(&name) {
            Ok(markup) => {
                let text = chapter_text(&markup);
                if text.chars().count() > MIN_SCANNED_CHAPTER_CHARS {
                    chapters.push(text);
                }
            }
            Err(err) => log::warn!("skipping unreadable file {name}: {err}"),
        }
    }
    chapters
}

/// Archive paths a manifest href may refer to, most likely first.
pub fn candidate_paths(opf_dir: &str, href: &str) -> Vec<String> {
    let href = href.split('#').next().unwrap_or(href).trim();
    let stripped = href.trim_start_matches("./");

    let mut candidates = Vec::new();
    if let Some(absolute) = stripped.strip_prefix('/') {
        candidates.push(absolute.to_string());
    }
    candidates.push(resolve_path(opf_dir, stripped));
    candidates.push(stripped.to_string());
    candidates.push(format!("{opf_dir}{href}"));
    candidates.push(href.to_string());

    let mut seen = HashSet::new();
    candidates.retain(|candidate| !candidate.is_empty() && seen.insert(candidate.clone()));
    candidates
}

/// Join `href` onto `base_dir`, folding `.` and `..` segments.
pub fn resolve_path(base_dir: &str, href: &str) -> String {
    if let Some(absolute) = href.strip_prefix('/') {
        return absolute.trim_start_matches('/').to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Directory part of an archive path, with its trailing slash.
fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |idx| &path[..=idx])
}

fn title_from_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    name.replacen(".epub", "", 1)
}
