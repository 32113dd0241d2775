//! URL fetch boundary.
//!
//! One request per call, no retries. The caller decides whether to re-issue.

use crate::errors::{IngestError, Result};
use crate::models::NormalizedDocument;
use crate::parser::normalize_html;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_WEB_TITLE: &str = "Web Article";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Body fragments served by bot-defense interstitials instead of content.
pub const BOT_CHALLENGE_FINGERPRINTS: &[&str] =
    &["Just a moment...", "cf-browser-verification", "_cf_chl_opt"];

/// Parse `url` and require an http(s) scheme.
pub fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|err| IngestError::InvalidFormat(format!("invalid URL {url}: {err}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(IngestError::InvalidFormat(format!(
            "unsupported URL scheme: {scheme}"
        ))),
    }
}

/// Fetch a page and normalize it, titling it [`DEFAULT_WEB_TITLE`] when the
/// page has no `<title>`.
pub fn fetch_url(url: &str, timeout: Duration) -> Result<NormalizedDocument> {
    let body = fetch_page(url, timeout)?;
    let mut document = normalize_html(&body);
    if document.title.is_empty() {
        document.title = DEFAULT_WEB_TITLE.to_string();
    }
    if document.content.trim().is_empty() {
        return Err(IngestError::NoContent(format!(
            "no readable text found at {url}"
        )));
    }
    log::info!(
        "fetched \"{}\" ({} chars) from {}",
        document.title,
        document.content.len(),
        url
    );
    Ok(document)
}

/// Fetch the raw body of `url`, mapping refusals onto [`IngestError`] kinds.
pub fn fetch_page(url: &str, timeout: Duration) -> Result<String> {
    let url = parse_url(url)?;
    let client = build_client(&url, timeout)?;
    log::debug!("GET {url}");

    let response = client.get(url.clone()).send()?;
    if let Some(err) = status_error(response.status()) {
        log::debug!("{url} answered {}", response.status());
        return Err(err);
    }
    let body = response.text()?;
    if let Some(fingerprint) = bot_challenge_fingerprint(&body) {
        log::debug!("{url} served a bot challenge ({fingerprint})");
        return Err(IngestError::Blocked(
            "This website uses bot protection and cannot be accessed automatically. \
             Please copy and paste the text directly instead."
                .to_string(),
        ));
    }
    Ok(body)
}

pub fn bot_challenge_fingerprint(body: &str) -> Option<&'static str> {
    BOT_CHALLENGE_FINGERPRINTS
        .iter()
        .copied()
        .find(|fingerprint| body.contains(fingerprint))
}

/// Error kind for a non-success status, `None` for 2xx.
pub fn status_error(status: StatusCode) -> Option<IngestError> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::FORBIDDEN => IngestError::Blocked(
            "This website blocks automated access. Try copying the text and pasting it instead."
                .to_string(),
        ),
        StatusCode::TOO_MANY_REQUESTS => IngestError::RateLimited,
        other => IngestError::NetworkError(format!("HTTP {other}")),
    })
}

fn build_client(url: &Url, timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    let mut builder = Client::builder()
        .timeout(timeout)
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers);
    if matches!(url.host_str(), Some("127.0.0.1" | "localhost")) {
        builder = builder.no_proxy();
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_accepts_http_and_https() {
        assert!(parse_url("https://example.com/a").is_ok());
        assert!(parse_url("  http://example.com ").is_ok());
    }

    #[test]
    fn test_parse_url_rejects_other_input() {
        assert!(matches!(parse_url("not a url"), Err(IngestError::InvalidFormat(_))));
        assert!(matches!(
            parse_url("ftp://example.com/file"),
            Err(IngestError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_bot_challenge_fingerprints() {
        assert_eq!(
            bot_challenge_fingerprint("<title>Just a moment...</title>"),
            Some("Just a moment...")
        );
        assert_eq!(
            bot_challenge_fingerprint("<script>window._cf_chl_opt = {}</script>"),
            Some("_cf_chl_opt")
        );
        assert_eq!(bot_challenge_fingerprint("<p>An ordinary page.</p>"), None);
    }

    #[test]
    fn test_status_error_mapping() {
        assert_eq!(status_error(StatusCode::OK), None);
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN),
            Some(IngestError::Blocked(_))
        ));
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS),
            Some(IngestError::RateLimited)
        );
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND),
            Some(IngestError::NetworkError(_))
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY),
            Some(IngestError::NetworkError(_))
        ));
    }
}
