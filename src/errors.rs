//! Error types for document ingestion.
//!
//! Ingestion is all-or-nothing: every fallback is tried locally and only
//! then one of these kinds reaches the caller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Malformed source or archive
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A referenced manifest or package entry is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote site refused the request or served a bot challenge
    #[error("Blocked: {0}")]
    Blocked(String),

    #[error("Too many requests. Please wait a moment and try again.")]
    RateLimited,

    /// Nothing extractable survived every fallback
    #[error("No content: {0}")]
    NoContent(String),

    /// Transport or HTTP failure
    #[error("Network error: {0}")]
    NetworkError(String),
}

impl From<zip::result::ZipError> for IngestError {
    fn from(error: zip::result::ZipError) -> Self {
        match error {
            zip::result::ZipError::FileNotFound => Self::NotFound(error.to_string()),
            other => Self::InvalidFormat(format!("unreadable archive: {other}")),
        }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(error: std::io::Error) -> Self {
        Self::InvalidFormat(error.to_string())
    }
}

impl From<std::string::FromUtf8Error> for IngestError {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::InvalidFormat(format!("invalid UTF-8: {error}"))
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(error: reqwest::Error) -> Self {
        Self::NetworkError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            IngestError::InvalidFormat("missing container.xml".into()).to_string(),
            "Invalid format: missing container.xml"
        );
        assert!(IngestError::RateLimited.to_string().contains("Too many requests"));
    }

    #[test]
    fn test_zip_file_not_found_maps_to_not_found() {
        let err: IngestError = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(err, IngestError::NotFound(_)));
    }

    #[test]
    fn test_io_error_maps_to_invalid_format() {
        let err: IngestError = std::io::Error::other("boom").into();
        assert_eq!(err, IngestError::InvalidFormat("boom".to_string()));
    }
}
