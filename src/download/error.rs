//! Error types for the download module.
//!
//! This module defines structured errors for both download strategies,
//! providing context-rich error messages for debugging and user feedback.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{MAX_CONCURRENT, MIN_CONCURRENT};

/// Errors that can occur during file downloads.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (create file, write, rename, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The size probe found no usable Content-Length.
    ///
    /// An absent, unparsable, or zero Content-Length means no chunk plan can
    /// be built; this is surfaced explicitly instead of degrading to an empty
    /// download.
    #[error("remote size unknown for {url}: missing or unusable Content-Length")]
    SizeUnknown {
        /// The URL whose size probe failed.
        url: String,
    },

    /// A range response delivered a different byte count than requested.
    ///
    /// Raised when a server ignores the `Range` header or truncates the body;
    /// writing a wrong-sized body would corrupt neighboring chunks.
    #[error(
        "range {index} of {path}: expected {expected_bytes} bytes, received {actual_bytes}"
    )]
    RangeMismatch {
        /// Destination path being assembled.
        path: PathBuf,
        /// Index of the chunk within the plan.
        index: usize,
        /// Bytes requested for this range.
        expected_bytes: u64,
        /// Bytes the server actually delivered.
        actual_bytes: u64,
    },

    /// Invalid chunk size supplied in the configuration.
    #[error("invalid chunk size {value}: must be at least 1 byte")]
    InvalidChunkSize {
        /// The invalid value that was provided.
        value: u64,
    },

    /// Invalid concurrency value supplied in the configuration.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENT} and {MAX_CONCURRENT}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a size-unknown error.
    pub fn size_unknown(url: impl Into<String>) -> Self {
        Self::SizeUnknown { url: url.into() }
    }

    /// Creates a range mismatch error.
    pub fn range_mismatch(
        path: impl Into<PathBuf>,
        index: usize,
        expected_bytes: u64,
        actual_bytes: u64,
    ) -> Self {
        Self::RangeMismatch {
            path: path.into(),
            index,
            expected_bytes,
            actual_bytes,
        }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` or
// `From<std::io::Error>` because our error variants require context (url,
// path) that the source errors don't provide. The helper constructor methods
// (network(), io(), etc.) allow callers to provide that context.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_timeout_display() {
        // We can't easily create a reqwest::Error, so exercise the other variants
        let error = DownloadError::timeout("https://example.com/release.bin");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/release.bin"));
    }

    #[test]
    fn test_download_error_http_status_display() {
        let error = DownloadError::http_status("https://example.com/release.bin", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/release.bin"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_download_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io(PathBuf::from("/tmp/release.bin"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/release.bin"), "Expected path in: {msg}");
    }

    #[test]
    fn test_download_error_invalid_url_display() {
        let error = DownloadError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(
            msg.contains("invalid URL"),
            "Expected 'invalid URL' in: {msg}"
        );
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_download_error_size_unknown_display() {
        let error = DownloadError::size_unknown("https://example.com/release.bin");
        let msg = error.to_string();
        assert!(
            msg.contains("Content-Length"),
            "Expected header name in: {msg}"
        );
        assert!(
            msg.contains("https://example.com/release.bin"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_download_error_range_mismatch_display() {
        let error =
            DownloadError::range_mismatch(PathBuf::from("/tmp/release.bin"), 2, 4096, 1024);
        let msg = error.to_string();
        assert!(msg.contains("range 2"), "Expected chunk index in: {msg}");
        assert!(msg.contains("4096"), "Expected requested bytes in: {msg}");
        assert!(msg.contains("1024"), "Expected delivered bytes in: {msg}");
    }

    #[test]
    fn test_download_error_invalid_concurrency_names_bounds() {
        let error = DownloadError::InvalidConcurrency { value: 0 };
        let msg = error.to_string();
        assert!(msg.contains('1'), "Expected lower bound in: {msg}");
        assert!(msg.contains("64"), "Expected upper bound in: {msg}");
    }
}
