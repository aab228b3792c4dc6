//! Post-download size verification.
//!
//! Compares the local file's size against the remote resource's advertised
//! `Content-Length` and classifies the download as matching or not.
//!
//! This check is size-only: byte-level corruption where the lengths happen to
//! coincide is undetectable here. It makes no stronger integrity claim; use a
//! content checksum when one is published for the resource.

use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use reqwest::header::CONTENT_LENGTH;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::download::HttpClient;

/// Errors that can occur during size verification.
///
/// Every failure condition is a distinct variant so callers can branch on
/// cause, not just success/failure.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The local file does not exist.
    #[error("local file missing: {path}")]
    LocalFileMissing {
        /// The path that was checked.
        path: PathBuf,
    },

    /// Reading local file metadata failed for a reason other than absence.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The path whose metadata could not be read.
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

    /// Network-level error while probing the remote resource.
    #[error("network error probing {url}: {source}")]
    Network {
        /// The URL that failed to probe.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The size probe timed out.
    #[error("timeout probing {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The remote probe returned a status other than 200.
    #[error("HTTP {status} probing {url}")]
    RemoteProbeFailed {
        /// The URL that was probed.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The probe response carried no usable `Content-Length`.
    #[error("remote size unavailable for {url}: missing or unusable Content-Length")]
    RemoteSizeUnavailable {
        /// The URL whose size is unavailable.
        url: String,
    },

    /// Local and remote sizes differ (strict verification only).
    #[error(
        "size mismatch for {path}: local {local_bytes} bytes, remote {remote_bytes} bytes"
    )]
    SizeMismatch {
        /// The local path that failed verification.
        path: PathBuf,
        /// Size of the local file.
        local_bytes: u64,
        /// Size advertised by the remote resource.
        remote_bytes: u64,
    },
}

/// Local and remote sizes of one downloaded resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeComparison {
    /// Size of the local file in bytes.
    pub local_bytes: u64,
    /// Size advertised by the remote resource in bytes.
    pub remote_bytes: u64,
}

impl SizeComparison {
    /// Whether local and remote sizes agree.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.local_bytes == self.remote_bytes
    }
}

/// Verifies a downloaded file against the remote resource's advertised size.
#[derive(Debug, Clone)]
pub struct SizeVerifier {
    client: HttpClient,
}

impl SizeVerifier {
    /// Creates a new verifier.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Compares the size of `path` against the `Content-Length` of `url`.
    ///
    /// The missing-file check short-circuits before any network call: a
    /// missing local file never triggers a remote probe.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::LocalFileMissing`] if `path` does not exist,
    /// [`VerifyError::RemoteProbeFailed`] if the HEAD probe returns a status
    /// other than 200, and [`VerifyError::RemoteSizeUnavailable`] if the
    /// probe carries no usable `Content-Length`.
    #[must_use = "comparison carries both sizes; check is_match()"]
    #[instrument(skip(self), fields(path = %path.display(), url = %url))]
    pub async fn verify(&self, path: &Path, url: &str) -> Result<SizeComparison, VerifyError> {
        // Local check first: no network traffic for a file we don't have.
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VerifyError::LocalFileMissing {
                    path: path.to_path_buf(),
                }
            } else {
                VerifyError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let local_bytes = metadata.len();

        Url::parse(url).map_err(|_| VerifyError::InvalidUrl {
            url: url.to_string(),
        })?;

        let response = self.client.inner().head(url).send().await.map_err(|e| {
            if e.is_timeout() {
                VerifyError::Timeout {
                    url: url.to_string(),
                }
            } else {
                VerifyError::Network {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        if response.status() != StatusCode::OK {
            return Err(VerifyError::RemoteProbeFailed {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let remote_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|len| *len > 0)
            .ok_or_else(|| VerifyError::RemoteSizeUnavailable {
                url: url.to_string(),
            })?;

        let comparison = SizeComparison {
            local_bytes,
            remote_bytes,
        };
        if comparison.is_match() {
            info!(local_bytes, remote_bytes, "local and remote sizes match");
        } else {
            warn!(local_bytes, remote_bytes, "local and remote sizes differ");
        }
        debug!(path = %path.display(), "verification complete");
        Ok(comparison)
    }

    /// Like [`verify`](Self::verify), but converts a size mismatch into
    /// [`VerifyError::SizeMismatch`].
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`verify`](Self::verify), plus
    /// [`VerifyError::SizeMismatch`] when the sizes differ.
    #[instrument(skip(self), fields(path = %path.display(), url = %url))]
    pub async fn verify_strict(&self, path: &Path, url: &str) -> Result<SizeComparison, VerifyError> {
        let comparison = self.verify(path, url).await?;
        if !comparison.is_match() {
            return Err(VerifyError::SizeMismatch {
                path: path.to_path_buf(),
                local_bytes: comparison.local_bytes,
                remote_bytes: comparison.remote_bytes,
            });
        }
        Ok(comparison)
    }
}
