//! Atomic single-stream downloads.
//!
//! The resource is streamed into a uniquely-named temporary file created in
//! the destination's parent directory (same filesystem, so the final rename
//! is atomic at the OS level). On success the temp file replaces the
//! destination in one rename; on any failure the temp file's RAII guard
//! removes it and the destination is left untouched.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::FetchConfig;

use super::client::HttpClient;
use super::error::DownloadError;

/// Result of a completed atomic download.
#[derive(Debug, Clone)]
pub struct AtomicOutcome {
    /// Final published path.
    pub path: PathBuf,
    /// Bytes received from the response stream.
    pub bytes_written: u64,
}

/// Downloads a resource to a temporary location and atomically publishes it.
///
/// Used when partial-content support is unnecessary or unavailable. A
/// concurrent reader of the destination path observes either the complete
/// previous version or the complete new version, never a partial mixture.
#[derive(Debug, Clone)]
pub struct AtomicDownloader {
    client: HttpClient,
    config: FetchConfig,
}

impl AtomicDownloader {
    /// Creates a new atomic downloader.
    #[must_use]
    pub fn new(client: HttpClient, config: FetchConfig) -> Self {
        Self { client, config }
    }

    /// Downloads `url` and atomically publishes it at `dest`.
    ///
    /// The body is streamed to disk through a fixed-capacity buffer rather
    /// than held in memory.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Writing the temp file or renaming it over `dest` fails
    ///
    /// On every failure path the destination is untouched and the temporary
    /// file has been removed.
    #[must_use = "download outcome reports the published path and byte count"]
    #[instrument(skip(self), fields(url = %url, dest = %dest.display()))]
    pub async fn download(&self, url: &str, dest: &Path) -> Result<AtomicOutcome, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        // Temp file must live on the same filesystem as `dest` for the
        // rename to be atomic, so the platform temp dir is not an option.
        let parent = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(parent).map_err(|e| DownloadError::io(parent, e))?;
        debug!(temp = %temp.path().display(), "created temp file");

        let response = self.client.get(url, None).await?;

        let std_file = temp
            .reopen()
            .map_err(|e| DownloadError::io(temp.path(), e))?;
        let mut file = File::from_std(std_file);
        let bytes_written = stream_to_file(
            &mut file,
            response,
            url,
            temp.path(),
            self.config.stream_buffer_bytes,
        )
        .await?;

        // Atomic publish: rename within the same filesystem.
        temp.persist(dest)
            .map_err(|e| DownloadError::io(dest, e.error))?;

        info!(
            path = %dest.display(),
            bytes = bytes_written,
            "atomic download complete"
        );

        Ok(AtomicOutcome {
            path: dest.to_path_buf(),
            bytes_written,
        })
    }
}

/// Streams the response body to `file`, returning bytes written.
///
/// Extracted so the caller's temp-file guard handles cleanup on error.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    buffer_bytes: usize,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(buffer_bytes, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk before the rename.
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}
