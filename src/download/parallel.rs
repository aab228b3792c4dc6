//! Parallel chunked downloads over HTTP range requests.
//!
//! The resource size is probed with HEAD, partitioned into fixed-size byte
//! ranges, and the ranges are fetched concurrently into a destination file
//! pre-allocated to its final length. Workers write at disjoint offsets, so
//! no range locking is needed; the plan construction guarantees disjointness.
//!
//! # Concurrency Model
//!
//! - Each range runs in its own Tokio task, admitted through a sliding
//!   window capped at `max_concurrent` in-flight transfers
//! - All range results are aggregated after the join barrier; any failed
//!   range fails the whole download
//! - The first fatal range failure aborts the remaining in-flight tasks, and
//!   the task set is drained to completion before the error is returned, so
//!   no worker outlives the call

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncSeekExt, AsyncWriteExt, SeekFrom};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::{FetchConfig, MAX_CONCURRENT, MIN_CONCURRENT};

use super::client::HttpClient;
use super::error::DownloadError;

/// One contiguous byte range of the target resource.
///
/// Spans are half-open nowhere: both `start` and `end` are inclusive, matching
/// the `Range: bytes=<start>-<end>` wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Position of this chunk within the plan.
    pub index: usize,
    /// First byte offset covered by this chunk.
    pub start: u64,
    /// Last byte offset covered by this chunk (inclusive).
    pub end: u64,
}

impl ChunkSpan {
    /// Number of bytes this span covers.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Whether the span covers no bytes. Never true for planned spans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The `Range` header value requesting exactly this span.
    #[must_use]
    pub fn to_range_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Partitions `[0, total_size - 1]` into inclusive byte ranges of
/// `chunk_size` bytes, the final range absorbing the remainder.
///
/// A resource smaller than one chunk yields a single span covering the whole
/// file. A `total_size` of zero yields an empty plan; callers are expected to
/// reject unknown/zero sizes before planning.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidChunkSize`] if `chunk_size` is zero.
#[allow(clippy::cast_possible_truncation)]
pub fn plan_chunks(total_size: u64, chunk_size: u64) -> Result<Vec<ChunkSpan>, DownloadError> {
    if chunk_size == 0 {
        return Err(DownloadError::InvalidChunkSize { value: chunk_size });
    }
    if total_size == 0 {
        return Ok(Vec::new());
    }

    let count = if total_size < chunk_size {
        1
    } else {
        total_size.div_ceil(chunk_size)
    };

    let mut spans = Vec::with_capacity(count as usize);
    for index in 0..count {
        let start = index * chunk_size;
        let end = if index == count - 1 {
            total_size - 1
        } else {
            start + chunk_size - 1
        };
        spans.push(ChunkSpan {
            index: index as usize,
            start,
            end,
        });
    }
    Ok(spans)
}

/// Result of a completed parallel download.
#[derive(Debug, Clone)]
pub struct ParallelOutcome {
    /// Destination path the ranges were assembled into.
    pub path: PathBuf,
    /// Total bytes written across all ranges.
    pub bytes_written: u64,
    /// Number of ranges the resource was split into.
    pub chunks: usize,
}

/// Downloads a resource by fetching disjoint byte ranges concurrently.
///
/// Requires the server to honor `Range` requests and the resource to stay
/// immutable for the duration of the download; no conditional headers
/// (`If-Range`/ETag) are sent, so a resource that changes between the size
/// probe and the range requests yields corrupt output.
#[derive(Debug, Clone)]
pub struct ParallelDownloader {
    client: HttpClient,
    config: FetchConfig,
}

impl ParallelDownloader {
    /// Creates a new parallel downloader.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidChunkSize`] if `config.chunk_size` is
    /// zero, or [`DownloadError::InvalidConcurrency`] if
    /// `config.max_concurrent` is outside the valid range (1-64).
    pub fn new(client: HttpClient, config: FetchConfig) -> Result<Self, DownloadError> {
        if config.chunk_size == 0 {
            return Err(DownloadError::InvalidChunkSize {
                value: config.chunk_size,
            });
        }
        if !(MIN_CONCURRENT..=MAX_CONCURRENT).contains(&config.max_concurrent) {
            return Err(DownloadError::InvalidConcurrency {
                value: config.max_concurrent,
            });
        }
        Ok(Self { client, config })
    }

    /// Downloads `url` into `dest` using concurrent range requests.
    ///
    /// The destination is created (or truncated) and pre-sized to the full
    /// remote length before any range starts, so concurrent writes at
    /// disjoint offsets never grow the file.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The size probe finds no usable `Content-Length` ([`DownloadError::SizeUnknown`])
    /// - Pre-allocating the destination fails
    /// - Any range fails with a transport error, a non-success status, an IO
    ///   error, or a wrong-sized body
    ///
    /// A failed download leaves the pre-allocated destination behind; its
    /// contents are unspecified. Callers wanting all-or-nothing semantics
    /// should download to a scratch path and verify before moving it into
    /// place.
    #[must_use = "download outcome reports the assembled byte and chunk counts"]
    #[instrument(skip(self), fields(url = %url, dest = %dest.display()))]
    pub async fn download(&self, url: &str, dest: &Path) -> Result<ParallelOutcome, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let total_size = self.client.content_length(url).await?;
        let plan = plan_chunks(total_size, self.config.chunk_size)?;
        info!(
            total_size,
            chunks = plan.len(),
            max_concurrent = self.config.max_concurrent,
            "starting parallel download"
        );

        preallocate(dest, total_size).await?;

        let mut pending = plan.iter().copied();
        let mut join_set: JoinSet<Result<u64, DownloadError>> = JoinSet::new();

        let launch = |span: ChunkSpan, join_set: &mut JoinSet<Result<u64, DownloadError>>| {
            let client = self.client.clone();
            let url = url.to_string();
            let dest = dest.to_path_buf();
            join_set.spawn(async move { fetch_range(&client, &url, &dest, span).await });
        };

        while join_set.len() < self.config.max_concurrent {
            let Some(span) = pending.next() else { break };
            launch(span, &mut join_set);
        }

        let mut bytes_written: u64 = 0;
        let mut first_error: Option<DownloadError> = None;

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(bytes)) => {
                    bytes_written += bytes;
                    // Admit the next range only while the download is healthy.
                    if first_error.is_none() {
                        if let Some(span) = pending.next() {
                            launch(span, &mut join_set);
                        }
                    }
                }
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        warn!(error = %e, "range failed; aborting remaining ranges");
                        join_set.abort_all();
                        first_error = Some(e);
                    }
                }
                Err(join_error) => {
                    if join_error.is_cancelled() {
                        continue;
                    }
                    if first_error.is_none() {
                        warn!(error = %join_error, "range worker panicked; aborting remaining ranges");
                        join_set.abort_all();
                        first_error = Some(DownloadError::io(
                            dest,
                            std::io::Error::other(format!("range worker panicked: {join_error}")),
                        ));
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        info!(
            path = %dest.display(),
            bytes = bytes_written,
            chunks = plan.len(),
            "parallel download complete"
        );

        Ok(ParallelOutcome {
            path: dest.to_path_buf(),
            bytes_written,
            chunks: plan.len(),
        })
    }
}

/// Creates (or truncates) `dest` and fixes its length at `total_size` bytes.
async fn preallocate(dest: &Path, total_size: u64) -> Result<(), DownloadError> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(dest)
        .await
        .map_err(|e| DownloadError::io(dest, e))?;
    file.set_len(total_size)
        .await
        .map_err(|e| DownloadError::io(dest, e))?;
    debug!(path = %dest.display(), total_size, "pre-allocated destination");
    Ok(())
}

/// Fetches one byte range and writes it at its offset in `dest`.
///
/// Each worker opens its own handle; the open mode never truncates, and the
/// planned spans are disjoint, so concurrent workers cannot interleave.
/// A body that does not match the requested span length (a server that
/// ignored `Range`, or a truncated response) is rejected before it can spill
/// into a neighboring chunk.
async fn fetch_range(
    client: &HttpClient,
    url: &str,
    dest: &Path,
    span: ChunkSpan,
) -> Result<u64, DownloadError> {
    let response = client.get(url, Some(&span.to_range_header())).await?;

    let mut file = OpenOptions::new()
        .write(true)
        .open(dest)
        .await
        .map_err(|e| DownloadError::io(dest, e))?;
    file.seek(SeekFrom::Start(span.start))
        .await
        .map_err(|e| DownloadError::io(dest, e))?;

    let expected = span.len();
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;
        let received = bytes_written + chunk.len() as u64;
        if received > expected {
            return Err(DownloadError::range_mismatch(
                dest,
                span.index,
                expected,
                received,
            ));
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;
        bytes_written = received;
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::io(dest, e))?;

    if bytes_written != expected {
        return Err(DownloadError::range_mismatch(
            dest,
            span.index,
            expected,
            bytes_written,
        ));
    }

    debug!(
        index = span.index,
        start = span.start,
        end = span.end,
        "range complete"
    );
    Ok(bytes_written)
}
