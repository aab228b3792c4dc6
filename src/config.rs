//! Fetch configuration: timeouts, chunking, and concurrency limits.
//!
//! [`FetchConfig`] is plain data shared by both download strategies. It is
//! serde-derived so callers can embed it in their own configuration files;
//! validation happens where the values are consumed (the parallel downloader
//! rejects out-of-range chunking and concurrency values at construction).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default HTTP connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default HTTP read timeout (10 seconds).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default byte-range chunk size (4 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// Default cap on simultaneous range transfers.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Default write-buffer capacity for streamed single-file downloads (8 KiB).
pub const DEFAULT_STREAM_BUFFER_BYTES: usize = 8 * 1024;

/// Minimum allowed concurrency value.
pub(crate) const MIN_CONCURRENT: usize = 1;

/// Maximum allowed concurrency value.
pub(crate) const MAX_CONCURRENT: usize = 64;

/// Configuration shared by the download strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// HTTP connect timeout.
    pub connect_timeout: Duration,
    /// HTTP read timeout, applied to the whole response body.
    pub read_timeout: Duration,
    /// Byte-range size for the parallel strategy. Must be non-zero.
    pub chunk_size: u64,
    /// Cap on simultaneous range transfers (1-64).
    pub max_concurrent: usize,
    /// Write-buffer capacity used when streaming a single response to disk.
    pub stream_buffer_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            stream_buffer_bytes: DEFAULT_STREAM_BUFFER_BYTES,
        }
    }
}
