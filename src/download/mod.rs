//! HTTP download strategies for fetching a single file to disk.
//!
//! Two independent strategies are provided:
//!
//! - [`AtomicDownloader`] streams one GET response to a temporary file and
//!   atomically publishes it via rename. Observers never see a partially
//!   written destination.
//! - [`ParallelDownloader`] probes the resource size with HEAD, partitions it
//!   into fixed-size byte ranges, and downloads the ranges concurrently into
//!   a pre-allocated destination file using `Range` requests.
//!
//! Both correctly report every failure as a [`DownloadError`]; neither
//! retries. The parallel strategy requires the resource to stay immutable
//! between the size probe and the range requests (no `If-Range`/ETag
//! conditional headers are sent).
//!
//! # Example
//!
//! ```no_run
//! use parfetch::{FetchConfig, HttpClient, ParallelDownloader};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let downloader = ParallelDownloader::new(client, FetchConfig::default())?;
//! let outcome = downloader
//!     .download("https://example.com/release.bin", Path::new("./release.bin"))
//!     .await?;
//! println!("Fetched {} bytes in {} chunks", outcome.bytes_written, outcome.chunks);
//! # Ok(())
//! # }
//! ```

mod atomic;
mod client;
mod error;
mod parallel;

pub use atomic::{AtomicDownloader, AtomicOutcome};
pub use client::HttpClient;
pub use error::DownloadError;
pub use parallel::{ChunkSpan, ParallelDownloader, ParallelOutcome, plan_chunks};

// Note: no module-local Result aliases. Use `Result<T, DownloadError>`
// explicitly in function signatures.
