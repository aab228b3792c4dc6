//! HTTP client wrapper shared by the download strategies.
//!
//! This module provides the `HttpClient` struct which handles request
//! dispatch with proper timeout configuration and error mapping.

use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, RANGE};
use tracing::debug;

use crate::config::FetchConfig;
use crate::user_agent;

use super::error::DownloadError;

/// HTTP client for download and probe requests.
///
/// This client is designed to be created once and reused across downloads,
/// taking advantage of connection pooling. It is cheap to clone; clones share
/// the underlying pool.
///
/// # Example
///
/// ```no_run
/// use parfetch::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let size = client.content_length("https://example.com/release.bin").await?;
/// println!("remote size: {size} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts (10s connect, 10s read).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&FetchConfig::default())
    }

    /// Creates a new HTTP client with timeouts taken from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_config(config: &FetchConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Sends a GET request, optionally with a `Range` header.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Timeout`] or [`DownloadError::Network`] on
    /// transport failures and [`DownloadError::HttpStatus`] for any
    /// non-success response status.
    pub(crate) async fn get(
        &self,
        url: &str,
        range: Option<&str>,
    ) -> Result<reqwest::Response, DownloadError> {
        let mut request = self.client.get(url);
        if let Some(range) = range {
            request = request.header(RANGE, range);
        }
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        if !response.status().is_success() {
            return Err(DownloadError::http_status(url, response.status().as_u16()));
        }
        Ok(response)
    }

    /// Probes the resource size with a HEAD request.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::SizeUnknown`] if the response carries no
    /// usable `Content-Length` (absent, unparsable, or zero), plus the same
    /// transport and status errors as [`get`](Self::get).
    pub async fn content_length(&self, url: &str) -> Result<u64, DownloadError> {
        let response = self.client.head(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        if !response.status().is_success() {
            return Err(DownloadError::http_status(url, response.status().as_u16()));
        }

        let size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|len| *len > 0)
            .ok_or_else(|| DownloadError::size_unknown(url))?;

        debug!(url = %url, size, "size probe complete");
        Ok(size)
    }

    /// Returns a reference to the underlying reqwest client.
    ///
    /// This can be used for requests not covered by this wrapper (the
    /// verifier issues its own HEAD probe through it).
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}
