//! Integration tests for the parallel chunked downloader.
//!
//! A mock server answers `Range` requests with 206 slices of a fixed body;
//! the tests verify that the reassembled file is byte-identical, that the
//! chunk plan drives the expected number of range requests, and that failure
//! of any single range fails the whole download.

use parfetch::{DownloadError, FetchConfig, HttpClient, ParallelDownloader};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const MIB: u64 = 1024 * 1024;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Deterministic, non-repeating-ish body so off-by-one chunk placement shows
/// up as a content mismatch rather than passing by accident.
fn test_body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn parse_range(value: &str) -> Option<(u64, u64)> {
    let suffix = value.strip_prefix("bytes=")?;
    let (start, end) = suffix.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

/// Serves 206 slices of `body` according to the request's `Range` header,
/// or the full body with 200 when no range is present.
struct RangeResponder {
    body: Vec<u8>,
}

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let range = request
            .headers
            .get("range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_range);
        match range {
            Some((start, end)) => {
                let end = end.min(self.body.len() as u64 - 1);
                let slice = self.body[start as usize..=end as usize].to_vec();
                ResponseTemplate::new(206)
                    .insert_header(
                        "Content-Range",
                        format!("bytes {start}-{end}/{}", self.body.len()).as_str(),
                    )
                    .set_body_bytes(slice)
            }
            None => ResponseTemplate::new(200).set_body_bytes(self.body.clone()),
        }
    }
}

/// Mounts HEAD (size probe) and GET (range) handlers for `body` at `/release.bin`.
async fn setup_range_server(body: &[u8]) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/release.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/release.bin"))
        .respond_with(RangeResponder {
            body: body.to_vec(),
        })
        .mount(&mock_server)
        .await;

    mock_server
}

/// Number of GET requests carrying a `Range` header the server has seen.
async fn range_request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording should be enabled")
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.headers.contains_key("range"))
        .count()
}

fn config_with_chunk_size(chunk_size: u64) -> FetchConfig {
    FetchConfig {
        chunk_size,
        ..FetchConfig::default()
    }
}

#[tokio::test]
async fn test_parallel_download_reassembles_content() {
    init_tracing();
    let body = test_body(10_000);
    let mock_server = setup_range_server(&body).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("release.bin");

    let downloader =
        ParallelDownloader::new(HttpClient::new(), config_with_chunk_size(4096)).unwrap();
    let url = format!("{}/release.bin", mock_server.uri());
    let outcome = downloader
        .download(&url, &dest)
        .await
        .expect("download should succeed");

    assert_eq!(outcome.chunks, 3, "10000 / 4096 should plan 3 chunks");
    assert_eq!(outcome.bytes_written, 10_000);
    assert_eq!(
        std::fs::read(&dest).unwrap(),
        body,
        "Reassembled file must match the served body byte for byte"
    );
    assert_eq!(range_request_count(&mock_server).await, 3);
}

#[tokio::test]
async fn test_parallel_scenario_ten_mib_with_four_mib_chunks() {
    let body = test_body((10 * MIB) as usize);
    let mock_server = setup_range_server(&body).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("release.bin");

    let downloader =
        ParallelDownloader::new(HttpClient::new(), FetchConfig::default()).unwrap();
    let url = format!("{}/release.bin", mock_server.uri());
    let outcome = downloader
        .download(&url, &dest)
        .await
        .expect("download should succeed");

    assert_eq!(outcome.chunks, 3, "10 MiB / 4 MiB should plan 3 chunks");
    assert_eq!(outcome.bytes_written, 10_485_760);
    assert_eq!(
        std::fs::metadata(&dest).unwrap().len(),
        10_485_760,
        "Final file size must equal the advertised Content-Length"
    );
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert_eq!(range_request_count(&mock_server).await, 3);
}

#[tokio::test]
async fn test_parallel_small_file_uses_single_chunk() {
    let body = test_body(100);
    let mock_server = setup_range_server(&body).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("release.bin");

    let downloader =
        ParallelDownloader::new(HttpClient::new(), FetchConfig::default()).unwrap();
    let url = format!("{}/release.bin", mock_server.uri());
    let outcome = downloader
        .download(&url, &dest)
        .await
        .expect("download should succeed");

    assert_eq!(outcome.chunks, 1, "File smaller than one chunk spans whole file");
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert_eq!(range_request_count(&mock_server).await, 1);
}

#[tokio::test]
async fn test_parallel_head_without_content_length_fails_fast() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("release.bin");

    // HEAD answers 200 with an empty body: no usable Content-Length.
    Mock::given(method("HEAD"))
        .and(path("/release.bin"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let downloader =
        ParallelDownloader::new(HttpClient::new(), FetchConfig::default()).unwrap();
    let url = format!("{}/release.bin", mock_server.uri());
    let result = downloader.download(&url, &dest).await;

    assert!(
        matches!(result, Err(DownloadError::SizeUnknown { .. })),
        "Expected SizeUnknown, got: {result:?}"
    );
    assert!(
        !dest.exists(),
        "No destination file should be created when the size probe fails"
    );
}

#[tokio::test]
async fn test_parallel_failing_range_fails_the_download() {
    init_tracing();
    let body = test_body(12);
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("release.bin");

    Mock::given(method("HEAD"))
        .and(path("/release.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&mock_server)
        .await;

    // The middle range is answered 503; its siblings succeed.
    Mock::given(method("GET"))
        .and(path("/release.bin"))
        .and(header("Range", "bytes=4-7"))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/release.bin"))
        .respond_with(RangeResponder { body: body.clone() })
        .mount(&mock_server)
        .await;

    let downloader =
        ParallelDownloader::new(HttpClient::new(), config_with_chunk_size(4)).unwrap();
    let url = format!("{}/release.bin", mock_server.uri());
    let result = downloader.download(&url, &dest).await;

    match result {
        Err(DownloadError::HttpStatus { status, .. }) => {
            assert_eq!(status, 503, "The failing range's status must surface");
        }
        other => panic!("Expected HttpStatus(503), got: {other:?}"),
    }
}

#[tokio::test]
async fn test_parallel_head_error_status_propagates() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("release.bin");

    Mock::given(method("HEAD"))
        .and(path("/release.bin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let downloader =
        ParallelDownloader::new(HttpClient::new(), FetchConfig::default()).unwrap();
    let url = format!("{}/release.bin", mock_server.uri());
    let result = downloader.download(&url, &dest).await;

    assert!(
        matches!(result, Err(DownloadError::HttpStatus { status: 404, .. })),
        "Expected HttpStatus(404), got: {result:?}"
    );
}

#[tokio::test]
async fn test_parallel_rejects_invalid_url() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("release.bin");

    let downloader =
        ParallelDownloader::new(HttpClient::new(), FetchConfig::default()).unwrap();
    let result = downloader.download("definitely-not-a-url", &dest).await;

    assert!(
        matches!(result, Err(DownloadError::InvalidUrl { .. })),
        "Expected InvalidUrl, got: {result:?}"
    );
}
