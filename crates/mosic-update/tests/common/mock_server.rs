//! Mock release service helpers
//!
//! Mounts the repository endpoints under `/repos/{owner}/{name}/` the way
//! the real release service lays them out.

use mosic_update::{Downloader, InstalledBinary, ReleaseClient, UpdateDetector};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::constants::*;

/// Repository base URL on the mock server
pub fn repo_base_url(server: &MockServer) -> String {
    format!("{}/repos/{}/{}/", server.uri(), REPO_OWNER, REPO_NAME)
}

/// Download URL for an asset on the mock server
pub fn download_url(server: &MockServer, tag: &str, asset: &str) -> String {
    format!("{}/download/{}/{}", server.uri(), tag, asset)
}

fn repo_path(endpoint: &str) -> String {
    format!("/repos/{}/{}/{}", REPO_OWNER, REPO_NAME, endpoint)
}

/// Serve the latest release
pub async fn mock_latest_release(server: &MockServer, release: Value) {
    Mock::given(method("GET"))
        .and(path(repo_path("releases/latest")))
        .respond_with(ResponseTemplate::new(200).set_body_json(release))
        .mount(server)
        .await;
}

/// Serve the release list, newest first
pub async fn mock_release_list(server: &MockServer, releases: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(repo_path("releases")))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(releases)))
        .mount(server)
        .await;
}

/// Fail every release endpoint with `status`
pub async fn mock_release_failure(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(repo_path("releases/latest")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serve an asset download, expecting exactly `times` requests
pub async fn mock_asset_download(
    server: &MockServer,
    tag: &str,
    asset: &str,
    content: &[u8],
    times: u64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{}/{}", tag, asset)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .expect(times)
        .mount(server)
        .await;
}

/// Release client pointed at the mock server
pub fn mock_release_client(server: &MockServer) -> ReleaseClient {
    ReleaseClient::with_client(reqwest::Client::new(), repo_base_url(server))
}

/// Downloader with a plain client
pub fn mock_downloader() -> Downloader {
    Downloader::with_client(reqwest::Client::new())
}

/// Detector for a binary with the given content, matching `extension`
pub fn mock_detector(
    server: &MockServer,
    binary_path: &std::path::Path,
    content: &[u8],
    extension: &str,
) -> UpdateDetector {
    let binary = InstalledBinary::new(binary_path, mosic_update::digest::sha256_hex(content));
    UpdateDetector::new(mock_release_client(server), binary, extension)
}
