//! Update detection against a mocked release service
//!
//! Tests cover:
//! - Version identification through the release history
//! - Update decisions for the latest release
//! - Error propagation for failing or malformed responses

mod common;

use common::*;
use mosic_core::RuntimeConfig;
use mosic_update::{AbortReason, ReleaseClient, UpdateDecision, UpdateError, UNKNOWN_VERSION};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn exe_path() -> &'static Path {
    Path::new("/opt/mosic/Mosic.exe")
}

#[tokio::test]
async fn test_current_version_tag_newest_match() {
    let server = MockServer::start().await;
    let url = download_url(&server, TAG_V2, WINDOWS_ASSET);
    mock_release_list(
        &server,
        vec![
            ReleaseJsonBuilder::new(TAG_V3)
                .asset_for(WINDOWS_ASSET, &url, b"v3")
                .build(),
            ReleaseJsonBuilder::new(TAG_V2)
                .asset_for(ZIP_ASSET, &url, PE_BINARY_V1)
                .asset_for(WINDOWS_ASSET, &url, PE_BINARY_V1)
                .build(),
            ReleaseJsonBuilder::new(TAG_V1)
                .asset_for(WINDOWS_ASSET, &url, PE_BINARY_V1)
                .build(),
        ],
    )
    .await;

    let detector = mock_detector(&server, exe_path(), PE_BINARY_V1, WINDOWS_EXTENSION);
    assert_eq!(detector.current_version_tag().await.unwrap(), TAG_V2);
}

#[tokio::test]
async fn test_current_version_tag_unknown_and_unsupported() {
    let server = MockServer::start().await;
    let url = download_url(&server, TAG_V1, WINDOWS_ASSET);
    let md5 = format!("md5:{}", "0".repeat(32));
    mock_release_list(
        &server,
        vec![
            ReleaseJsonBuilder::new(TAG_V2)
                .asset(WINDOWS_ASSET, &url, Some(&md5))
                .asset(LINUX_ASSET, &url, None)
                .build(),
            ReleaseJsonBuilder::new(TAG_V1)
                .asset_without_digest(WINDOWS_ASSET, &url)
                .build(),
        ],
    )
    .await;

    let detector = mock_detector(&server, exe_path(), PE_BINARY_V1, WINDOWS_EXTENSION);
    assert_eq!(detector.current_version_tag().await.unwrap(), UNKNOWN_VERSION);
}

#[tokio::test]
async fn test_check_update_available() {
    let server = MockServer::start().await;
    let url = download_url(&server, TAG_V2, WINDOWS_ASSET);
    mock_latest_release(
        &server,
        ReleaseJsonBuilder::new(TAG_V2)
            .asset_for(LINUX_ASSET, &download_url(&server, TAG_V2, LINUX_ASSET), ELF_BINARY_V2)
            .asset_for(WINDOWS_ASSET, &url, PE_BINARY_V2)
            .build(),
    )
    .await;

    let detector = mock_detector(&server, exe_path(), PE_BINARY_V1, WINDOWS_EXTENSION);
    match detector.check().await.unwrap() {
        UpdateDecision::UpdateAvailable(offer) => {
            assert_eq!(offer.release.tag_name, TAG_V2);
            assert_eq!(offer.asset.name, WINDOWS_ASSET);
            assert_eq!(offer.download_url, url);
        }
        other => panic!("Expected UpdateAvailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_check_no_update_with_uppercase_digest() {
    let server = MockServer::start().await;
    let digest = sha256_digest(PE_BINARY_V1).to_uppercase().replacen("SHA256", "sha256", 1);
    mock_latest_release(
        &server,
        ReleaseJsonBuilder::new(TAG_V1)
            .asset(WINDOWS_ASSET, &download_url(&server, TAG_V1, WINDOWS_ASSET), Some(&digest))
            .build(),
    )
    .await;

    let detector = mock_detector(&server, exe_path(), PE_BINARY_V1, WINDOWS_EXTENSION);
    assert_eq!(detector.check().await.unwrap(), UpdateDecision::NoUpdateNeeded);
}

#[tokio::test]
async fn test_check_unsupported_algorithm_aborts() {
    let server = MockServer::start().await;
    mock_latest_release(
        &server,
        ReleaseJsonBuilder::new(TAG_V2)
            .asset(
                WINDOWS_ASSET,
                &download_url(&server, TAG_V2, WINDOWS_ASSET),
                Some("md5:d41d8cd98f00b204e9800998ecf8427e"),
            )
            .build(),
    )
    .await;

    let detector = mock_detector(&server, exe_path(), PE_BINARY_V1, WINDOWS_EXTENSION);
    assert_eq!(
        detector.check().await.unwrap(),
        UpdateDecision::Aborted(AbortReason::UnsupportedAlgorithm {
            algorithm: "md5".to_string()
        })
    );
}

#[tokio::test]
async fn test_check_no_asset_for_platform() {
    let server = MockServer::start().await;
    mock_latest_release(
        &server,
        ReleaseJsonBuilder::new(TAG_V2)
            .asset_for(LINUX_ASSET, &download_url(&server, TAG_V2, LINUX_ASSET), ELF_BINARY_V2)
            .build(),
    )
    .await;

    let detector = mock_detector(&server, exe_path(), PE_BINARY_V1, WINDOWS_EXTENSION);
    assert!(matches!(
        detector.check().await.unwrap(),
        UpdateDecision::Aborted(AbortReason::NoMatchingAsset { .. })
    ));
}

#[tokio::test]
async fn test_check_server_error_propagates() {
    let server = MockServer::start().await;
    mock_release_failure(&server, 503).await;

    let detector = mock_detector(&server, exe_path(), PE_BINARY_V1, WINDOWS_EXTENSION);
    let err = detector.check().await.unwrap_err();
    assert!(matches!(err, UpdateError::Status { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_check_malformed_json_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/releases/latest", REPO_OWNER, REPO_NAME)))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
        .mount(&server)
        .await;

    let detector = mock_detector(&server, exe_path(), PE_BINARY_V1, WINDOWS_EXTENSION);
    let err = detector.check().await.unwrap_err();
    assert!(matches!(err, UpdateError::Parse { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_release_client_from_config() {
    let server = MockServer::start().await;
    mock_latest_release(&server, ReleaseJsonBuilder::new(TAG_V3).build()).await;

    let mut config = RuntimeConfig::default();
    config.releases.api_url = server.uri();
    config.releases.repo_owner = REPO_OWNER.to_string();
    config.releases.repo_name = REPO_NAME.to_string();

    let client = ReleaseClient::new(&config).unwrap();
    assert_eq!(client.base_url(), repo_base_url(&server));

    let latest = client.latest_release().await.unwrap();
    assert_eq!(latest.tag_name, TAG_V3);
    assert!(latest.assets.is_empty());
}
