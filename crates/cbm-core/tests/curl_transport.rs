//! Integration test: curl transport against a local HTTP server, alone and
//! under the download manager.

mod common;

use std::sync::Arc;
use std::time::Duration;

use cbm_core::catalog::ResourceLocation;
use cbm_core::checksum::{sha256_path, IntegrityVerifier};
use cbm_core::downloader::DownloadManager;
use cbm_core::retry::{RetryPolicy, TransferError};
use cbm_core::transport::{temp_path, CurlOptions, CurlTransport, Transport};
use cbm_core::url_model::NamingRules;
use common::media_server::{self, Route};
use tempfile::tempdir;

fn body(len: usize) -> Vec<u8> {
    (0u8..251).cycle().take(len).collect()
}

fn transport() -> CurlTransport {
    CurlTransport::new(CurlOptions {
        connect_timeout: Duration::from_secs(5),
        timeout: Duration::from_secs(20),
        ..CurlOptions::default()
    })
}

#[test]
fn fetch_writes_file_and_removes_part() {
    let payload = body(48 * 1024);
    let server = media_server::start(vec![("audio/one.mp3", Route::Body(payload.clone()))]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("one.mp3");

    let n = transport()
        .fetch_to_file(&server.url("audio/one.mp3"), &dest)
        .expect("fetch");

    assert_eq!(n, payload.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), payload);
    assert!(!temp_path(&dest).exists());
}

#[test]
fn http_error_leaves_no_file() {
    let server = media_server::start(vec![("gone.mp3", Route::Status(404))]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("gone.mp3");

    let err = transport()
        .fetch_to_file(&server.url("gone.mp3"), &dest)
        .unwrap_err();

    assert!(matches!(err, TransferError::Http(404)), "got {err:?}");
    assert!(!dest.exists());
    assert!(!temp_path(&dest).exists());
}

#[test]
fn short_body_is_an_error() {
    let server = media_server::start(vec![(
        "short.mp3",
        Route::Truncated {
            announced: 10_000,
            body: body(1_000),
        },
    )]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("short.mp3");

    let err = transport()
        .fetch_to_file(&server.url("short.mp3"), &dest)
        .unwrap_err();

    assert!(
        matches!(err, TransferError::Curl(_) | TransferError::PartialTransfer { .. }),
        "got {err:?}"
    );
    assert!(!dest.exists());
}

#[test]
fn existing_destination_is_overwritten() {
    let server = media_server::start(vec![("a.mp3", Route::Body(b"fresh".to_vec()))]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.mp3");
    std::fs::write(&dest, b"stale partial content from a crashed run").unwrap();

    transport().fetch_to_file(&server.url("a.mp3"), &dest).unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"fresh");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn download_manager_over_curl() {
    let a = body(10_000);
    let b = body(20_000);
    let server = media_server::start(vec![
        ("c/track-a.m4a", Route::Body(a.clone())),
        ("c/track-b.m4a", Route::Body(b.clone())),
        ("c/unavailable.m4a", Route::Status(503)),
    ]);
    let dir = tempdir().unwrap();
    let dm = DownloadManager::new(
        Arc::new(transport()),
        2,
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(10),
        },
        NamingRules::new("mp3", 60),
        IntegrityVerifier::new(dir.path()),
    );
    let locations = vec![
        ResourceLocation::new(server.url("c/track-a.m4a")),
        ResourceLocation::with_stem(server.url("c/track-b.m4a"), "Track B"),
        ResourceLocation::new(server.url("c/unavailable.m4a")),
    ];

    let results = dm.fetch_all(&locations, dir.path()).await.unwrap();

    assert!(results[0].success);
    assert_eq!(results[0].destination, dir.path().join("track-a.mp3"));
    assert_eq!(std::fs::read(&results[0].destination).unwrap(), a);
    assert_eq!(
        results[1].checksum.as_deref().unwrap(),
        sha256_path(&dir.path().join("Track_B.mp3")).unwrap()
    );
    assert!(!results[2].success);
    assert!(results[2].throttled);
    assert_eq!(results[2].attempts, 2);
    // 2 good transfers + 2 attempts at the 503.
    assert_eq!(server.hits(), 4);
}
