//! Volume locator against an in-process source.

mod common;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use radar_common::RadarError;
use radar_worker::{HttpVolumeSource, LocatorConfig, VolumeLocator};

use common::{anchor_now, kffc, MockSource};

fn config(max_candidates: usize, max_attempts: u32) -> LocatorConfig {
    LocatorConfig {
        granularity_minutes: 5,
        step_minutes: 5,
        max_candidates,
        max_attempts,
        retry_delay: Duration::from_secs(30),
    }
}

#[tokio::test]
async fn test_finds_volume_on_eighth_candidate_and_stops() {
    // Anchor 21:05; only T-35 (20:30) is published
    let source = Arc::new(
        MockSource::empty().with_object("KFFC_20240501_2030", Bytes::from_static(b"vol")),
    );
    let locator = VolumeLocator::new(source.clone(), config(12, 3));

    let found = locator.locate(&kffc(), anchor_now()).await.unwrap();
    assert_eq!(found.object_name, "KFFC_20240501_2030");
    assert_eq!(found.attempt, 1);
    assert_eq!(found.bytes.as_ref(), b"vol");

    let requests = source.requests();
    assert_eq!(requests.len(), 8);
    assert_eq!(requests[0], "KFFC_20240501_2105");
    assert_eq!(requests[7], "KFFC_20240501_2030");
    // Nothing older than the hit was asked for
    assert!(requests.iter().all(|n| n.as_str() >= "KFFC_20240501_2030"));
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_uses_full_retry_budget() {
    let source = Arc::new(MockSource::empty());
    let locator = VolumeLocator::new(source.clone(), config(10, 3));

    let started = tokio::time::Instant::now();
    let err = locator.locate(&kffc(), anchor_now()).await.unwrap_err();
    match err {
        RadarError::SourceUnavailable {
            station,
            attempts,
            candidates,
        } => {
            assert_eq!(station, "KFFC");
            assert_eq!(attempts, 3);
            assert_eq!(candidates, 10);
        }
        other => panic!("expected SourceUnavailable, got {other:?}"),
    }

    // Every attempt walked every candidate; two sleeps between three attempts
    assert_eq!(source.requests().len(), 30);
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(60) && waited < Duration::from_secs(61));
}

#[tokio::test(start_paused = true)]
async fn test_probe_errors_are_treated_as_missing() {
    let source = Arc::new(
        MockSource::empty()
            .with_failure("KFFC_20240501_2105")
            .with_failure("KFFC_20240501_2100")
            .with_object("KFFC_20240501_2055", Bytes::from_static(b"vol")),
    );
    let locator = VolumeLocator::new(source.clone(), config(12, 1));

    let found = locator.locate(&kffc(), anchor_now()).await.unwrap();
    assert_eq!(found.object_name, "KFFC_20240501_2055");
    assert_eq!(source.requests().len(), 3);
}

#[tokio::test]
async fn test_single_attempt_does_not_sleep() {
    let source = Arc::new(MockSource::empty());
    let mut cfg = config(4, 1);
    cfg.retry_delay = Duration::from_secs(3600);
    let locator = VolumeLocator::new(source.clone(), cfg);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        locator.locate(&kffc(), anchor_now()),
    )
    .await
    .expect("locate should not wait after the last attempt");
    assert!(result.is_err());
    assert_eq!(source.requests().len(), 4);
}

#[tokio::test]
async fn test_unreachable_http_source_is_source_unavailable() {
    // Nothing listens on port 1; every probe fails to connect
    let source = Arc::new(HttpVolumeSource::new("http://127.0.0.1:1/raw", Duration::from_secs(2)).unwrap());
    let mut cfg = config(2, 2);
    cfg.retry_delay = Duration::ZERO;
    let locator = VolumeLocator::new(source, cfg);

    let err = locator.locate(&kffc(), anchor_now()).await.unwrap_err();
    assert!(matches!(
        err,
        RadarError::SourceUnavailable {
            attempts: 2,
            candidates: 2,
            ..
        }
    ));
}
