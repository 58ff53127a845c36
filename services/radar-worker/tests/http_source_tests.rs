//! `HttpVolumeSource` against a minimal HTTP responder on localhost.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use radar_common::{RadarError, StationId};
use radar_worker::{HttpVolumeSource, LocatorConfig, VolumeLocator, VolumeSource};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve `body` for `path` and 404 for anything else, one request per connection.
async fn serve(path: &'static str, body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let mut read = 0;
                while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                }
                let request = String::from_utf8_lossy(&buf[..read]);
                let requested = request.split_whitespace().nth(1).unwrap_or("");

                let (status, payload): (&str, &[u8]) = if requested == path {
                    ("200 OK", body)
                } else {
                    ("404 Not Found", b"")
                };
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    payload.len()
                );
                socket.write_all(head.as_bytes()).await.ok();
                socket.write_all(payload).await.ok();
                socket.shutdown().await.ok();
            });
        }
    });

    format!("http://{}/level2/raw", addr)
}

#[tokio::test]
async fn test_fetch_published_object() {
    let base = serve("/level2/raw/KFFC/KFFC_20240501_2030", b"volume-bytes").await;
    let source = HttpVolumeSource::new(base, Duration::from_secs(5)).unwrap();
    let station = StationId::parse("kffc").unwrap();

    let bytes = source.fetch(&station, "KFFC_20240501_2030").await.unwrap();
    assert_eq!(bytes.as_deref(), Some(&b"volume-bytes"[..]));
}

#[tokio::test]
async fn test_missing_object_is_none() {
    let base = serve("/level2/raw/KFFC/KFFC_20240501_2030", b"volume-bytes").await;
    let source = HttpVolumeSource::new(base, Duration::from_secs(5)).unwrap();
    let station = StationId::parse("KFFC").unwrap();

    let result = source.fetch(&station, "KFFC_20240501_2035").await;
    tokio_test::assert_ok!(&result);
    assert!(result.unwrap().is_none());
}

/// Accept connections and hold them open without ever answering.
async fn serve_silently() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://{}/level2/raw", addr)
}

#[tokio::test]
async fn test_connection_refused_is_request_error() {
    let source = HttpVolumeSource::new("http://127.0.0.1:1/raw", Duration::from_secs(2)).unwrap();
    let station = StationId::parse("KFFC").unwrap();

    let err = source.fetch(&station, "KFFC_20240501_2030").await.unwrap_err();
    match err {
        RadarError::SourceRequest { object, .. } => assert_eq!(object, "KFFC_20240501_2030"),
        other => panic!("expected SourceRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unresponsive_server_times_out_each_probe() {
    let base = serve_silently().await;
    let source = Arc::new(HttpVolumeSource::new(base, Duration::from_secs(1)).unwrap());
    let locator = VolumeLocator::new(
        source,
        LocatorConfig {
            granularity_minutes: 5,
            step_minutes: 5,
            max_candidates: 3,
            max_attempts: 1,
            retry_delay: Duration::from_secs(30),
        },
    );
    let station = StationId::parse("KFFC").unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 21, 7, 42).unwrap();

    let started = std::time::Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(6), locator.locate(&station, now))
        .await
        .expect("each probe should give up after its own timeout");
    assert!(matches!(
        result,
        Err(RadarError::SourceUnavailable {
            attempts: 1,
            candidates: 3,
            ..
        })
    ));
    // Three one-second timeouts
    assert!(started.elapsed() >= Duration::from_secs(3));
}
