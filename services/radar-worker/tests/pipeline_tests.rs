//! Full station cycles: locate, decode, render, write artifacts.

mod common;

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{TimeZone, Utc};

use radar_common::{GeoExtent, RadarError, StationId};
use radar_worker::{RenderPipeline, RenderStatus, StationConfig, VolumePointer, WorkerConfig};
use renderer::WorldFile;
use storage::ArtifactStore;
use test_utils::{
    assert_approx_eq, reflectivity_cell, temp_output_dir, uniform_azimuths, uniform_wind_velocity,
};
use volume::JsonVolumeDecoder;

use common::{anchor_now, kffc, volume_bytes, MockSource};

const RAYS: usize = 36;
const GATES: usize = 40;

fn storm_volume() -> Bytes {
    volume_bytes(
        RAYS,
        GATES,
        &[
            ("reflectivity", reflectivity_cell(RAYS, GATES, 9, 20, 55.0)),
            (
                "velocity",
                uniform_wind_velocity(&uniform_azimuths(RAYS), GATES, 15.0, 45.0),
            ),
        ],
    )
}

fn worker_config(dir: &Path, history: usize) -> WorkerConfig {
    let yaml = format!(
        r#"
source:
  max_attempts: 1
  retry_delay_secs: 0
stations:
  - id: KFFC
    products: [reflectivity, velocity, differential_reflectivity]
render:
  width: 64
  height: 64
  extent:
    mode: radius
    radius_km: 45
output:
  directory: "{}"
  history: {}
"#,
        dir.display(),
        history
    );
    WorkerConfig::from_yaml(&yaml).unwrap()
}

fn pipeline(config: &WorkerConfig, source: Arc<MockSource>, store: ArtifactStore) -> RenderPipeline {
    RenderPipeline::from_config(config, source, Arc::new(JsonVolumeDecoder), store)
}

#[tokio::test]
async fn test_cycle_writes_overlay_set() {
    let dir = temp_output_dir();
    let config = worker_config(dir.path(), 5);
    let source = Arc::new(MockSource::empty().with_object("KFFC_20240501_2030", storm_volume()));
    let store = ArtifactStore::local(dir.path()).unwrap();
    let pipeline = pipeline(&config, source, store);

    let report = pipeline
        .run_cycle(&config.stations[0], anchor_now())
        .await
        .unwrap();
    assert_eq!(report.object_name, "KFFC_20240501_2030");
    assert_eq!(report.products.len(), 3);
    assert_eq!(report.rendered(), 2);
    assert_eq!(report.failed(), 0);

    let zdr = report
        .products
        .iter()
        .find(|p| p.product == "differential_reflectivity")
        .unwrap();
    let zdr = zdr.result.as_ref().unwrap();
    assert!(matches!(zdr.status, RenderStatus::NoUsableData(_)));
    assert_eq!(zdr.opaque_pixels, 0);

    // Pointer names the object, never carries the bytes
    let pointer: VolumePointer =
        serde_json::from_slice(&std::fs::read(dir.path().join("KFFC_latest.json")).unwrap())
            .unwrap();
    assert_eq!(pointer.object_name, "KFFC_20240501_2030");
    assert_eq!(pointer.station, kffc());

    // PNG decodes at the configured size with some echo drawn
    let png = std::fs::read(dir.path().join("KFFC_reflectivity.png")).unwrap();
    let image = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (64, 64));
    assert!(image.pixels().any(|p| p[3] != 0));

    // Blank products still get a transparent image with georeference
    let blank = std::fs::read(dir.path().join("KFFC_differential_reflectivity.png")).unwrap();
    let blank = image::load_from_memory(&blank).unwrap().to_rgba8();
    assert!(blank.pixels().all(|p| p[3] == 0));
    assert!(dir.path().join("KFFC_differential_reflectivity.pgw").exists());

    // Bounds and world file describe the same canvas
    let bounds: GeoExtent = serde_json::from_slice(
        &std::fs::read(dir.path().join("KFFC_reflectivity_bounds.json")).unwrap(),
    )
    .unwrap();
    assert!(bounds.contains(33.3636, -84.5658));
    let world = WorldFile::parse(
        &std::fs::read_to_string(dir.path().join("KFFC_reflectivity.pgw")).unwrap(),
    )
    .unwrap();
    let (west, north) = world.pixel_corner(0.0, 0.0, false);
    let (east, south) = world.pixel_corner(63.0, 63.0, true);
    assert_approx_eq!(west, bounds.west, 1e-9);
    assert_approx_eq!(north, bounds.north, 1e-9);
    assert_approx_eq!(east, bounds.east, 1e-9);
    assert_approx_eq!(south, bounds.south, 1e-9);

    assert!(dir
        .path()
        .join("history/KFFC_reflectivity_202405012030.png")
        .exists());
}

#[tokio::test]
async fn test_unknown_product_rejected_before_fetch() {
    let source = Arc::new(MockSource::empty().with_object("KFFC_20240501_2105", storm_volume()));
    let config = WorkerConfig::from_yaml("").unwrap();
    let pipeline = pipeline(&config, source.clone(), ArtifactStore::in_memory());

    let station = StationConfig::new(
        kffc(),
        vec!["reflectivity".to_string(), "echo_tops".to_string()],
    );
    let err = pipeline.run_cycle(&station, anchor_now()).await.unwrap_err();
    assert!(matches!(err, RadarError::UnsupportedProduct(ref p) if p == "echo_tops"));
    assert!(source.requests().is_empty());
    assert!(!pipeline.store().exists("KFFC_latest.json").await.unwrap());
}

#[tokio::test]
async fn test_undecodable_volume_fails_cycle() {
    let source = Arc::new(
        MockSource::empty().with_object("KFFC_20240501_2105", Bytes::from_static(b"\x00AR2V0006")),
    );
    let dir = temp_output_dir();
    let config = worker_config(dir.path(), 0);
    let pipeline = pipeline(&config, source, ArtifactStore::in_memory());

    let err = pipeline
        .run_cycle(&config.stations[0], anchor_now())
        .await
        .unwrap_err();
    assert!(matches!(err, RadarError::DecodeFailure(_)));
    // The locate succeeded, so the pointer was still recorded
    assert!(pipeline.store().exists("KFFC_latest.json").await.unwrap());
    assert!(!pipeline.store().exists("KFFC_reflectivity.png").await.unwrap());
}

#[tokio::test]
async fn test_history_keeps_newest_copies() {
    let dir = temp_output_dir();
    let config = worker_config(dir.path(), 2);
    let source = Arc::new(
        MockSource::empty()
            .with_object("KFFC_20240501_2030", storm_volume())
            .with_object("KFFC_20240501_2035", storm_volume())
            .with_object("KFFC_20240501_2040", storm_volume()),
    );
    let pipeline = pipeline(&config, source, ArtifactStore::in_memory());
    let station = StationConfig::new(kffc(), vec!["reflectivity".to_string()]);

    for minute in [32, 37, 42] {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 20, minute, 0).unwrap();
        pipeline.run_cycle(&station, now).await.unwrap();
    }

    let keys: Vec<String> = pipeline
        .store()
        .list(Some("history"))
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.key)
        .collect();
    assert_eq!(
        keys,
        vec![
            "history/KFFC_reflectivity_202405012035.png",
            "history/KFFC_reflectivity_202405012040.png",
        ]
    );
}

#[tokio::test]
async fn test_configured_location_frames_extent() {
    let dir = temp_output_dir();
    let config = worker_config(dir.path(), 0);
    let source = Arc::new(MockSource::empty().with_object("KFFC_20240501_2105", storm_volume()));
    let pipeline = pipeline(&config, source, ArtifactStore::in_memory());

    let mut station = StationConfig::new(StationId::parse("KFFC").unwrap(), vec!["reflectivity".into()]);
    station.latitude = Some(35.0);
    station.longitude = Some(-80.0);

    let report = pipeline.run_cycle(&station, anchor_now()).await.unwrap();
    let render = report.products[0].result.as_ref().unwrap();
    let bounds = render.georef.bounds;
    assert!(bounds.contains(35.0, -80.0));
    assert!(!bounds.contains(33.3636, -84.5658));
    assert_approx_eq!((bounds.north + bounds.south) / 2.0, 35.0, 0.01);
}

#[tokio::test]
async fn test_georeference_is_written_before_image() {
    let dir = temp_output_dir();
    let config = worker_config(dir.path(), 0);
    // A non-empty directory where the image belongs fails only the image write
    std::fs::create_dir_all(dir.path().join("KFFC_reflectivity.png").join("held")).unwrap();

    let source = Arc::new(MockSource::empty().with_object("KFFC_20240501_2105", storm_volume()));
    let pipeline = pipeline(&config, source, ArtifactStore::local(dir.path()).unwrap());
    let station = StationConfig::new(kffc(), vec!["reflectivity".to_string()]);

    let report = pipeline.run_cycle(&station, anchor_now()).await.unwrap();
    assert_eq!(report.failed(), 1);
    assert!(dir.path().join("KFFC_reflectivity_bounds.json").exists());
    assert!(dir.path().join("KFFC_reflectivity.pgw").exists());
    assert!(dir.path().join("KFFC_reflectivity.png").is_dir());
}

#[tokio::test]
async fn test_builtin_reflectivity_masks_echo_below_ramp() {
    // Every gate below -32 dBZ except a short 40 dBZ run due east
    let mut values = vec![-45.0_f32; RAYS * GATES];
    for gate in 19..23 {
        values[9 * GATES + gate] = 40.0;
    }
    let source = Arc::new(MockSource::empty().with_object(
        "KFFC_20240501_2105",
        volume_bytes(RAYS, GATES, &[("reflectivity", values)]),
    ));
    let dir = temp_output_dir();
    let config = worker_config(dir.path(), 0);
    let pipeline = pipeline(&config, source, ArtifactStore::in_memory());
    let station = StationConfig::new(kffc(), vec!["reflectivity".to_string()]);

    let report = pipeline.run_cycle(&station, anchor_now()).await.unwrap();
    let render = report.products[0].result.as_ref().unwrap();
    assert_eq!(render.status, RenderStatus::Rendered);
    assert!(render.opaque_pixels > 0);
    // A few gates' footprint, not the whole sweep
    assert!(render.opaque_pixels < 64 * 64 / 50);
}
