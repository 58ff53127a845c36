//! The render pipeline: one located volume in, one artifact set per product out.
//!
//! ```text
//! locate ─► pointer ─► decode ─► [per product]
//!                                  storm-relative (optional)
//!                                  GateFilter ─► MaskedField
//!                                  extent ─► Canvas ─► rasterize ─► PNG
//!                                  Georeference ─► bounds JSON + world file
//! ```
//!
//! The canvas extent comes from the render settings alone (fixed box, radius
//! around the station, or full sweep coverage) and never from the gates that
//! survive filtering, so the world file always describes the PNG exactly.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{debug, error, info, instrument, warn};

use projection::{CoordinateTransform, GeoGrid};
use radar_common::{
    GeoExtent, ProductConfig, ProductTable, RadarError, RadarResult, ScanTime, Station, StationId,
};
use renderer::{rasterize_sweep, Canvas, ColorRamp, Georeference, RasterImage};
use storage::{
    artifact_key, history_key, history_name_prefix, keys::HISTORY_PREFIX, pointer_key,
    ArtifactKind, ArtifactStore,
};
use sweep_processor::{storm_relative, GateFilter, MaskedField};
use volume::{Volume, VolumeDecoder};

use crate::config::{ExtentMode, RenderConfig, StationConfig, WorkerConfig};
use crate::locator::{VolumeLocator, VolumeSource};

/// How a product render ended, short of a fatal error.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderStatus {
    Rendered,
    /// The field was absent or every gate was masked; a transparent image
    /// with a valid georeference was written instead.
    NoUsableData(String),
}

impl RenderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RenderStatus::Rendered => "rendered",
            RenderStatus::NoUsableData(_) => "no_usable_data",
        }
    }
}

/// A rasterized sweep and the canvas it was drawn on.
#[derive(Debug, Clone)]
pub struct RenderedSweep {
    pub image: RasterImage,
    pub canvas: Canvas,
    pub status: RenderStatus,
}

/// What [`RenderPipeline::render_product`] wrote.
#[derive(Debug, Clone)]
pub struct ProductRender {
    pub product: String,
    pub status: RenderStatus,
    pub georef: Georeference,
    pub image_key: String,
    pub opaque_pixels: usize,
}

#[derive(Debug)]
pub struct ProductOutcome {
    pub product: String,
    pub result: RadarResult<ProductRender>,
}

/// Summary of one station cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub station: StationId,
    pub object_name: String,
    pub scan_time: ScanTime,
    pub products: Vec<ProductOutcome>,
}

impl CycleReport {
    pub fn rendered(&self) -> usize {
        self.products
            .iter()
            .filter(|p| matches!(p.result, Ok(ref r) if r.status == RenderStatus::Rendered))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.products.iter().filter(|p| p.result.is_err()).count()
    }
}

pub struct RenderPipeline {
    locator: VolumeLocator,
    decoder: Arc<dyn VolumeDecoder>,
    store: ArtifactStore,
    products: ProductTable,
    render: RenderConfig,
    history: usize,
}

impl RenderPipeline {
    /// Pipeline with the built-in products, default render settings and no history.
    pub fn new(locator: VolumeLocator, decoder: Arc<dyn VolumeDecoder>, store: ArtifactStore) -> Self {
        Self {
            locator,
            decoder,
            store,
            products: ProductTable::builtin(),
            render: RenderConfig::default(),
            history: 0,
        }
    }

    pub fn from_config(
        config: &WorkerConfig,
        source: Arc<dyn VolumeSource>,
        decoder: Arc<dyn VolumeDecoder>,
        store: ArtifactStore,
    ) -> Self {
        let locator = VolumeLocator::new(source, config.source.locator());
        Self::new(locator, decoder, store)
            .with_products(config.product_table())
            .with_render(config.render)
            .with_history(config.output.history)
    }

    pub fn with_products(mut self, products: ProductTable) -> Self {
        self.products = products;
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    pub fn with_history(mut self, history: usize) -> Self {
        self.history = history;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn products(&self) -> &ProductTable {
        &self.products
    }

    fn transform(&self, station: &Station) -> CoordinateTransform {
        CoordinateTransform::new(station)
            .with_beam(self.render.beam.into())
            .with_geo(self.render.projection.into())
    }

    /// The geographic extent every product of `volume` is drawn on.
    fn render_extent(&self, volume: &Volume, transform: &CoordinateTransform) -> RadarResult<GeoExtent> {
        match self.render.extent {
            ExtentMode::Fixed {
                west,
                south,
                east,
                north,
            } => GeoExtent::new(west, south, east, north).map_err(|e| {
                RadarError::InvalidParameter {
                    param: "render.extent".to_string(),
                    message: e.to_string(),
                }
            }),
            ExtentMode::Radius { radius_km } => transform.extent_for_radius(radius_km * 1000.0),
            ExtentMode::Coverage => {
                // A missing tilt still gets a georeferenced blank image,
                // framed by the lowest sweep
                let sweep = volume
                    .sweep(self.render.sweep)
                    .or_else(|_| volume.sweep(0))?;
                GeoGrid::compute(sweep, transform).extent()
            }
        }
    }

    /// Filter and rasterize one product of `volume`. No I/O.
    ///
    /// A missing sweep or field, or a fully masked field, is reported through
    /// [`RenderStatus::NoUsableData`] with a transparent image on the same canvas.
    pub fn render_sweep(&self, volume: &Volume, product: &ProductConfig) -> RadarResult<RenderedSweep> {
        let transform = self.transform(&volume.station);
        let extent = self.render_extent(volume, &transform)?;
        let canvas = Canvas::new(extent, self.render.width, self.render.height)?;
        let ramp = ColorRamp::for_ramp(product.ramp, product.vmin, product.vmax).ok_or_else(|| {
            RadarError::RenderError(format!(
                "invalid display range [{}, {}] for {}",
                product.vmin, product.vmax, product.name
            ))
        })?;

        match self.draw(volume, product, transform, &ramp, &canvas) {
            Ok(image) => Ok(RenderedSweep {
                image,
                canvas,
                status: RenderStatus::Rendered,
            }),
            Err(RadarError::NoUsableData(reason)) => {
                debug!(product = %product.name, reason = %reason, "Rendering blank overlay");
                Ok(RenderedSweep {
                    image: RasterImage::transparent(canvas.width, canvas.height),
                    canvas,
                    status: RenderStatus::NoUsableData(reason),
                })
            }
            Err(e) => Err(e),
        }
    }

    fn draw(
        &self,
        volume: &Volume,
        product: &ProductConfig,
        transform: CoordinateTransform,
        ramp: &ColorRamp,
        canvas: &Canvas,
    ) -> RadarResult<RasterImage> {
        let sweep = volume.sweep(self.render.sweep)?;
        let raw = sweep.require_field(&product.field)?;

        let corrected;
        let field = match product.storm_motion {
            Some(motion) => {
                corrected = storm_relative(raw, sweep.azimuths(), motion)?;
                &corrected
            }
            None => raw,
        };

        let mask = GateFilter::for_product(&product.filter).apply(sweep, field);
        if mask.all_excluded() {
            return Err(RadarError::NoUsableData(format!(
                "every gate of '{}' is masked",
                product.field
            )));
        }
        debug!(
            product = %product.name,
            excluded = mask.excluded_count(),
            "Gate mask built"
        );

        let masked = MaskedField::new(field, &mask)
            .ok_or_else(|| RadarError::RenderError("mask does not match field".to_string()))?;
        rasterize_sweep(sweep, &masked, transform, ramp, canvas)
    }

    /// Render one product and write its PNG, bounds and world file.
    ///
    /// Artifacts are written image first; each put replaces the previous
    /// object whole.
    #[instrument(skip(self, station, volume, scan_time), fields(station = %station))]
    pub async fn render_product(
        &self,
        station: &StationId,
        volume: &Volume,
        product: &str,
        scan_time: ScanTime,
    ) -> RadarResult<ProductRender> {
        let result = self.render_and_store(station, volume, product, scan_time).await;
        let status = match &result {
            Ok(render) => render.status.label(),
            Err(e) => e.kind(),
        };
        counter!("radar_renders_total", "product" => product.to_string(), "status" => status)
            .increment(1);
        result
    }

    async fn render_and_store(
        &self,
        station: &StationId,
        volume: &Volume,
        name: &str,
        scan_time: ScanTime,
    ) -> RadarResult<ProductRender> {
        let product = self.products.get(name)?;
        let rendered = self.render_sweep(volume, product)?;
        let georef = Georeference::new(&rendered.canvas)?;
        let png = Bytes::from(rendered.image.to_png()?);

        // Sidecars first: a new image is never visible without its georeference
        self.store
            .put(
                &artifact_key(station, name, ArtifactKind::Bounds),
                georef.bounds_json()?,
            )
            .await?;
        self.store
            .put(
                &artifact_key(station, name, ArtifactKind::WorldFile),
                georef.world_file.to_world_file_string(),
            )
            .await?;
        let image_key = artifact_key(station, name, ArtifactKind::Image);
        self.store.put(&image_key, png.clone()).await?;

        if self.history > 0 {
            self.store
                .put(&history_key(station, name, &scan_time), png)
                .await?;
            self.store
                .prune(
                    HISTORY_PREFIX,
                    &history_name_prefix(station, name),
                    self.history,
                )
                .await?;
        }

        let opaque_pixels = rendered.image.opaque_count();
        info!(
            product = %name,
            status = rendered.status.label(),
            opaque_pixels,
            key = %image_key,
            "Wrote overlay"
        );
        Ok(ProductRender {
            product: name.to_string(),
            status: rendered.status,
            georef,
            image_key,
            opaque_pixels,
        })
    }

    /// Locate, decode and render every product configured for `station`.
    ///
    /// Unknown products fail the cycle before anything is fetched. After
    /// decoding, each product succeeds or fails on its own.
    #[instrument(skip(self, station), fields(station = %station.id))]
    pub async fn run_cycle(&self, station: &StationConfig, now: DateTime<Utc>) -> RadarResult<CycleReport> {
        for product in &station.products {
            self.products.get(product)?;
        }

        let located = self.locator.locate(&station.id, now).await?;
        self.store
            .put_json(&pointer_key(&station.id), &located.pointer(now))
            .await?;

        let mut volume = self.decoder.decode(&located.bytes)?;
        if volume.station.id != station.id {
            warn!(
                decoded = %volume.station.id,
                object = %located.object_name,
                "Volume reports a different station"
            );
        }
        if let Some((latitude, longitude)) = station.location() {
            let altitude = volume.station.altitude_m;
            volume.station = Station::new(station.id.clone(), latitude, longitude)?
                .with_altitude(altitude);
        }

        let mut products = Vec::with_capacity(station.products.len());
        for product in &station.products {
            let result = self
                .render_product(&station.id, &volume, product, located.scan_time)
                .await;
            if let Err(e) = &result {
                error!(product = %product, error = %e, "Product render failed");
            }
            products.push(ProductOutcome {
                product: product.clone(),
                result,
            });
        }

        Ok(CycleReport {
            station: station.id.clone(),
            object_name: located.object_name,
            scan_time: located.scan_time,
            products,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::LocatorConfig;
    use async_trait::async_trait;
    use radar_common::ColorRampId;
    use volume::{FieldData, JsonVolumeDecoder, Sweep};

    struct NoSource;

    #[async_trait]
    impl VolumeSource for NoSource {
        async fn fetch(&self, _: &StationId, _: &str) -> RadarResult<Option<Bytes>> {
            Ok(None)
        }
    }

    fn pipeline(render: RenderConfig) -> RenderPipeline {
        let locator = VolumeLocator::new(Arc::new(NoSource), LocatorConfig::default());
        RenderPipeline::new(locator, Arc::new(JsonVolumeDecoder), ArtifactStore::in_memory())
            .with_render(render)
    }

    fn small_render(extent: ExtentMode) -> RenderConfig {
        RenderConfig {
            width: 32,
            height: 32,
            extent,
            ..RenderConfig::default()
        }
    }

    fn volume() -> Volume {
        let station = Station::new(StationId::parse("KFFC").unwrap(), 33.3636, -84.5658).unwrap();
        let azimuths: Vec<f32> = (0..36).map(|i| i as f32 * 10.0).collect();
        let ranges: Vec<f32> = (0..40).map(|g| 1000.0 + g as f32 * 1000.0).collect();
        let sweep = Sweep::new(0.5, azimuths, ranges)
            .with_field("reflectivity", FieldData::filled(36, 40, 35.0))
            .with_field("velocity", FieldData::filled(36, 40, 0.0));
        Volume::new(station, vec![sweep])
    }

    #[test]
    fn test_render_sweep_draws_field() {
        let p = pipeline(small_render(ExtentMode::Radius { radius_km: 50.0 }));
        let product = ProductTable::builtin().get("reflectivity").unwrap().clone();
        let rendered = p.render_sweep(&volume(), &product).unwrap();
        assert_eq!(rendered.status, RenderStatus::Rendered);
        assert!(rendered.image.opaque_count() > 0);
        assert_eq!((rendered.canvas.width, rendered.canvas.height), (32, 32));
    }

    #[test]
    fn test_builtin_reflectivity_leaves_weak_ray_transparent() {
        // North ray entirely below the ramp floor, south ray one 40 dBZ gate
        let station = Station::new(StationId::parse("KFFC").unwrap(), 33.3636, -84.5658).unwrap();
        let gates = 20;
        let mut values = vec![-40.0; gates];
        values.extend(std::iter::repeat(f32::NAN).take(gates));
        values[gates + 10] = 40.0;
        let ranges: Vec<f32> = (0..gates).map(|g| 500.0 + g as f32 * 1000.0).collect();
        let sweep = Sweep::new(0.5, vec![0.0, 180.0], ranges)
            .with_field("reflectivity", FieldData::new(2, gates, values).unwrap());
        let volume = Volume::new(station, vec![sweep]);

        let p = pipeline(small_render(ExtentMode::Fixed {
            west: -84.8658,
            south: 33.1136,
            east: -84.2658,
            north: 33.6136,
        }));
        let product = ProductTable::builtin().get("reflectivity").unwrap().clone();
        let rendered = p.render_sweep(&volume, &product).unwrap();
        assert_eq!(rendered.status, RenderStatus::Rendered);

        let image = &rendered.image;
        let north = (0..image.height() / 2)
            .flat_map(|y| (0..image.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| !image.pixel(x, y).unwrap().is_transparent())
            .count();
        assert_eq!(north, 0);
        assert!(image.opaque_count() > 0);
    }

    #[test]
    fn test_missing_field_is_blank_not_error() {
        let p = pipeline(small_render(ExtentMode::Radius { radius_km: 50.0 }));
        let product = ProductTable::builtin()
            .get("differential_reflectivity")
            .unwrap()
            .clone();
        let rendered = p.render_sweep(&volume(), &product).unwrap();
        assert!(matches!(rendered.status, RenderStatus::NoUsableData(_)));
        assert!(rendered.image.is_blank());
    }

    #[test]
    fn test_fully_masked_is_blank() {
        let p = pipeline(small_render(ExtentMode::Radius { radius_km: 50.0 }));
        let product = ProductConfig::new(
            "strong_echo",
            "reflectivity",
            -32.0,
            64.0,
            ColorRampId::NwsReflectivity,
            "Strong echo",
        )
        .with_floor(50.0);
        let rendered = p.render_sweep(&volume(), &product).unwrap();
        assert!(matches!(rendered.status, RenderStatus::NoUsableData(_)));
        assert!(rendered.image.is_blank());
    }

    #[test]
    fn test_storm_motion_changes_velocity_colors() {
        let p = pipeline(small_render(ExtentMode::Radius { radius_km: 50.0 }));
        let table = ProductTable::builtin();
        let raw = p
            .render_sweep(&volume(), table.get("velocity").unwrap())
            .unwrap();
        let relative = p
            .render_sweep(&volume(), table.get("storm_relative_velocity").unwrap())
            .unwrap();
        assert_eq!(raw.canvas, relative.canvas);
        assert_ne!(raw.image, relative.image);
    }

    #[test]
    fn test_extent_ignores_mask() {
        let p = pipeline(small_render(ExtentMode::Coverage));
        let table = ProductTable::builtin();
        let drawn = p.render_sweep(&volume(), table.get("reflectivity").unwrap()).unwrap();
        let blank = p
            .render_sweep(&volume(), table.get("cross_correlation_ratio").unwrap())
            .unwrap();
        assert_eq!(drawn.canvas, blank.canvas);
    }

    #[test]
    fn test_fixed_extent_is_used_verbatim() {
        let p = pipeline(small_render(ExtentMode::Fixed {
            west: -85.0,
            south: 33.0,
            east: -84.0,
            north: 34.0,
        }));
        let product = ProductTable::builtin().get("reflectivity").unwrap().clone();
        let rendered = p.render_sweep(&volume(), &product).unwrap();
        assert_eq!(
            rendered.canvas.extent,
            GeoExtent::new(-85.0, 33.0, -84.0, 34.0).unwrap()
        );
    }

    #[test]
    fn test_report_counts() {
        let report = CycleReport {
            station: StationId::parse("KFFC").unwrap(),
            object_name: "KFFC_20240501_2105".to_string(),
            scan_time: ScanTime::new(Utc::now()),
            products: vec![ProductOutcome {
                product: "velocity".to_string(),
                result: Err(RadarError::RenderError("boom".to_string())),
            }],
        };
        assert_eq!(report.rendered(), 0);
        assert_eq!(report.failed(), 1);
    }
}
