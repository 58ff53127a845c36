//! Field rasterizer: a masked sweep field onto a fixed geographic canvas.
//!
//! Rendering works backwards from the output. Each pixel center is converted
//! to a geographic point, located in the sweep with a [`GateLocator`], and
//! coloured from the masked value of that gate. Pixels that fall between
//! rays, beyond the last gate, or on an excluded gate stay transparent.
//!
//! The canvas extent is fixed before rendering and never adjusted to the data,
//! so the georeference computed from the same [`Canvas`] is exact.

use rayon::prelude::*;
use tracing::debug;

use projection::{CoordinateTransform, GateLocator};
use radar_common::{GeoExtent, RadarError, RadarResult};
use sweep_processor::MaskedField;
use volume::Sweep;

use crate::colormap::{Color, ColorRamp};
use crate::png::create_png_auto;

/// Output raster size and the geographic extent it covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub extent: GeoExtent,
    pub width: usize,
    pub height: usize,
}

impl Canvas {
    pub fn new(extent: GeoExtent, width: usize, height: usize) -> RadarResult<Self> {
        if width == 0 || height == 0 {
            return Err(RadarError::InvalidParameter {
                param: "size".to_string(),
                message: format!("canvas must be at least 1x1, got {}x{}", width, height),
            });
        }
        Ok(Self {
            extent,
            width,
            height,
        })
    }

    /// Degrees of longitude per pixel.
    pub fn pixel_width(&self) -> f64 {
        self.extent.width() / self.width as f64
    }

    /// Degrees of latitude per pixel.
    pub fn pixel_height(&self) -> f64 {
        self.extent.height() / self.height as f64
    }

    /// Geographic (lat, lon) of the center of pixel (x, y); row 0 is north.
    pub fn pixel_center(&self, x: usize, y: usize) -> (f64, f64) {
        let lon = self.extent.west + (x as f64 + 0.5) * self.pixel_width();
        let lat = self.extent.north - (y as f64 + 0.5) * self.pixel_height();
        (lat, lon)
    }
}

/// RGBA pixels, row-major from the north-west corner.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// A fully transparent image.
    pub fn transparent(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        let p = &self.pixels[i..i + 4];
        Some(Color::new(p[0], p[1], p[2], p[3]))
    }

    /// Number of pixels with non-zero alpha.
    pub fn opaque_count(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[3] != 0).count()
    }

    pub fn is_blank(&self) -> bool {
        self.opaque_count() == 0
    }

    pub fn to_png(&self) -> RadarResult<Vec<u8>> {
        create_png_auto(&self.pixels, self.width, self.height).map_err(RadarError::RenderError)
    }
}

/// Render `field` (a field of `sweep` with its gate mask) onto `canvas`.
pub fn rasterize_sweep(
    sweep: &Sweep,
    field: &MaskedField<'_>,
    transform: CoordinateTransform,
    ramp: &ColorRamp,
    canvas: &Canvas,
) -> RadarResult<RasterImage> {
    if field.shape() != (sweep.ray_count(), sweep.gate_count()) {
        return Err(RadarError::RenderError(format!(
            "field shape {:?} does not match sweep {:?}",
            field.shape(),
            (sweep.ray_count(), sweep.gate_count())
        )));
    }

    let mut image = RasterImage::transparent(canvas.width, canvas.height);
    if field.is_empty() {
        debug!("All gates masked, rendering blank raster");
        return Ok(image);
    }

    let locator = GateLocator::new(sweep, transform);
    let row_bytes = canvas.width * 4;

    image
        .pixels
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let (lat, lon) = canvas.pixel_center(x, y);
                let color = locator
                    .locate(lat, lon)
                    .and_then(|(ray, gate)| field.value(ray, gate))
                    .map(|v| ramp.color_at(v))
                    .unwrap_or_else(Color::transparent);
                px.copy_from_slice(&color.to_array());
            }
        });

    debug!(
        width = canvas.width,
        height = canvas.height,
        opaque = image.opaque_count(),
        "Sweep rasterized"
    );
    Ok(image)
}
