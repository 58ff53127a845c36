//! Georeference emitter: bounds record and world file for a rendered canvas.

use serde::{Deserialize, Serialize};

use radar_common::{GeoExtent, RadarError, RadarResult};

use crate::raster::Canvas;

/// Six-parameter affine transform from pixel to geographic coordinates.
///
/// Line order in the text form is `A, D, B, E, C, F`, where
/// `lon = A·x + B·y + C` and `lat = D·x + E·y + F` for pixel centers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldFile {
    /// Pixel width in degrees of longitude
    pub a: f64,
    /// Row rotation, always 0
    pub d: f64,
    /// Column rotation, always 0
    pub b: f64,
    /// Pixel height in degrees of latitude (negative)
    pub e: f64,
    /// Longitude of the center of the upper-left pixel
    pub c: f64,
    /// Latitude of the center of the upper-left pixel
    pub f: f64,
}

impl WorldFile {
    pub fn from_extent(extent: &GeoExtent, width: usize, height: usize) -> RadarResult<Self> {
        if width == 0 || height == 0 {
            return Err(RadarError::InvalidParameter {
                param: "size".to_string(),
                message: format!("world file needs a non-empty raster, got {}x{}", width, height),
            });
        }
        let a = (extent.east - extent.west) / width as f64;
        let e = (extent.south - extent.north) / height as f64;
        Ok(Self {
            a,
            d: 0.0,
            b: 0.0,
            e,
            c: extent.west + a / 2.0,
            f: extent.north + e / 2.0,
        })
    }

    /// (lon, lat) of the center of pixel (x, y).
    pub fn pixel_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }

    /// (lon, lat) of the outer corner of pixel (x, y): upper-left for
    /// (0, 0), lower-right for (width − 1, height − 1).
    pub fn pixel_corner(&self, x: f64, y: f64, lower_right: bool) -> (f64, f64) {
        let shift = if lower_right { 0.5 } else { -0.5 };
        self.pixel_to_geo(x + shift, y + shift)
    }

    /// Standard six-line world file text (`.pgw`).
    pub fn to_world_file_string(&self) -> String {
        format!(
            "{:.12}\n{:.12}\n{:.12}\n{:.12}\n{:.12}\n{:.12}\n",
            self.a, self.d, self.b, self.e, self.c, self.f
        )
    }

    pub fn parse(text: &str) -> RadarResult<Self> {
        let values = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| {
                l.parse::<f64>().map_err(|_| RadarError::InvalidParameter {
                    param: "world_file".to_string(),
                    message: format!("not a number: '{}'", l),
                })
            })
            .collect::<RadarResult<Vec<f64>>>()?;

        match values.as_slice() {
            &[a, d, b, e, c, f] => Ok(Self { a, d, b, e, c, f }),
            _ => Err(RadarError::InvalidParameter {
                param: "world_file".to_string(),
                message: format!("expected 6 lines, found {}", values.len()),
            }),
        }
    }
}

/// Everything a map client needs to place a rendered raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Georeference {
    pub bounds: GeoExtent,
    pub width: usize,
    pub height: usize,
    pub world_file: WorldFile,
}

impl Georeference {
    /// Georeference for the canvas a raster was rendered on.
    pub fn new(canvas: &Canvas) -> RadarResult<Self> {
        Ok(Self {
            bounds: canvas.extent,
            width: canvas.width,
            height: canvas.height,
            world_file: WorldFile::from_extent(&canvas.extent, canvas.width, canvas.height)?,
        })
    }

    /// The `{north, south, east, west}` bounds record as JSON.
    pub fn bounds_json(&self) -> RadarResult<Vec<u8>> {
        serde_json::to_vec_pretty(&self.bounds).map_err(|e| RadarError::RenderError(e.to_string()))
    }
}
