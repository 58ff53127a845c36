//! Worker configuration loaded from YAML.
//!
//! Every section has defaults, so an empty file (or no file at all) yields a
//! worker that renders KFFC reflectivity every two minutes into `./output`.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use projection::{BeamModel, GeoModel};
use radar_common::{
    GeoExtent, ProductConfig, ProductTable, RadarError, RadarResult, StationId,
};
use storage::S3Config;

use crate::locator::LocatorConfig;

/// Root of the worker YAML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default = "default_stations")]
    pub stations: Vec<StationConfig>,
    #[serde(default)]
    pub render: RenderConfig,
    /// Additions to, or replacements of, the built-in product table
    #[serde(default)]
    pub products: BTreeMap<String, ProductConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Remote volume source and locator budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Publication granularity the anchor is floored to, minutes
    #[serde(default = "default_granularity")]
    pub granularity_minutes: u32,
    /// Spacing between candidate timestamps, minutes
    #[serde(default = "default_step")]
    pub step_minutes: u32,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://mesonet-nexrad.agron.iastate.edu/level2/raw".to_string()
}

fn default_granularity() -> u32 {
    5
}

fn default_step() -> u32 {
    5
}

fn default_max_candidates() -> usize {
    12
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            granularity_minutes: default_granularity(),
            step_minutes: default_step(),
            max_candidates: default_max_candidates(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl SourceConfig {
    pub fn locator(&self) -> LocatorConfig {
        LocatorConfig {
            granularity_minutes: self.granularity_minutes,
            step_minutes: self.step_minutes,
            max_candidates: self.max_candidates,
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// One radar site and the products rendered for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    pub id: StationId,
    /// Site location; when both are set they replace the decoded location
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_products")]
    pub products: Vec<String>,
}

impl StationConfig {
    pub fn new(id: StationId, products: Vec<String>) -> Self {
        Self {
            id,
            latitude: None,
            longitude: None,
            products,
        }
    }

    /// Configured (latitude, longitude), if both are present.
    pub fn location(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

fn default_products() -> Vec<String> {
    vec!["reflectivity".to_string()]
}

fn default_stations() -> Vec<StationConfig> {
    match StationId::parse("KFFC") {
        Ok(id) => vec![StationConfig {
            id,
            latitude: Some(33.3636),
            longitude: Some(-84.5658),
            products: default_products(),
        }],
        Err(_) => Vec::new(),
    }
}

/// How the render extent is chosen. Always decided before rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExtentMode {
    /// Explicit bounds in degrees
    Fixed {
        west: f64,
        south: f64,
        east: f64,
        north: f64,
    },
    /// Box enclosing a circle of `radius_km` around the station
    Radius { radius_km: f64 },
    /// Footprint of every gate in the sweep, masked or not
    Coverage,
}

impl Default for ExtentMode {
    fn default() -> Self {
        ExtentMode::Radius { radius_km: 230.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeamSetting {
    #[default]
    FourThirds,
    Flat,
}

impl From<BeamSetting> for BeamModel {
    fn from(setting: BeamSetting) -> Self {
        match setting {
            BeamSetting::FourThirds => BeamModel::FourThirdsEarth,
            BeamSetting::Flat => BeamModel::Flat,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionSetting {
    #[default]
    AzimuthalEquidistant,
    Equirectangular,
}

impl From<ProjectionSetting> for GeoModel {
    fn from(setting: ProjectionSetting) -> Self {
        match setting {
            ProjectionSetting::AzimuthalEquidistant => GeoModel::AzimuthalEquidistant,
            ProjectionSetting::Equirectangular => GeoModel::Equirectangular,
        }
    }
}

/// Canvas and geometry settings shared by every product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_size")]
    pub width: usize,
    #[serde(default = "default_size")]
    pub height: usize,
    /// Sweep index within the volume; 0 is the lowest tilt
    #[serde(default)]
    pub sweep: usize,
    #[serde(default)]
    pub extent: ExtentMode,
    #[serde(default)]
    pub beam: BeamSetting,
    #[serde(default)]
    pub projection: ProjectionSetting,
}

fn default_size() -> usize {
    1024
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_size(),
            height: default_size(),
            sweep: 0,
            extent: ExtentMode::default(),
            beam: BeamSetting::default(),
            projection: ProjectionSetting::default(),
        }
    }
}

/// Where artifacts go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Timestamped copies kept per station/product; 0 disables history
    #[serde(default = "default_history")]
    pub history: usize,
    /// Write to an S3-compatible bucket instead of `directory`
    #[serde(default)]
    pub s3: Option<S3Config>,
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_history() -> usize {
    5
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            history: default_history(),
            s3: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Stations processed at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_poll_interval() -> u64 {
    120
}

fn default_concurrency() -> usize {
    4
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            concurrency: default_concurrency(),
        }
    }
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl WorkerConfig {
    /// Load and validate a YAML config file.
    pub fn from_file(path: impl AsRef<Path>) -> RadarResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RadarError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_yaml(&content)?;
        info!(
            path = %path.display(),
            stations = config.stations.len(),
            "Loaded worker config"
        );
        Ok(config)
    }

    /// Parse and validate YAML text. An empty document gives the defaults.
    pub fn from_yaml(content: &str) -> RadarResult<Self> {
        let config: Self = if content.trim().is_empty() {
            Self {
                stations: default_stations(),
                ..Self::default()
            }
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| RadarError::ConfigError(format!("worker config: {}", e)))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Built-in products with this file's `products` entries merged on top.
    pub fn product_table(&self) -> ProductTable {
        let mut table = ProductTable::builtin();
        for product in self.products.values() {
            table.insert(product.clone());
        }
        table
    }

    pub fn validate(&self) -> RadarResult<()> {
        let invalid = |param: &str, message: String| RadarError::InvalidParameter {
            param: param.to_string(),
            message,
        };

        if self.render.width == 0 || self.render.height == 0 {
            return Err(invalid(
                "render.size",
                format!("{}x{} is empty", self.render.width, self.render.height),
            ));
        }
        match self.render.extent {
            ExtentMode::Radius { radius_km } if !(radius_km > 0.0) => {
                return Err(invalid("render.extent.radius_km", format!("{} <= 0", radius_km)));
            }
            ExtentMode::Fixed {
                west,
                south,
                east,
                north,
            } => {
                GeoExtent::new(west, south, east, north)
                    .map_err(|e| invalid("render.extent", e.to_string()))?;
            }
            _ => {}
        }
        if self.source.max_candidates == 0 {
            return Err(invalid("source.max_candidates", "must be at least 1".into()));
        }
        if self.source.max_attempts == 0 {
            return Err(invalid("source.max_attempts", "must be at least 1".into()));
        }
        if self.source.step_minutes == 0 {
            return Err(invalid("source.step_minutes", "must be at least 1".into()));
        }
        if self.schedule.concurrency == 0 {
            return Err(invalid("schedule.concurrency", "must be at least 1".into()));
        }
        if self.stations.is_empty() {
            return Err(RadarError::ConfigError("no stations configured".into()));
        }

        for (key, product) in &self.products {
            if key != &product.name {
                return Err(RadarError::ConfigError(format!(
                    "product key '{}' does not match name '{}'",
                    key, product.name
                )));
            }
        }
        let table = self.product_table();
        table.validate()?;

        for station in &self.stations {
            if station.latitude.is_some() != station.longitude.is_some() {
                return Err(invalid(
                    "stations.location",
                    format!("{} needs both latitude and longitude", station.id),
                ));
            }
            if station.products.is_empty() {
                return Err(RadarError::ConfigError(format!(
                    "{} has no products",
                    station.id
                )));
            }
            for product in &station.products {
                table.get(product)?;
            }
        }
        debug!(products = ?table.names(), "Validated worker config");
        Ok(())
    }
}
