//! Artifact naming.
//!
//! ```text
//! KFFC_latest.json                              volume pointer
//! KFFC_reflectivity.png                         latest overlay
//! KFFC_reflectivity_bounds.json                 {north, south, east, west}
//! KFFC_reflectivity.pgw                         world file
//! history/KFFC_reflectivity_202405012105.png    timestamped copies
//! ```

use radar_common::{ScanTime, StationId};

pub const HISTORY_PREFIX: &str = "history";

/// One member of a station/product's artifact set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Bounds,
    WorldFile,
}

impl ArtifactKind {
    fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::Image => ".png",
            ArtifactKind::Bounds => "_bounds.json",
            ArtifactKind::WorldFile => ".pgw",
        }
    }
}

pub fn artifact_key(station: &StationId, product: &str, kind: ArtifactKind) -> String {
    format!("{}_{}{}", station, product, kind.suffix())
}

pub fn pointer_key(station: &StationId) -> String {
    format!("{}_latest.json", station)
}

/// File-name prefix shared by every history copy of a station/product.
pub fn history_name_prefix(station: &StationId, product: &str) -> String {
    format!("{}_{}_", station, product)
}

pub fn history_key(station: &StationId, product: &str, scan_time: &ScanTime) -> String {
    format!(
        "{}/{}{}.png",
        HISTORY_PREFIX,
        history_name_prefix(station, product),
        scan_time.compact()
    )
}
