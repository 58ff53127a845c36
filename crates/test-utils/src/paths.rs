//! Scratch directories.

/// Scratch directory removed on drop.
pub fn temp_output_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("radar_test_")
        .tempdir()
        .expect("Failed to create temporary test directory")
}
