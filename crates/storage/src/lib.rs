//! Artifact storage for rendered radar overlays.
//!
//! - [`ArtifactStore`]: atomic-replace blob store over `object_store`
//!   (local filesystem, S3/MinIO, or in-memory for tests)
//! - [`keys`]: artifact, pointer and history naming

pub mod artifacts;
pub mod keys;

pub use artifacts::{ArtifactStore, S3Config, StoredObject};
pub use keys::{artifact_key, history_key, history_name_prefix, pointer_key, ArtifactKind};
