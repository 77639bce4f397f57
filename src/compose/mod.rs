//! Service group orchestration
//!
//! Requested service names are resolved against the catalog, merged into a
//! generated compose file, recorded in the registry and handed to
//! `docker compose`.

pub mod manifest;
pub mod orchestrator;
pub mod resolver;

pub use manifest::{Manifest, ManifestMaterializer, Materialized};
pub use orchestrator::{Orchestrator, StartReport, StopGroup, StopReport};
pub use resolver::{resolve, Diagnostic, Resolution, ResolvedSet};
