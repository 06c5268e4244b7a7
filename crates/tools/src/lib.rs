//! Developer and dashboard tooling: read-only plant inspection.
//!
//! # Invariants
//! - Inspection never mutates the plant.

mod inspector;

pub use inspector::{FleetSummary, PlantInspector, PlantSummary, StorageSummary, VehicleInfo};
