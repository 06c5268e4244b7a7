//! Floor layout documents.
//!
//! A layout is the JSON document the dashboard consumes: storage locations,
//! vehicles and an opaque `communication` block, plus optional vehicle
//! routes. The same shape is served back with live state filled in.
//!
//! ```json
//! {
//!   "dataSource": {
//!     "storage": { "locations": [{ "id": "L1", "coordinates": { "x": 0, "y": 0 }, ... }] },
//!     "vehicles": [{ "id": "AGV-001", "status": "running", "position": { "x": 0, "y": 0 } }]
//!   },
//!   "communication": { ... },
//!   "routes": { "AGV-001": [0, 1, 2] }
//! }
//! ```
//!
//! # Invariants
//! - A loaded layout always builds a valid plant.
//! - Fingerprints are computed over the canonical JSON form, so formatting
//!   differences in the source file do not change them.

use scada_common::{OccupancyStatus, Point, StorageLocation, Vehicle, VehicleId, VehicleStatus};
use scada_kernel::{FIRST_VEHICLE_LOOP, Plant, PlantError, SECOND_VEHICLE_LOOP, SimParams};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Vehicle that drives [`FIRST_VEHICLE_LOOP`] when a layout names no routes.
pub const FIRST_VEHICLE: &str = "AGV-001";
/// Vehicle that drives [`SECOND_VEHICLE_LOOP`] when a layout names no routes.
pub const SECOND_VEHICLE: &str = "AGV-002";

/// Errors from loading or validating a layout.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid layout: {0}")]
    Invalid(#[from] PlantError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub data_source: DataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication: Option<Value>,
    /// Waypoint sequences keyed by vehicle. Absent means the default loops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<BTreeMap<VehicleId, Vec<usize>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub storage: Storage,
    pub vehicles: Vec<Vehicle>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    pub locations: Vec<StorageLocation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Layout {
    /// The stock floor: a 3x3 grid of racks `L1..L9` (row-major) and two AGVs
    /// parked on opposite corners.
    pub fn builtin() -> Self {
        let locations = (0..9)
            .map(|i| {
                let x = -200.0 + (i % 3) as f64 * 200.0;
                let y = -150.0 + (i / 3) as f64 * 150.0;
                let mut loc = StorageLocation::new(format!("L{}", i + 1), Point::new(x, y), 100);
                if matches!(i, 1 | 4 | 6) {
                    loc.status = OccupancyStatus::Occupied;
                    loc.current_capacity = 40 + 10 * i as u32;
                }
                let row = ['A', 'B', 'C'][i / 3];
                loc.extra
                    .insert("name".into(), json!(format!("Rack {row}{}", i % 3 + 1)));
                loc
            })
            .collect::<Vec<_>>();

        let vehicle = |id: &str, at: Point| {
            let mut v = Vehicle::new(id, at, VehicleStatus::Running);
            v.extra.insert("type".into(), json!("AGV"));
            v
        };
        let vehicles = vec![
            vehicle(FIRST_VEHICLE, locations[FIRST_VEHICLE_LOOP[0]].coordinates),
            vehicle(SECOND_VEHICLE, locations[SECOND_VEHICLE_LOOP[0]].coordinates),
        ];

        Self {
            data_source: DataSource {
                storage: Storage {
                    locations,
                    extra: Map::new(),
                },
                vehicles,
                extra: Map::new(),
            },
            communication: Some(json!({ "protocol": "http", "pollIntervalMs": 1000 })),
            routes: None,
        }
    }

    /// Parse and validate a layout from JSON text.
    pub fn from_json(text: &str) -> Result<Self, LayoutError> {
        let layout: Self = serde_json::from_str(text)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load and validate a layout file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let layout = Self::from_json(&text)?;
        tracing::info!(
            path = %path.display(),
            locations = layout.locations().len(),
            vehicles = layout.data_source.vehicles.len(),
            fingerprint = %layout.fingerprint()?,
            "layout loaded"
        );
        Ok(layout)
    }

    /// Write the layout as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LayoutError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn locations(&self) -> &[StorageLocation] {
        &self.data_source.storage.locations
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.data_source.vehicles
    }

    /// SHA-256 (hex) of the canonical JSON form.
    pub fn fingerprint(&self) -> Result<String, LayoutError> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Routes the plant will run: the explicit ones, or the default loops for
    /// the two stock vehicles when they are present.
    pub fn effective_routes(&self) -> BTreeMap<VehicleId, Vec<usize>> {
        if let Some(routes) = &self.routes {
            return routes.clone();
        }
        let present = |id: &str| self.vehicles().iter().any(|v| v.id.as_str() == id);
        let mut routes = BTreeMap::new();
        if present(FIRST_VEHICLE) {
            routes.insert(VehicleId::from(FIRST_VEHICLE), FIRST_VEHICLE_LOOP.to_vec());
        }
        if present(SECOND_VEHICLE) {
            routes.insert(
                VehicleId::from(SECOND_VEHICLE),
                SECOND_VEHICLE_LOOP.to_vec(),
            );
        }
        routes
    }

    /// Build the plant this layout describes.
    pub fn build_plant(&self, params: SimParams, seed: u64) -> Result<Plant, LayoutError> {
        Ok(Plant::new(
            self.locations().to_vec(),
            self.vehicles().to_vec(),
            self.effective_routes(),
            params,
            seed,
        )?)
    }

    /// Check that the layout builds a plant with default parameters.
    pub fn validate(&self) -> Result<(), LayoutError> {
        self.build_plant(SimParams::default(), 0).map(|_| ())
    }

    /// Vehicles with live state from `plant`, in layout order.
    pub fn live_vehicles(&self, plant: &Plant) -> Vec<Vehicle> {
        self.vehicles()
            .iter()
            .map(|v| plant.vehicle(&v.id).cloned().unwrap_or_else(|| v.clone()))
            .collect()
    }

    /// A copy of this layout with locations and vehicles replaced by the
    /// plant's live state.
    pub fn with_live_state(&self, plant: &Plant) -> Self {
        let mut live = self.clone();
        live.data_source.storage.locations = plant.locations().to_vec();
        live.data_source.vehicles = self.live_vehicles(plant);
        live
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::builtin()
    }
}
