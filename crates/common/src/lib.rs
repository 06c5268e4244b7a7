//! Shared value types for the floor simulation: identifiers, map points,
//! vehicle and storage-location records in the dashboard's wire format.

mod types;

pub use types::{
    LocationId, OccupancyStatus, Point, RunId, StorageLocation, Vehicle, VehicleId, VehicleStatus,
};
