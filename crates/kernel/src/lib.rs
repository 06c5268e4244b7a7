//! Plant kernel: authoritative floor state and the simulation tick.
//!
//! # Invariants
//! - Every route waypoint indexes an existing storage location.
//! - A route cursor always points inside its route.
//! - Stepping is deterministic for a given starting seed.
//! - All state mutations flow through `Plant` operations and are logged.

mod events;
pub mod motion;
mod plant;
mod route;

pub use events::{EventKind, EventLog, PlantEvent};
pub use plant::{Plant, PlantError, SimParams, StepReport};
pub use route::{FIRST_VEHICLE_LOOP, Route, SECOND_VEHICLE_LOOP};
