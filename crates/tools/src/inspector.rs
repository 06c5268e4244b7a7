use scada_common::{OccupancyStatus, Point, VehicleId, VehicleStatus};
use scada_kernel::Plant;
use serde::Serialize;

/// Plant inspector for dashboards and developer tooling.
///
/// Provides read-only queries against the plant state.
pub struct PlantInspector;

impl PlantInspector {
    /// Produce a summary of the plant state.
    pub fn summary(plant: &Plant) -> PlantSummary {
        let mut fleet = FleetSummary {
            total: plant.vehicle_count(),
            routed: plant.routes().len(),
            ..FleetSummary::default()
        };
        for v in plant.vehicles() {
            match v.status {
                VehicleStatus::Idle => fleet.idle += 1,
                VehicleStatus::Running => fleet.running += 1,
                VehicleStatus::Error => fleet.error += 1,
            }
        }

        let mut storage = StorageSummary {
            total: plant.locations().len(),
            ..StorageSummary::default()
        };
        for loc in plant.locations() {
            match loc.status {
                OccupancyStatus::Empty => storage.empty += 1,
                OccupancyStatus::Occupied => storage.occupied += 1,
            }
            storage.used_capacity += u64::from(loc.current_capacity);
            storage.max_capacity += u64::from(loc.max_capacity);
        }
        storage.utilization = if storage.max_capacity == 0 {
            0.0
        } else {
            storage.used_capacity as f64 / storage.max_capacity as f64
        };

        PlantSummary {
            tick: plant.tick(),
            seed: plant.seed(),
            fleet,
            storage,
            recorded_events: plant.events().len(),
            last_event_seq: plant.events().last_seq(),
        }
    }

    /// Position, status and route progress of a single vehicle.
    pub fn inspect_vehicle(plant: &Plant, id: &VehicleId) -> Option<VehicleInfo> {
        let vehicle = plant.vehicle(id)?;
        let route = plant.route(id);
        Some(VehicleInfo {
            id: id.clone(),
            status: vehicle.status,
            position: vehicle.position,
            target: route.map(|r| plant.locations()[r.target()].coordinates),
            path_index: route.map(|r| r.cursor()),
            path_points: vehicle.path.len(),
        })
    }
}

/// Summary of plant state for the inspector.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantSummary {
    pub tick: u64,
    pub seed: u64,
    pub fleet: FleetSummary,
    pub storage: StorageSummary,
    pub recorded_events: usize,
    pub last_event_seq: u64,
}

/// Vehicle counts by status.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    pub total: usize,
    pub routed: usize,
    pub idle: usize,
    pub running: usize,
    pub error: usize,
}

/// Storage counts by occupancy, with aggregate fill.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSummary {
    pub total: usize,
    pub empty: usize,
    pub occupied: usize,
    pub used_capacity: u64,
    pub max_capacity: u64,
    /// `used_capacity / max_capacity`, 0 when nothing can be stored.
    pub utilization: f64,
}

impl std::fmt::Display for PlantSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Plant: tick={} seed={} vehicles={} (running={} idle={} error={}) \
             locations={} (occupied={} empty={}) utilization={:.1}% events={}",
            self.tick,
            self.seed,
            self.fleet.total,
            self.fleet.running,
            self.fleet.idle,
            self.fleet.error,
            self.storage.total,
            self.storage.occupied,
            self.storage.empty,
            self.storage.utilization * 100.0,
            self.last_event_seq,
        )
    }
}

/// Detailed info about a single vehicle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub id: VehicleId,
    pub status: VehicleStatus,
    pub position: Point,
    pub target: Option<Point>,
    pub path_index: Option<usize>,
    pub path_points: usize,
}

impl std::fmt::Display for VehicleInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Vehicle {} [{}] pos=({:.2}, {:.2})",
            self.id, self.status, self.position.x, self.position.y
        )?;
        if let (Some(target), Some(index)) = (self.target, self.path_index) {
            write!(
                f,
                " -> ({:.2}, {:.2}) at stop #{index}",
                target.x, target.y
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scada_kernel::SimParams;
    use scada_layout::Layout;

    fn plant() -> Plant {
        Layout::builtin()
            .build_plant(SimParams::default(), 42)
            .unwrap()
    }

    #[test]
    fn summary_fresh_plant() {
        let summary = PlantInspector::summary(&plant());
        assert_eq!(summary.tick, 0);
        assert_eq!(summary.fleet.total, 2);
        assert_eq!(summary.fleet.routed, 2);
        assert_eq!(summary.fleet.running, 2);
        assert_eq!(summary.storage.total, 9);
        assert_eq!(summary.storage.occupied, 3);
        assert_eq!(summary.storage.empty, 6);
        assert_eq!(summary.storage.max_capacity, 900);
        assert_eq!(summary.recorded_events, 0);
    }

    #[test]
    fn utilization_is_a_ratio() {
        let mut p = plant();
        for _ in 0..300 {
            p.step();
        }
        let s = PlantInspector::summary(&p);
        assert!((0.0..=1.0).contains(&s.storage.utilization));
        assert_eq!(s.storage.empty + s.storage.occupied, s.storage.total);
        assert_eq!(s.fleet.idle + s.fleet.running + s.fleet.error, s.fleet.total);
    }

    #[test]
    fn inspect_vehicle_found() {
        let mut p = plant();
        p.step();
        let info = PlantInspector::inspect_vehicle(&p, &VehicleId::from("AGV-001")).unwrap();
        assert_eq!(info.path_index, Some(1));
        assert_eq!(info.target, Some(p.locations()[1].coordinates));
        assert_eq!(info.path_points, 6);
    }

    #[test]
    fn inspect_vehicle_not_found() {
        assert!(PlantInspector::inspect_vehicle(&plant(), &VehicleId::from("AGV-999")).is_none());
    }

    #[test]
    fn summary_display() {
        let s = format!("{}", PlantInspector::summary(&plant()));
        assert!(s.contains("tick=0"));
        assert!(s.contains("vehicles=2"));
    }
}
