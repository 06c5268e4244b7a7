use crate::events::{EventKind, EventLog, PlantEvent};
use crate::motion::{self, Motion};
use crate::route::Route;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scada_common::{
    LocationId, OccupancyStatus, Point, StorageLocation, Vehicle, VehicleId, VehicleStatus,
};
use std::collections::{BTreeMap, BTreeSet};

/// Tuning knobs of the simulation tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SimParams {
    /// Vehicle speed in map units per second.
    pub speed: f64,
    /// Simulated time covered by one tick, in seconds.
    pub tick_seconds: f64,
    /// Distance below which a vehicle snaps onto its target.
    pub arrival_epsilon: f64,
    /// Chance that an arrival flips occupancy at the next stop.
    pub occupancy_toggle_chance: f64,
    /// Per-tick chance that a vehicle's status is redrawn.
    pub status_flip_chance: f64,
    /// Jittered points inserted between a vehicle and its target.
    pub intermediate_points: usize,
    /// Full width of the jitter applied to intermediate points.
    pub jitter_range: f64,
    /// Route stops (current target included) drawn in the render path.
    pub lookahead: usize,
}

impl SimParams {
    /// Distance a vehicle covers in one tick.
    pub fn step_distance(&self) -> f64 {
        self.speed * self.tick_seconds
    }

    pub fn validate(&self) -> Result<(), PlantError> {
        let probability = |name: &str, p: f64| {
            if (0.0..=1.0).contains(&p) {
                Ok(())
            } else {
                Err(PlantError::InvalidParams(format!(
                    "{name} must be within [0, 1], got {p}"
                )))
            }
        };
        probability("occupancy_toggle_chance", self.occupancy_toggle_chance)?;
        probability("status_flip_chance", self.status_flip_chance)?;
        if !(self.speed.is_finite() && self.speed >= 0.0) {
            return Err(PlantError::InvalidParams(format!(
                "speed must be a non-negative number, got {}",
                self.speed
            )));
        }
        if !(self.tick_seconds.is_finite() && self.tick_seconds > 0.0) {
            return Err(PlantError::InvalidParams(format!(
                "tick_seconds must be positive, got {}",
                self.tick_seconds
            )));
        }
        if !(self.arrival_epsilon.is_finite() && self.arrival_epsilon > 0.0) {
            return Err(PlantError::InvalidParams(format!(
                "arrival_epsilon must be positive, got {}",
                self.arrival_epsilon
            )));
        }
        if !(self.jitter_range.is_finite() && self.jitter_range >= 0.0) {
            return Err(PlantError::InvalidParams(format!(
                "jitter_range must be non-negative, got {}",
                self.jitter_range
            )));
        }
        if self.lookahead == 0 {
            return Err(PlantError::InvalidParams(
                "lookahead must include the current target".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            speed: 40.0,
            tick_seconds: 0.1,
            arrival_epsilon: 5.0,
            occupancy_toggle_chance: 0.3,
            status_flip_chance: 0.01,
            intermediate_points: 2,
            jitter_range: 15.0,
            lookahead: 3,
        }
    }
}

/// Errors from building or mutating a plant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlantError {
    #[error("duplicate storage location id {0}")]
    DuplicateLocation(LocationId),
    #[error("duplicate vehicle id {0}")]
    DuplicateVehicle(VehicleId),
    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),
    #[error("route for vehicle {0} is empty")]
    EmptyRoute(VehicleId),
    #[error("route for vehicle {vehicle} visits waypoint {waypoint}, but only {locations} locations exist")]
    WaypointOutOfRange {
        vehicle: VehicleId,
        waypoint: usize,
        locations: usize,
    },
    #[error("invalid simulation parameters: {0}")]
    InvalidParams(String),
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub tick: u64,
    pub arrivals: usize,
    pub occupancy_toggles: usize,
    pub status_changes: usize,
}

/// The authoritative floor state.
///
/// Owns the storage locations (in layout order, which is the waypoint
/// numbering), the vehicles and their routes. Vehicles are kept in a
/// BTreeMap so every tick visits them in the same order.
///
/// Randomness is seeded: each step advances `seed` with splitmix64 and
/// samples from an RNG built from the new value, so two plants created with
/// the same seed and fed the same operations stay identical.
#[derive(Debug, Clone)]
pub struct Plant {
    locations: Vec<StorageLocation>,
    vehicles: BTreeMap<VehicleId, Vehicle>,
    routes: BTreeMap<VehicleId, Route>,
    params: SimParams,
    tick: u64,
    seed: u64,
    events: EventLog,
}

impl Plant {
    /// Build a plant, checking ids, routes and parameters.
    pub fn new(
        locations: Vec<StorageLocation>,
        vehicles: Vec<Vehicle>,
        routes: BTreeMap<VehicleId, Vec<usize>>,
        params: SimParams,
        seed: u64,
    ) -> Result<Self, PlantError> {
        params.validate()?;

        let mut seen = BTreeSet::new();
        for loc in &locations {
            if !seen.insert(&loc.id) {
                return Err(PlantError::DuplicateLocation(loc.id.clone()));
            }
        }

        let mut by_id = BTreeMap::new();
        for vehicle in vehicles {
            if by_id.contains_key(&vehicle.id) {
                return Err(PlantError::DuplicateVehicle(vehicle.id));
            }
            by_id.insert(vehicle.id.clone(), vehicle);
        }

        let mut built = BTreeMap::new();
        for (id, waypoints) in routes {
            if !by_id.contains_key(&id) {
                return Err(PlantError::VehicleNotFound(id));
            }
            let Some(route) = Route::new(waypoints) else {
                return Err(PlantError::EmptyRoute(id));
            };
            if route.max_waypoint() >= locations.len() {
                return Err(PlantError::WaypointOutOfRange {
                    vehicle: id,
                    waypoint: route.max_waypoint(),
                    locations: locations.len(),
                });
            }
            built.insert(id, route);
        }

        tracing::debug!(
            locations = locations.len(),
            vehicles = by_id.len(),
            routes = built.len(),
            seed,
            "plant built"
        );

        Ok(Self {
            locations,
            vehicles: by_id,
            routes: built,
            params,
            tick: 0,
            seed,
            events: EventLog::default(),
        })
    }

    /// Replace the event history with an empty log of the given capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.events = EventLog::with_capacity(capacity);
        self
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current RNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Storage locations in waypoint order.
    pub fn locations(&self) -> &[StorageLocation] {
        &self.locations
    }

    pub fn location(&self, id: &LocationId) -> Option<&StorageLocation> {
        self.locations.iter().find(|loc| &loc.id == id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub fn vehicle(&self, id: &VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn route(&self, id: &VehicleId) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn routes(&self) -> &BTreeMap<VehicleId, Route> {
        &self.routes
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Events recorded after sequence number `seq`.
    pub fn events_since(&self, seq: u64) -> Vec<PlantEvent> {
        self.events.since(seq)
    }

    /// Apply an operator override to a vehicle. Absent fields are left as is.
    ///
    /// A moved vehicle keeps its route and heads for the same target from
    /// the new position on the next tick.
    pub fn update_vehicle(
        &mut self,
        id: &VehicleId,
        status: Option<VehicleStatus>,
        position: Option<Point>,
    ) -> Result<&Vehicle, PlantError> {
        let vehicle = self
            .vehicles
            .get_mut(id)
            .ok_or_else(|| PlantError::VehicleNotFound(id.clone()))?;
        if let Some(status) = status {
            vehicle.status = status;
        }
        if let Some(position) = position {
            vehicle.position = position;
        }
        tracing::info!(vehicle = %id, ?status, ?position, "vehicle overridden");
        self.events.push(
            self.tick,
            EventKind::VehicleOverridden {
                vehicle: id.clone(),
                status,
                position,
            },
        );
        Ok(&self.vehicles[id])
    }

    /// Advance the simulation by one tick.
    ///
    /// Every routed vehicle gets a fresh render path and moves toward its
    /// target; arrivals advance the route and may flip occupancy at the next
    /// stop. Afterwards each routed vehicle's status may be redrawn.
    pub fn step(&mut self) -> StepReport {
        self.tick += 1;
        self.seed = splitmix64(self.seed);
        let _span = tracing::trace_span!("plant_step", tick = self.tick).entered();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut report = StepReport {
            tick: self.tick,
            ..StepReport::default()
        };

        let routed: Vec<VehicleId> = self.routes.keys().cloned().collect();
        for id in &routed {
            self.advance_vehicle(id, &mut rng, &mut report);
        }
        for id in &routed {
            self.perturb_status(id, &mut rng, &mut report);
        }

        self.events
            .push(self.tick, EventKind::Stepped { seed: self.seed });

        if report.arrivals > 0 || report.status_changes > 0 {
            tracing::debug!(
                tick = report.tick,
                arrivals = report.arrivals,
                toggles = report.occupancy_toggles,
                status_changes = report.status_changes,
                "tick"
            );
        }
        report
    }

    fn advance_vehicle(&mut self, id: &VehicleId, rng: &mut StdRng, report: &mut StepReport) {
        let (Some(route), Some(vehicle)) = (self.routes.get_mut(id), self.vehicles.get_mut(id))
        else {
            return;
        };
        let p = &self.params;
        let start = vehicle.position.to_vec();
        let target = self.locations[route.target()].coordinates.to_vec();

        let mut path = Vec::with_capacity(p.intermediate_points + p.lookahead + 1);
        path.push(vehicle.position);
        path.extend(
            motion::intermediate_points(start, target, p.intermediate_points, p.jitter_range, rng)
                .into_iter()
                .map(Point::from),
        );
        path.push(Point::from(target));
        for ahead in 1..p.lookahead {
            path.push(self.locations[route.peek(ahead)].coordinates);
        }
        vehicle.path = path;

        match motion::step_toward(start, target, p.step_distance(), p.arrival_epsilon) {
            Motion::Moving(next) => vehicle.position = next.into(),
            Motion::Arrived => {
                vehicle.position = target.into();
                let reached = self.locations[route.target()].id.clone();
                let waypoint = route.advance();
                let toggle = rng.gen_bool(p.occupancy_toggle_chance);
                report.arrivals += 1;
                tracing::trace!(vehicle = %id, %reached, next = waypoint, "arrived");
                self.events.push(
                    self.tick,
                    EventKind::Arrived {
                        vehicle: id.clone(),
                        reached,
                        waypoint,
                    },
                );
                if toggle {
                    self.toggle_occupancy(waypoint, rng);
                    report.occupancy_toggles += 1;
                }
            }
        }
    }

    /// Flip occupancy of the location at `index` in layout order. Routes
    /// address locations by position, not by id, so a layout listing `L3`
    /// first has waypoint 0 refer to `L3`.
    fn toggle_occupancy(&mut self, index: usize, rng: &mut StdRng) {
        let location = &mut self.locations[index];
        location.status = location.status.toggled();
        location.current_capacity = match location.status {
            OccupancyStatus::Occupied if location.max_capacity > 0 => {
                rng.gen_range(0..location.max_capacity)
            }
            _ => 0,
        };
        self.events.push(
            self.tick,
            EventKind::OccupancyToggled {
                location: location.id.clone(),
                status: location.status,
                current_capacity: location.current_capacity,
            },
        );
    }

    fn perturb_status(&mut self, id: &VehicleId, rng: &mut StdRng, report: &mut StepReport) {
        if !rng.gen_bool(self.params.status_flip_chance) {
            return;
        }
        let new = VehicleStatus::ALL[rng.gen_range(0..VehicleStatus::ALL.len())];
        let Some(vehicle) = self.vehicles.get_mut(id) else {
            return;
        };
        let old = std::mem::replace(&mut vehicle.status, new);
        if old != new {
            report.status_changes += 1;
            tracing::debug!(vehicle = %id, %old, %new, "status changed");
            self.events.push(
                self.tick,
                EventKind::StatusChanged {
                    vehicle: id.clone(),
                    old,
                    new,
                },
            );
        }
    }

    /// Deterministic hash of the simulated state for comparisons.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        mix(&mut h, &self.seed.to_le_bytes());
        for loc in &self.locations {
            mix(&mut h, loc.id.as_str().as_bytes());
            mix(&mut h, loc.status.as_str().as_bytes());
            mix(&mut h, &loc.current_capacity.to_le_bytes());
        }
        for (id, v) in &self.vehicles {
            mix(&mut h, id.as_str().as_bytes());
            mix(&mut h, v.status.as_str().as_bytes());
            mix(&mut h, &v.position.x.to_le_bytes());
            mix(&mut h, &v.position.y.to_le_bytes());
        }
        for route in self.routes.values() {
            mix(&mut h, &route.cursor().to_le_bytes());
        }
        h
    }
}

/// Splitmix64 step, used to advance the plant seed each tick.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{FIRST_VEHICLE_LOOP, SECOND_VEHICLE_LOOP};

    /// 3x3 grid, 100 units apart, ids L1..L9 in row-major order.
    fn grid() -> Vec<StorageLocation> {
        (0..9)
            .map(|i| {
                let x = (i % 3) as f64 * 100.0;
                let y = (i / 3) as f64 * 100.0;
                StorageLocation::new(format!("L{}", i + 1), Point::new(x, y), 50)
            })
            .collect()
    }

    fn two_agvs() -> Vec<Vehicle> {
        vec![
            Vehicle::new("AGV-001", Point::new(0.0, 0.0), VehicleStatus::Running),
            Vehicle::new("AGV-002", Point::new(200.0, 200.0), VehicleStatus::Running),
        ]
    }

    fn default_routes() -> BTreeMap<VehicleId, Vec<usize>> {
        BTreeMap::from([
            (VehicleId::from("AGV-001"), FIRST_VEHICLE_LOOP.to_vec()),
            (VehicleId::from("AGV-002"), SECOND_VEHICLE_LOOP.to_vec()),
        ])
    }

    fn plant_with(params: SimParams, seed: u64) -> Plant {
        Plant::new(grid(), two_agvs(), default_routes(), params, seed).unwrap()
    }

    fn quiet() -> SimParams {
        SimParams {
            occupancy_toggle_chance: 0.0,
            status_flip_chance: 0.0,
            ..SimParams::default()
        }
    }

    #[test]
    fn plant_starts_at_tick_zero() {
        let plant = plant_with(SimParams::default(), 1);
        assert_eq!(plant.tick(), 0);
        assert_eq!(plant.vehicle_count(), 2);
        assert_eq!(plant.locations().len(), 9);
        assert!(plant.events().is_empty());
    }

    #[test]
    fn step_increments_tick_and_seed() {
        let mut plant = plant_with(SimParams::default(), 42);
        plant.step();
        plant.step();
        plant.step();
        assert_eq!(plant.tick(), 3);
        assert_ne!(plant.seed(), 42);
    }

    #[test]
    fn vehicle_at_target_arrives_first_tick() {
        let mut plant = plant_with(quiet(), 0);
        let report = plant.step();
        assert_eq!(report.arrivals, 2);

        let agv1 = VehicleId::from("AGV-001");
        assert_eq!(plant.route(&agv1).unwrap().cursor(), 1);
        assert_eq!(plant.route(&agv1).unwrap().target(), 1);
        assert_eq!(plant.vehicle(&agv1).unwrap().position, Point::new(0.0, 0.0));
    }

    #[test]
    fn vehicle_moves_at_constant_speed() {
        let mut plant = plant_with(quiet(), 0);
        plant.step(); // arrive at L1, next target L2 at (100, 0)
        plant.step();
        let agv1 = plant.vehicle(&VehicleId::from("AGV-001")).unwrap();
        assert!((agv1.position.x - 4.0).abs() < 1e-9);
        assert!(agv1.position.y.abs() < 1e-9);
    }

    #[test]
    fn vehicle_reaches_next_waypoint() {
        let mut plant = plant_with(quiet(), 0);
        plant.step();
        // 100 units at 4 per tick: within epsilon after 24 moves, snap on the 25th.
        for _ in 0..25 {
            plant.step();
        }
        let id = VehicleId::from("AGV-001");
        assert_eq!(plant.vehicle(&id).unwrap().position, Point::new(100.0, 0.0));
        assert_eq!(plant.route(&id).unwrap().target(), 2);
    }

    #[test]
    fn render_path_shape() {
        let mut plant = plant_with(quiet(), 5);
        plant.step();
        let id = VehicleId::from("AGV-001");
        let before = plant.vehicle(&id).unwrap().position;
        plant.step();
        let v = plant.vehicle(&id).unwrap();
        // start + 2 intermediates + target + 2 upcoming stops
        assert_eq!(v.path.len(), 6);
        assert_eq!(v.path[0], before);
        assert_eq!(v.path[3], Point::new(100.0, 0.0)); // L2
        assert_eq!(v.path[4], Point::new(200.0, 0.0)); // L3
        assert_eq!(v.path[5], Point::new(200.0, 100.0)); // L6
        for (p, x) in v.path[1..3].iter().zip([100.0 / 3.0, 200.0 / 3.0]) {
            assert!((p.x - x).abs() <= 7.5);
            assert!(p.y.abs() <= 7.5);
        }
    }

    #[test]
    fn arrival_always_toggles_with_certain_chance() {
        let params = SimParams {
            occupancy_toggle_chance: 1.0,
            status_flip_chance: 0.0,
            ..SimParams::default()
        };
        let mut plant = plant_with(params, 11);
        let report = plant.step();
        assert_eq!(report.occupancy_toggles, 2);

        // Toggles hit the *next* stop: L2 for AGV-001, L8 for AGV-002.
        let l2 = plant.location(&LocationId::from("L2")).unwrap();
        assert_eq!(l2.status, OccupancyStatus::Occupied);
        assert!(l2.current_capacity < l2.max_capacity);
        let l8 = plant.location(&LocationId::from("L8")).unwrap();
        assert_eq!(l8.status, OccupancyStatus::Occupied);
        let l1 = plant.location(&LocationId::from("L1")).unwrap();
        assert_eq!(l1.status, OccupancyStatus::Empty);
    }

    #[test]
    fn every_tick_is_logged() {
        let mut vehicles = two_agvs();
        vehicles[0].position = Point::new(50.0, 50.0);
        vehicles[1].position = Point::new(150.0, 150.0);
        let mut plant = Plant::new(grid(), vehicles, default_routes(), quiet(), 9).unwrap();
        plant.step();
        plant.step();

        let stepped: Vec<(u64, u64)> = plant
            .events()
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::Stepped { seed } => Some((e.tick, seed)),
                _ => None,
            })
            .collect();
        assert_eq!(stepped.len(), 2);
        assert_eq!(stepped[0].0, 1);
        assert_eq!(stepped[1], (2, plant.seed()));
        assert_eq!(plant.events().len(), 2);
    }

    #[test]
    fn toggle_respects_layout_order() {
        let params = SimParams {
            occupancy_toggle_chance: 1.0,
            status_flip_chance: 0.0,
            ..SimParams::default()
        };
        let mut locations = grid();
        locations.swap(1, 4);
        let mut plant = Plant::new(locations, two_agvs(), default_routes(), params, 6).unwrap();
        plant.step();
        // Waypoint 1 is now the location with id L5.
        let l5 = plant.location(&LocationId::from("L5")).unwrap();
        assert_eq!(l5.status, OccupancyStatus::Occupied);
        let l2 = plant.location(&LocationId::from("L2")).unwrap();
        assert_eq!(l2.status, OccupancyStatus::Empty);
    }

    #[test]
    fn occupied_location_empties_on_toggle() {
        let params = SimParams {
            occupancy_toggle_chance: 1.0,
            status_flip_chance: 0.0,
            ..SimParams::default()
        };
        let mut locations = grid();
        locations[1].status = OccupancyStatus::Occupied;
        locations[1].current_capacity = 30;
        let mut plant = Plant::new(locations, two_agvs(), default_routes(), params, 2).unwrap();
        plant.step();
        let l2 = plant.location(&LocationId::from("L2")).unwrap();
        assert_eq!(l2.status, OccupancyStatus::Empty);
        assert_eq!(l2.current_capacity, 0);
    }

    #[test]
    fn status_flips_only_with_chance() {
        let mut plant = plant_with(quiet(), 3);
        for _ in 0..200 {
            plant.step();
        }
        assert!(plant.vehicles().all(|v| v.status == VehicleStatus::Running));

        let params = SimParams {
            status_flip_chance: 1.0,
            ..quiet()
        };
        let mut plant = plant_with(params, 3);
        let changes: usize = (0..50).map(|_| plant.step().status_changes).sum();
        assert!(changes > 0);
    }

    #[test]
    fn same_seed_same_history() {
        let mut a = plant_with(SimParams::default(), 77);
        let mut b = plant_with(SimParams::default(), 77);
        for _ in 0..500 {
            a.step();
            b.step();
        }
        assert_eq!(a.state_hash(), b.state_hash());
        assert_eq!(a.events().last_seq(), b.events().last_seq());
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = plant_with(SimParams::default(), 1);
        let mut b = plant_with(SimParams::default(), 2);
        for _ in 0..500 {
            a.step();
            b.step();
        }
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn unrouted_vehicles_stay_put() {
        let mut vehicles = two_agvs();
        vehicles.push(Vehicle::new(
            "AMR-007",
            Point::new(30.0, -30.0),
            VehicleStatus::Idle,
        ));
        let mut plant =
            Plant::new(grid(), vehicles, default_routes(), SimParams::default(), 4).unwrap();
        for _ in 0..100 {
            plant.step();
        }
        let amr = plant.vehicle(&VehicleId::from("AMR-007")).unwrap();
        assert_eq!(amr.position, Point::new(30.0, -30.0));
        assert_eq!(amr.status, VehicleStatus::Idle);
        assert!(amr.path.is_empty());
    }

    #[test]
    fn update_vehicle_overrides_and_logs() {
        let mut plant = plant_with(quiet(), 0);
        let id = VehicleId::from("AGV-002");
        let v = plant
            .update_vehicle(&id, Some(VehicleStatus::Error), Some(Point::new(5.0, 6.0)))
            .unwrap();
        assert_eq!(v.status, VehicleStatus::Error);
        assert_eq!(v.position, Point::new(5.0, 6.0));
        assert_eq!(plant.events().len(), 1);

        let v = plant.update_vehicle(&id, None, None).unwrap();
        assert_eq!(v.status, VehicleStatus::Error);
    }

    #[test]
    fn update_unknown_vehicle_fails() {
        let mut plant = plant_with(quiet(), 0);
        let err = plant
            .update_vehicle(&VehicleId::from("AGV-404"), None, None)
            .unwrap_err();
        assert_eq!(err, PlantError::VehicleNotFound(VehicleId::from("AGV-404")));
    }

    #[test]
    fn rejects_duplicate_location() {
        let mut locations = grid();
        locations[4].id = LocationId::from("L1");
        let err = Plant::new(locations, two_agvs(), default_routes(), quiet(), 0).unwrap_err();
        assert_eq!(err, PlantError::DuplicateLocation(LocationId::from("L1")));
    }

    #[test]
    fn rejects_duplicate_vehicle() {
        let mut vehicles = two_agvs();
        vehicles[1].id = VehicleId::from("AGV-001");
        let err = Plant::new(grid(), vehicles, BTreeMap::new(), quiet(), 0).unwrap_err();
        assert_eq!(err, PlantError::DuplicateVehicle(VehicleId::from("AGV-001")));
    }

    #[test]
    fn rejects_bad_routes() {
        let routes = BTreeMap::from([(VehicleId::from("AGV-009"), vec![0])]);
        assert!(matches!(
            Plant::new(grid(), two_agvs(), routes, quiet(), 0),
            Err(PlantError::VehicleNotFound(_))
        ));

        let routes = BTreeMap::from([(VehicleId::from("AGV-001"), vec![])]);
        assert!(matches!(
            Plant::new(grid(), two_agvs(), routes, quiet(), 0),
            Err(PlantError::EmptyRoute(_))
        ));

        let routes = BTreeMap::from([(VehicleId::from("AGV-001"), vec![0, 9])]);
        assert!(matches!(
            Plant::new(grid(), two_agvs(), routes, quiet(), 0),
            Err(PlantError::WaypointOutOfRange { waypoint: 9, .. })
        ));
    }

    #[test]
    fn rejects_invalid_params() {
        let params = SimParams {
            occupancy_toggle_chance: 1.5,
            ..SimParams::default()
        };
        assert!(matches!(
            Plant::new(grid(), two_agvs(), default_routes(), params, 0),
            Err(PlantError::InvalidParams(_))
        ));
    }

    #[test]
    fn event_capacity_is_respected() {
        let params = SimParams {
            occupancy_toggle_chance: 1.0,
            ..SimParams::default()
        };
        let mut plant = plant_with(params, 8).with_event_capacity(16);
        for _ in 0..2_000 {
            plant.step();
        }
        assert_eq!(plant.events().len(), 16);
        assert!(plant.events().last_seq() > 16);
    }
}
