use serde::{Deserialize, Serialize};

/// Default loop for the first vehicle: the outer ring of the 3x3 rack grid,
/// starting at the top-left rack. The start is repeated to close the loop.
pub const FIRST_VEHICLE_LOOP: [usize; 9] = [0, 1, 2, 5, 8, 7, 6, 3, 0];

/// Default loop for the second vehicle, starting from the opposite corner.
pub const SECOND_VEHICLE_LOOP: [usize; 9] = [8, 7, 6, 3, 0, 1, 2, 5, 8];

/// A cyclic waypoint sequence plus the cursor of the current target.
///
/// Waypoints are indices into the plant's storage-location list. The cursor
/// wraps, so a route never ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    waypoints: Vec<usize>,
    cursor: usize,
}

impl Route {
    /// Build a route starting at its first waypoint. Returns `None` for an
    /// empty sequence.
    pub fn new(waypoints: Vec<usize>) -> Option<Self> {
        if waypoints.is_empty() {
            return None;
        }
        Some(Self {
            waypoints,
            cursor: 0,
        })
    }

    pub fn waypoints(&self) -> &[usize] {
        &self.waypoints
    }

    /// Index into `waypoints` of the current target.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Location index of the current target.
    pub fn target(&self) -> usize {
        self.peek(0)
    }

    /// Location index `ahead` stops after the current target, wrapping.
    pub fn peek(&self, ahead: usize) -> usize {
        self.waypoints[(self.cursor + ahead) % self.waypoints.len()]
    }

    /// Move the cursor to the next stop and return its location index.
    pub fn advance(&mut self) -> usize {
        self.cursor = (self.cursor + 1) % self.waypoints.len();
        self.target()
    }

    /// Largest location index the route refers to.
    pub fn max_waypoint(&self) -> usize {
        self.waypoints.iter().copied().max().unwrap_or(0)
    }
}
