use scada_common::{LocationId, OccupancyStatus, Point, VehicleId, VehicleStatus};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A state change recorded by the plant.
///
/// Sequence numbers are assigned in commit order and never reused, so a
/// poller can ask for everything after the last sequence it has seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantEvent {
    pub seq: u64,
    pub tick: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventKind {
    /// Vehicle reached its target; `waypoint` is the location index of the
    /// next target.
    #[serde(rename_all = "camelCase")]
    Arrived {
        vehicle: VehicleId,
        reached: LocationId,
        waypoint: usize,
    },
    #[serde(rename_all = "camelCase")]
    OccupancyToggled {
        location: LocationId,
        status: OccupancyStatus,
        current_capacity: u32,
    },
    StatusChanged {
        vehicle: VehicleId,
        old: VehicleStatus,
        new: VehicleStatus,
    },
    /// Manual status/position override from an operator.
    VehicleOverridden {
        vehicle: VehicleId,
        status: Option<VehicleStatus>,
        position: Option<Point>,
    },
    /// Simulation advanced one tick; `seed` is the seed after advancing.
    Stepped { seed: u64 },
}

/// Bounded, append-only event history. The oldest entries fall off once
/// `capacity` is reached.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<PlantEvent>,
    capacity: usize,
    next_seq: u64,
}

impl EventLog {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
            capacity: capacity.max(1),
            next_seq: 1,
        }
    }

    /// Record an event and return its sequence number.
    pub fn push(&mut self, tick: u64, kind: EventKind) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(PlantEvent { seq, tick, kind });
        seq
    }

    /// Events with a sequence number strictly greater than `seq`, oldest
    /// first. Entries already evicted are silently absent.
    pub fn since(&self, seq: u64) -> Vec<PlantEvent> {
        let start = self.entries.partition_point(|e| e.seq <= seq);
        self.entries.range(start..).cloned().collect()
    }

    /// Sequence number of the newest event, or 0 if none was ever recorded.
    pub fn last_seq(&self) -> u64 {
        self.next_seq - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlantEvent> {
        self.entries.iter()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_change(n: u64) -> EventKind {
        EventKind::StatusChanged {
            vehicle: VehicleId::new(format!("AGV-{n:03}")),
            old: VehicleStatus::Idle,
            new: VehicleStatus::Running,
        }
    }

    #[test]
    fn sequence_numbers_start_at_one() {
        let mut log = EventLog::default();
        assert_eq!(log.last_seq(), 0);
        assert_eq!(log.push(1, status_change(1)), 1);
        assert_eq!(log.push(1, status_change(2)), 2);
        assert_eq!(log.last_seq(), 2);
    }

    #[test]
    fn since_returns_newer_events_only() {
        let mut log = EventLog::default();
        for tick in 0..5 {
            log.push(tick, status_change(tick));
        }
        let newer: Vec<u64> = log.since(3).iter().map(|e| e.seq).collect();
        assert_eq!(newer, vec![4, 5]);
        assert!(log.since(5).is_empty());
        assert_eq!(log.since(0).len(), 5);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut log = EventLog::with_capacity(3);
        for tick in 0..10 {
            log.push(tick, status_change(tick));
        }
        assert_eq!(log.len(), 3);
        let seqs: Vec<u64> = log.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![8, 9, 10]);
        assert_eq!(log.since(2).len(), 3);
    }

    #[test]
    fn wire_format_is_tagged() {
        let mut log = EventLog::default();
        log.push(
            7,
            EventKind::OccupancyToggled {
                location: LocationId::from("L4"),
                status: OccupancyStatus::Occupied,
                current_capacity: 12,
            },
        );
        let json = serde_json::to_value(log.iter().next().unwrap()).unwrap();
        assert_eq!(json["type"], "occupancyToggled");
        assert_eq!(json["seq"], 1);
        assert_eq!(json["tick"], 7);
        assert_eq!(json["currentCapacity"], 12);
    }

    #[test]
    fn stepped_wire_format() {
        let mut log = EventLog::default();
        log.push(3, EventKind::Stepped { seed: 99 });
        let json = serde_json::to_value(log.iter().next().unwrap()).unwrap();
        assert_eq!(json["type"], "stepped");
        assert_eq!(json["tick"], 3);
        assert_eq!(json["seed"], 99);
    }
}
