//! Planar motion helpers used by the simulation tick.

use glam::DVec2;
use rand::Rng;

/// Outcome of advancing a position toward a target for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Still travelling; carries the new position.
    Moving(DVec2),
    /// Close enough to snap onto the target.
    Arrived,
}

/// Advance `from` toward `to` by at most `step`.
///
/// Arrival is decided on the distance *before* moving: once within
/// `epsilon` the caller snaps to the target. A step longer than the
/// remaining distance lands exactly on the target instead of overshooting.
pub fn step_toward(from: DVec2, to: DVec2, step: f64, epsilon: f64) -> Motion {
    let offset = to - from;
    let distance = offset.length();
    if distance < epsilon {
        return Motion::Arrived;
    }
    if step >= distance {
        return Motion::Moving(to);
    }
    let heading = offset.y.atan2(offset.x);
    Motion::Moving(from + DVec2::new(heading.cos(), heading.sin()) * step)
}

/// `count` points spread evenly along `start..end`, each jittered by a
/// uniform offset in `[-range/2, range/2)` on both axes.
///
/// Point `i` (1-based) sits at ratio `i / (count + 1)`, so neither endpoint
/// is repeated.
pub fn intermediate_points<R: Rng + ?Sized>(
    start: DVec2,
    end: DVec2,
    count: usize,
    range: f64,
    rng: &mut R,
) -> Vec<DVec2> {
    (1..=count)
        .map(|i| {
            let ratio = i as f64 / (count + 1) as f64;
            let base = start.lerp(end, ratio);
            let jitter = DVec2::new(
                (rng.r#gen::<f64>() - 0.5) * range,
                (rng.r#gen::<f64>() - 0.5) * range,
            );
            base + jitter
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn step_moves_by_fixed_distance() {
        match step_toward(DVec2::ZERO, DVec2::new(100.0, 0.0), 4.0, 5.0) {
            Motion::Moving(p) => assert!((p - DVec2::new(4.0, 0.0)).length() < 1e-9),
            Motion::Arrived => panic!("should still be moving"),
        }
    }

    #[test]
    fn step_follows_heading() {
        let Motion::Moving(p) = step_toward(DVec2::ZERO, DVec2::new(30.0, 40.0), 5.0, 5.0) else {
            panic!("should still be moving");
        };
        assert!((p - DVec2::new(3.0, 4.0)).length() < 1e-9);
    }

    #[test]
    fn within_epsilon_arrives() {
        let m = step_toward(DVec2::new(1.0, 1.0), DVec2::new(4.0, 4.0), 4.0, 5.0);
        assert_eq!(m, Motion::Arrived);
    }

    #[test]
    fn long_step_does_not_overshoot() {
        let m = step_toward(DVec2::ZERO, DVec2::new(6.0, 0.0), 50.0, 5.0);
        assert_eq!(m, Motion::Moving(DVec2::new(6.0, 0.0)));
    }

    #[test]
    fn intermediate_points_stay_near_segment() {
        let mut rng = StdRng::seed_from_u64(3);
        let start = DVec2::ZERO;
        let end = DVec2::new(90.0, 0.0);
        let pts = intermediate_points(start, end, 2, 15.0, &mut rng);
        assert_eq!(pts.len(), 2);
        for (p, expected_x) in pts.iter().zip([30.0, 60.0]) {
            assert!((p.x - expected_x).abs() <= 7.5);
            assert!(p.y.abs() <= 7.5);
        }
    }

    #[test]
    fn zero_range_means_no_jitter() {
        let mut rng = StdRng::seed_from_u64(9);
        let pts = intermediate_points(DVec2::ZERO, DVec2::new(0.0, 40.0), 3, 0.0, &mut rng);
        assert_eq!(
            pts,
            vec![
                DVec2::new(0.0, 10.0),
                DVec2::new(0.0, 20.0),
                DVec2::new(0.0, 30.0)
            ]
        );
    }
}
