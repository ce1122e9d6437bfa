//! World-space location math

use serde::{Deserialize, Serialize};

/// A point in world space.
///
/// Value type: callers compare and interpolate locations, only the owning
/// entity's state machine ever replaces one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another location
    pub fn distance_to(&self, other: &Location) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Move `step` units along the straight line toward `target`.
    ///
    /// Snaps to `target` when `step` covers the remaining distance, so a
    /// caller can detect arrival by comparing the result against the target.
    pub fn step_toward(&self, target: &Location, step: f64) -> Location {
        let total = self.distance_to(target);
        if step >= total || total <= f64::EPSILON {
            return *target;
        }
        let fraction = step / total;
        Location {
            x: self.x + (target.x - self.x) * fraction,
            y: self.y + (target.y - self.y) * fraction,
            z: self.z + (target.z - self.z) * fraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Location::new(0.0, 0.0, 0.0);
        let b = Location::new(3.0, 4.0, 0.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
        assert!((b.distance_to(&a) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn step_toward_moves_along_direction() {
        let a = Location::new(0.0, 0.0, 0.0);
        let b = Location::new(10.0, 0.0, 0.0);
        let mid = a.step_toward(&b, 4.0);
        assert!((mid.x - 4.0).abs() < 1e-9);
        assert_eq!(mid.y, 0.0);
        assert_eq!(mid.z, 0.0);
    }

    #[test]
    fn step_toward_snaps_on_overshoot() {
        let a = Location::new(0.0, 0.0, 0.0);
        let b = Location::new(1.0, 1.0, 1.0);
        assert_eq!(a.step_toward(&b, 100.0), b);
    }

    #[test]
    fn step_toward_at_target_stays_put() {
        let a = Location::new(2.0, 2.0, 2.0);
        assert_eq!(a.step_toward(&a, 1.0), a);
    }
}
