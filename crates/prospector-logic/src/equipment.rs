//! Equipment summary of a mission vessel and the helpers that build it.
//!
//! The host scans its own structure; these helpers only reduce the raw
//! block facings and thrust figures into the counts the scheduler checks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the six local axes of a vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl Axis {
    /// Canonical order used for masks and messages.
    pub const ALL: [Axis; 6] = [
        Axis::Forward,
        Axis::Backward,
        Axis::Left,
        Axis::Right,
        Axis::Up,
        Axis::Down,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Axis::Forward => Axis::Backward,
            Axis::Backward => Axis::Forward,
            Axis::Left => Axis::Right,
            Axis::Right => Axis::Left,
            Axis::Up => Axis::Down,
            Axis::Down => Axis::Up,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Axis::Forward => 0,
            Axis::Backward => 1,
            Axis::Left => 2,
            Axis::Right => 3,
            Axis::Up => 4,
            Axis::Down => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::Forward => "Forward",
            Axis::Backward => "Backward",
            Axis::Left => "Left",
            Axis::Right => "Right",
            Axis::Up => "Up",
            Axis::Down => "Down",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Largest number of drills sharing one facing.
pub fn max_directional_count(facings: impl IntoIterator<Item = Axis>) -> u32 {
    let mut counts = [0u32; 6];
    for axis in facings {
        counts[axis.index()] += 1;
    }
    counts.into_iter().max().unwrap_or(0)
}

/// Axes a set of thrusters can push along. A thruster pushes opposite to
/// the way its nozzle faces.
pub fn thrust_coverage(facings: impl IntoIterator<Item = Axis>) -> [bool; 6] {
    let mut covered = [false; 6];
    for axis in facings {
        covered[axis.opposite().index()] = true;
    }
    covered
}

/// Best acceleration (m/s²) along any single axis. Zero without a
/// positive mass.
pub fn max_acceleration(max_thrust_per_axis: [f64; 6], mass: f64) -> f64 {
    if !(mass > 0.0) {
        return 0.0;
    }
    let thrust = max_thrust_per_axis
        .into_iter()
        .filter(|t| t.is_finite())
        .fold(0.0, f64::max);
    thrust / mass
}

/// What a vessel carries, as far as mission eligibility is concerned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentReport {
    /// Total drills aboard.
    pub drill_count: u32,
    /// Drills sharing the most common facing; feeds the models.
    pub max_directional_drill_count: u32,
    pub has_gyroscope: bool,
    pub has_cockpit: bool,
    pub has_antenna: bool,
    /// Covered push axes, indexed by [`Axis::index`].
    pub thruster_coverage: [bool; 6],
    pub max_acceleration: f64,
}

impl EquipmentReport {
    /// Uncovered push axes in canonical order.
    pub fn missing_thrust_axes(&self) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|axis| !self.thruster_coverage[axis.index()])
            .collect()
    }

    pub fn has_full_thrust_coverage(&self) -> bool {
        self.thruster_coverage.iter().all(|&c| c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposites_are_involutions() {
        for axis in Axis::ALL {
            assert_ne!(axis.opposite(), axis);
            assert_eq!(axis.opposite().opposite(), axis);
        }
    }

    #[test]
    fn test_max_directional_count() {
        assert_eq!(max_directional_count([]), 0);
        let drills = [Axis::Forward, Axis::Forward, Axis::Down, Axis::Forward, Axis::Down];
        assert_eq!(max_directional_count(drills), 3);
    }

    #[test]
    fn test_thrust_coverage_uses_opposite() {
        let covered = thrust_coverage([Axis::Backward]);
        assert!(covered[Axis::Forward.index()]);
        assert!(!covered[Axis::Backward.index()]);
    }

    #[test]
    fn test_missing_axes_order() {
        let report = EquipmentReport {
            thruster_coverage: thrust_coverage([Axis::Backward, Axis::Forward, Axis::Down]),
            ..EquipmentReport::default()
        };
        assert_eq!(
            report.missing_thrust_axes(),
            vec![Axis::Left, Axis::Right, Axis::Down]
        );
        assert!(!report.has_full_thrust_coverage());

        let full = EquipmentReport {
            thruster_coverage: thrust_coverage(Axis::ALL),
            ..EquipmentReport::default()
        };
        assert!(full.missing_thrust_axes().is_empty());
        assert!(full.has_full_thrust_coverage());
    }

    #[test]
    fn test_max_acceleration() {
        let thrust = [1000.0, 4000.0, 200.0, 200.0, 3000.0, 100.0];
        assert_eq!(max_acceleration(thrust, 800.0), 5.0);
        assert_eq!(max_acceleration(thrust, 0.0), 0.0);
        assert_eq!(max_acceleration(thrust, -1.0), 0.0);
        assert_eq!(max_acceleration(thrust, f64::NAN), 0.0);
    }
}
