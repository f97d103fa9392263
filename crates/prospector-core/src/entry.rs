//! Mission records and the phase state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the entity (vessel) a mission was launched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OriginId(pub i64);

/// Identifier of a billing identity (wallet owner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityId(pub i64);

impl IdentityId {
    /// Non-positive identities are never billable.
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "identity {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, -1.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(self, other: Self) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Where a vessel sits and how it is oriented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    /// Bounding radius, used to find a free spot on return.
    pub radius: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::FORWARD,
            up: Vec3::UP,
            radius: 0.0,
        }
    }
}

/// Lifecycle phase of a mission.
///
/// `Countdown → Stored → Returning → Complete`. Every transition goes
/// through [`Phase::next`]; `Complete` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Departure effect is playing; the vessel is still in the world.
    Countdown,
    /// The vessel is out of the world, held as a snapshot.
    Stored,
    /// The vessel is back; the arrival effect is playing.
    Returning,
    Complete,
}

impl Phase {
    pub fn next(self) -> Self {
        match self {
            Phase::Countdown => Phase::Stored,
            Phase::Stored => Phase::Returning,
            Phase::Returning | Phase::Complete => Phase::Complete,
        }
    }

    /// Whether the vessel exists only as a snapshot blob in this phase.
    pub fn holds_snapshot(self) -> bool {
        matches!(self, Phase::Stored | Phase::Returning)
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Countdown => "countdown",
            Phase::Stored => "stored",
            Phase::Returning => "returning",
            Phase::Complete => "complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One in-flight mission. Owned by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionEntry {
    pub origin: OriginId,
    /// Opaque vessel snapshot; non-empty exactly while the phase holds one.
    pub snapshot: Vec<u8>,
    pub return_placement: Placement,
    pub phase: Phase,
    /// Absolute deadline on the scheduler clock. Not persisted; rebuilt from
    /// `remaining_seconds` on load.
    #[serde(skip)]
    pub deadline_tick: u64,
    /// Seconds left in the current phase as of the last save.
    pub remaining_seconds: f64,
    pub ore: String,
    /// Simulated full mission time the charge was priced on.
    pub planned_duration_seconds: f64,
    /// Time actually flown; shorter than planned after an early return.
    pub mission_duration_seconds: f64,
    pub length_scale: f64,
    pub yield_units: f64,
    pub failed: bool,
    pub operator_skill: u8,
    pub charge_identity: IdentityId,
    pub full_mission_cost: i64,
}

impl MissionEntry {
    pub fn has_snapshot(&self) -> bool {
        !self.snapshot.is_empty()
    }

    /// The snapshot invariant: a blob is held iff the phase calls for one.
    pub fn is_consistent(&self) -> bool {
        self.has_snapshot() == self.phase.holds_snapshot()
    }

    /// Move to the next phase with a new deadline.
    pub fn advance(&mut self, deadline_tick: u64) {
        self.phase = self.phase.next();
        self.deadline_tick = deadline_tick;
        if !self.phase.holds_snapshot() {
            self.snapshot = Vec::new();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> MissionEntry {
        MissionEntry {
            origin: OriginId(7),
            snapshot: Vec::new(),
            return_placement: Placement::default(),
            phase: Phase::Countdown,
            deadline_tick: 600,
            remaining_seconds: 0.0,
            ore: "Iron".into(),
            planned_duration_seconds: 600.0,
            mission_duration_seconds: 600.0,
            length_scale: 1.0,
            yield_units: 100.0,
            failed: false,
            operator_skill: 0,
            charge_identity: IdentityId(1),
            full_mission_cost: 2000,
        }
    }

    #[test]
    fn test_phase_order() {
        assert_eq!(Phase::Countdown.next(), Phase::Stored);
        assert_eq!(Phase::Stored.next(), Phase::Returning);
        assert_eq!(Phase::Returning.next(), Phase::Complete);
        assert_eq!(Phase::Complete.next(), Phase::Complete);
    }

    #[test]
    fn test_advance_releases_snapshot_on_complete() {
        let mut e = entry();
        assert!(e.is_consistent());
        e.snapshot = vec![1, 2, 3];
        e.advance(1200);
        assert_eq!(e.phase, Phase::Stored);
        assert!(e.is_consistent());
        e.advance(1800);
        assert_eq!(e.phase, Phase::Returning);
        assert!(e.has_snapshot());
        e.advance(2400);
        assert_eq!(e.phase, Phase::Complete);
        assert!(!e.has_snapshot());
        assert!(e.is_consistent());
    }

    #[test]
    fn test_identity_validity() {
        assert!(IdentityId(5).is_valid());
        assert!(!IdentityId(0).is_valid());
        assert!(!IdentityId(-3).is_valid());
    }
}
