//! In-memory host for headless runs and tests.
//!
//! Vessels, cargo and wallets live in plain maps; snapshots are the vessel
//! serialized to JSON. Any collaborator call can be made to fail on demand.

use std::collections::{BTreeMap, HashMap};

use prospector_logic::equipment::{thrust_coverage, Axis, EquipmentReport};
use serde::{Deserialize, Serialize};

use crate::entry::{IdentityId, OriginId, Placement, Vec3};
use crate::host::{CargoHold, Cue, CueKind, CueSink, EntityHost, EquipmentScanner, HostError, Ledger};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub placement: Placement,
    pub equipment: EquipmentReport,
    pub owner: Option<IdentityId>,
    /// Total cargo volume in ore units.
    pub cargo_capacity: f64,
    pub cargo: BTreeMap<String, f64>,
    pub occupants: u32,
    pub velocity: Vec3,
}

impl Vessel {
    /// A fully equipped mining vessel: four forward drills, thrust on every
    /// axis, 5 m/s² acceleration.
    pub fn mining_rig(owner: IdentityId, position: Vec3) -> Self {
        Self {
            placement: Placement {
                position,
                radius: 12.0,
                ..Placement::default()
            },
            equipment: EquipmentReport {
                drill_count: 4,
                max_directional_drill_count: 4,
                has_gyroscope: true,
                has_cockpit: true,
                has_antenna: true,
                thruster_coverage: thrust_coverage(Axis::ALL),
                max_acceleration: 5.0,
            },
            owner: Some(owner),
            cargo_capacity: 100_000.0,
            cargo: BTreeMap::new(),
            occupants: 1,
            velocity: Vec3::new(0.0, 0.0, 3.0),
        }
    }

    pub fn cargo_used(&self) -> f64 {
        self.cargo.values().sum()
    }

    pub fn cargo_free(&self) -> f64 {
        (self.cargo_capacity - self.cargo_used()).max(0.0)
    }
}

/// Collaborator call that [`SandboxHost::fail_on`] can break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Evacuate,
    Halt,
    Snapshot,
    Remove,
    Restore,
    Deposit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayedCue {
    pub kind: CueKind,
    pub origin: OriginId,
    pub effect: String,
    pub sound: String,
    pub position: Vec3,
}

#[derive(Debug, Default)]
pub struct SandboxHost {
    vessels: BTreeMap<OriginId, Vessel>,
    wallets: HashMap<IdentityId, i64>,
    next_id: i64,
    failures: Vec<FailurePoint>,
    pub cues: Vec<PlayedCue>,
    /// Number of ledger calls, charges and refunds alike.
    pub ledger_calls: u32,
}

impl SandboxHost {
    pub fn new() -> Self {
        Self {
            next_id: 1000,
            ..Self::default()
        }
    }

    pub fn add_vessel(&mut self, vessel: Vessel) -> OriginId {
        let id = OriginId(self.next_id);
        self.next_id += 1;
        self.vessels.insert(id, vessel);
        id
    }

    pub fn vessel(&self, id: OriginId) -> Option<&Vessel> {
        self.vessels.get(&id)
    }

    pub fn vessel_mut(&mut self, id: OriginId) -> Option<&mut Vessel> {
        self.vessels.get_mut(&id)
    }

    pub fn vessel_count(&self) -> usize {
        self.vessels.len()
    }

    pub fn set_balance(&mut self, identity: IdentityId, amount: i64) {
        self.wallets.insert(identity, amount);
    }

    pub fn close_wallet(&mut self, identity: IdentityId) {
        self.wallets.remove(&identity);
    }

    pub fn balance(&self, identity: IdentityId) -> Option<i64> {
        self.wallets.get(&identity).copied()
    }

    /// Make every later call at `point` fail.
    pub fn fail_on(&mut self, point: FailurePoint) {
        if !self.failures.contains(&point) {
            self.failures.push(point);
        }
    }

    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    fn check(&self, point: FailurePoint) -> Result<(), HostError> {
        if self.failures.contains(&point) {
            Err(HostError::Failed(format!("{:?} is broken", point)))
        } else {
            Ok(())
        }
    }

    fn vessel_or_err(&mut self, id: OriginId) -> Result<&mut Vessel, HostError> {
        self.vessels.get_mut(&id).ok_or(HostError::NotFound(id))
    }
}

impl EquipmentScanner for SandboxHost {
    fn scan_equipment(&self, origin: OriginId) -> Option<EquipmentReport> {
        self.vessels.get(&origin).map(|v| v.equipment.clone())
    }
}

impl CargoHold for SandboxHost {
    fn cargo_capacity_for(&self, origin: OriginId, _ore: &str, units: f64) -> bool {
        self.vessels
            .get(&origin)
            .is_some_and(|v| v.cargo_free() >= units)
    }

    fn deposit_resource(&mut self, origin: OriginId, ore: &str, units: f64) -> Result<f64, HostError> {
        self.check(FailurePoint::Deposit)?;
        let vessel = self.vessel_or_err(origin)?;
        let inserted = units.max(0.0).min(vessel.cargo_free());
        if inserted > 0.0 {
            *vessel.cargo.entry(ore.to_string()).or_insert(0.0) += inserted;
        }
        Ok(inserted)
    }
}

impl Ledger for SandboxHost {
    fn charge_identity(&mut self, identity: IdentityId, amount: i64) -> bool {
        self.ledger_calls += 1;
        match self.wallets.get_mut(&identity) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                true
            }
            _ => false,
        }
    }

    fn refund_identity(&mut self, identity: IdentityId, amount: i64) -> bool {
        self.ledger_calls += 1;
        match self.wallets.get_mut(&identity) {
            Some(balance) => {
                *balance += amount;
                true
            }
            None => false,
        }
    }
}

impl EntityHost for SandboxHost {
    fn placement_of(&self, origin: OriginId) -> Option<Placement> {
        self.vessels.get(&origin).map(|v| v.placement)
    }

    fn primary_owner(&self, origin: OriginId) -> Option<IdentityId> {
        self.vessels.get(&origin).and_then(|v| v.owner)
    }

    fn evacuate(&mut self, origin: OriginId) -> Result<(), HostError> {
        self.check(FailurePoint::Evacuate)?;
        self.vessel_or_err(origin)?.occupants = 0;
        Ok(())
    }

    fn halt(&mut self, origin: OriginId) -> Result<(), HostError> {
        self.check(FailurePoint::Halt)?;
        self.vessel_or_err(origin)?.velocity = Vec3::ZERO;
        Ok(())
    }

    fn snapshot_entity(&mut self, origin: OriginId) -> Result<Vec<u8>, HostError> {
        self.check(FailurePoint::Snapshot)?;
        let vessel = self.vessel_or_err(origin)?;
        serde_json::to_vec(vessel).map_err(|e| HostError::Failed(e.to_string()))
    }

    fn remove_entity(&mut self, origin: OriginId) -> Result<(), HostError> {
        self.check(FailurePoint::Remove)?;
        self.vessels
            .remove(&origin)
            .map(|_| ())
            .ok_or(HostError::NotFound(origin))
    }

    fn restore_entity(&mut self, snapshot: &[u8], placement: &Placement) -> Result<OriginId, HostError> {
        self.check(FailurePoint::Restore)?;
        let mut vessel: Vessel =
            serde_json::from_slice(snapshot).map_err(|e| HostError::Failed(e.to_string()))?;
        vessel.placement = *placement;
        Ok(self.add_vessel(vessel))
    }

    fn find_free_placement(&self, near: Vec3, radius: f64) -> Option<Vec3> {
        let blocked = |p: Vec3| {
            self.vessels
                .values()
                .any(|v| v.placement.position.distance(p) < v.placement.radius + radius)
        };
        // Step sideways until clear.
        (0..32)
            .map(|i| Vec3::new(near.x + f64::from(i) * 2.0 * radius.max(1.0), near.y, near.z))
            .find(|&p| !blocked(p))
    }
}

impl CueSink for SandboxHost {
    fn play_cue(&mut self, cue: &Cue<'_>) {
        self.cues.push(PlayedCue {
            kind: cue.kind,
            origin: cue.origin,
            effect: cue.effect.to_string(),
            sound: cue.sound.to_string(),
            position: cue.position,
        });
    }
}
