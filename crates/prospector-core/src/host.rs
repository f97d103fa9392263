//! Collaborator interfaces the scheduler drives.
//!
//! The scheduler never touches entities, inventories or wallets directly.
//! A host implements these traits over whatever world it runs in; the
//! headless harness and the tests implement them over plain maps.

use prospector_logic::equipment::EquipmentReport;
use thiserror::Error;

use crate::entry::{IdentityId, OriginId, Placement, Vec3};

/// A collaborator call that could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("entity {0} not found")]
    NotFound(OriginId),
    #[error("{0}")]
    Failed(String),
}

/// Structural scan of a vessel.
pub trait EquipmentScanner {
    /// `None` when the origin does not exist or cannot be scanned.
    fn scan_equipment(&self, origin: OriginId) -> Option<EquipmentReport>;
}

/// Cargo inventories aboard a vessel.
pub trait CargoHold {
    /// Whether `units` of `ore` would fit into the vessel's free volume.
    fn cargo_capacity_for(&self, origin: OriginId, ore: &str, units: f64) -> bool;

    /// Insert up to `units` of `ore`; returns the amount actually inserted.
    fn deposit_resource(&mut self, origin: OriginId, ore: &str, units: f64)
        -> Result<f64, HostError>;
}

/// Identity balances.
pub trait Ledger {
    /// Try to debit `amount`; `false` when the balance is insufficient.
    fn charge_identity(&mut self, identity: IdentityId, amount: i64) -> bool;

    fn refund_identity(&mut self, identity: IdentityId, amount: i64) -> bool;
}

/// Entity lifecycle and placement.
pub trait EntityHost {
    fn placement_of(&self, origin: OriginId) -> Option<Placement>;

    /// Owner billed when the request names no payer.
    fn primary_owner(&self, origin: OriginId) -> Option<IdentityId>;

    /// Remove every occupant from the vessel.
    fn evacuate(&mut self, origin: OriginId) -> Result<(), HostError>;

    /// Zero linear and angular velocity.
    fn halt(&mut self, origin: OriginId) -> Result<(), HostError>;

    fn snapshot_entity(&mut self, origin: OriginId) -> Result<Vec<u8>, HostError>;

    fn remove_entity(&mut self, origin: OriginId) -> Result<(), HostError>;

    /// Recreate a vessel from a snapshot; returns the new entity's id.
    fn restore_entity(&mut self, snapshot: &[u8], placement: &Placement)
        -> Result<OriginId, HostError>;

    /// Nearest position to `near` where a body of `radius` fits.
    fn find_free_placement(&self, near: Vec3, radius: f64) -> Option<Vec3>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    Departure,
    Arrival,
}

/// A visual/audio cue at a world position.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue<'a> {
    pub kind: CueKind,
    pub origin: OriginId,
    pub effect: &'a str,
    pub sound: &'a str,
    pub position: Vec3,
}

pub trait CueSink {
    fn play_cue(&mut self, cue: &Cue<'_>);
}

/// Everything the scheduler needs from its host.
pub trait MissionHost: EquipmentScanner + CargoHold + Ledger + EntityHost + CueSink {}

impl<T> MissionHost for T where T: EquipmentScanner + CargoHold + Ledger + EntityHost + CueSink + ?Sized {}
