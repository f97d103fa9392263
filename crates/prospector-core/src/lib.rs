//! Prospector Core - mission scheduling engine
//!
//! Launches vessels on timed mining missions, holds them out of the world
//! while they are away, and brings them back with simulated cargo. The
//! numbers come from `prospector-logic`; this crate owns the state machine,
//! the settlement against the payer's balance and the durable record of
//! missions in flight.
//!
//! # Architecture
//!
//! - **Entries**: one [`entry::MissionEntry`] per mission, moving through
//!   `Countdown → Stored → Returning → Complete`
//! - **Scheduler**: validates starts, charges, and advances due entries on
//!   each tick
//! - **Host**: the world behind narrow traits (scan, cargo, ledger,
//!   entities, cues)
//! - **Storage**: versioned bincode record, base64 text, atomic file writes
//!
//! # Example
//!
//! ```rust,no_run
//! use prospector_core::prelude::*;
//!
//! let mut host = SandboxHost::new();
//! let owner = IdentityId(1);
//! host.set_balance(owner, 50_000);
//! let vessel = host.add_vessel(Vessel::mining_rig(owner, Vec3::ZERO));
//!
//! let store = Box::new(FileStore::new("missions.bin"));
//! let mut scheduler = MissionScheduler::open(SchedulerConfig::default(), Role::Authority, store, 0);
//! let request = StartRequest::new(vessel, OperatorAttributes::new(3, 3, 3, 3), "Iron");
//! scheduler.try_start(&mut host, &request, 0).unwrap();
//!
//! let mut tick = 0;
//! while !scheduler.active().is_empty() {
//!     tick += 60;
//!     scheduler.tick(&mut host, tick);
//! }
//! scheduler.close(tick).unwrap();
//! ```

pub mod config;
pub mod entry;
pub mod host;
pub mod sandbox;
pub mod scheduler;
pub mod storage;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::config::SchedulerConfig;
    pub use crate::entry::{IdentityId, MissionEntry, OriginId, Phase, Placement, Vec3};
    pub use crate::host::MissionHost;
    pub use crate::sandbox::{SandboxHost, Vessel};
    pub use crate::scheduler::{
        MissionEvent, MissionScheduler, Rejection, Role, StartRequest, TickReport,
    };
    pub use crate::storage::{FileStore, MemoryStore, MissionStore};
    pub use prospector_logic::operator::OperatorAttributes;
}
