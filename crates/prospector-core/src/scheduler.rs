//! Mission scheduler: validation, settlement and the phase state machine.
//!
//! The scheduler owns the active mission set. A host opens it when the world
//! loads, calls [`MissionScheduler::tick`] from its update loop, routes
//! start requests to [`MissionScheduler::try_start`] and closes it on unload.
//! Every start and every tick that moves a mission rewrites the whole set to
//! storage.

use std::fmt;

use prospector_logic::duration::simulate_mission_seconds;
use prospector_logic::equipment::{Axis, EquipmentReport};
use prospector_logic::forecast::{format_duration, MissionForecast};
use prospector_logic::operator::OperatorAttributes;
use prospector_logic::pricing::{estimate_mission_cost, refund_amount};
use prospector_logic::random::UniformSource;
use prospector_logic::reliability::resolve_outcome;
use prospector_logic::yields::{estimate_yield_units, simulate_yield_units, MIN_YIELD_UNITS};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::config::SchedulerConfig;
use crate::entry::{IdentityId, MissionEntry, OriginId, Phase};
use crate::host::{Cue, CueKind, EquipmentScanner, HostError, MissionHost};
use crate::storage::{self, MissionStore, StorageError};

/// Whether this node may mutate missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Authority,
    Replica,
}

/// A request to launch a mission from `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct StartRequest {
    pub origin: OriginId,
    pub operator: OperatorAttributes,
    /// Requested ore; blank means the table's default ore.
    pub ore: String,
    pub length_scale: f64,
    /// Owner of the control block the request came from, billed first.
    pub requester: Option<IdentityId>,
}

impl StartRequest {
    pub fn new(origin: OriginId, operator: OperatorAttributes, ore: impl Into<String>) -> Self {
        Self {
            origin,
            operator,
            ore: ore.into(),
            length_scale: 1.0,
            requester: None,
        }
    }

    pub fn with_length_scale(mut self, length_scale: f64) -> Self {
        self.length_scale = length_scale;
        self
    }

    pub fn with_requester(mut self, requester: IdentityId) -> Self {
        self.requester = Some(requester);
        self
    }
}

/// Why a start request was refused. `Display` is the player-facing message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("Start mission on the server.")]
    NotAuthority,
    #[error("Vessel {0} is not available.")]
    OriginNotFound(OriginId),
    #[error("Mission already in progress.")]
    AlreadyActive,
    #[error("Requires at least {required} drills.")]
    NotEnoughDrills { required: u32, found: u32 },
    #[error("Requires at least 1 gyroscope.")]
    MissingGyroscope,
    #[error("Requires at least 1 cockpit.")]
    MissingCockpit,
    #[error("Missing thrusters: {}.", join_axes(.0))]
    MissingThrusters(Vec<Axis>),
    #[error("Requires at least 1 antenna.")]
    MissingAntenna,
    #[error("Not enough cargo space for the expected {ore} ore yield.")]
    InsufficientCargo { ore: String, units: f64 },
    #[error("No valid owner to charge for this mission.")]
    NoBillingIdentity,
    #[error("Not enough credits to start the mission.")]
    InsufficientFunds { cost: i64 },
}

fn join_axes(axes: &[Axis]) -> String {
    axes.iter().map(|a| a.name()).collect::<Vec<_>>().join(", ")
}

/// A successfully launched mission.
#[derive(Debug)]
pub struct MissionReceipt {
    pub origin: OriginId,
    pub ore: String,
    pub cost: i64,
    pub charged_to: IdentityId,
    pub planned_duration_seconds: f64,
    pub launch_deadline_tick: u64,
    /// Set when the record could not be written after the start.
    pub save_error: Option<StorageError>,
}

impl MissionReceipt {
    /// Player-facing confirmation, if there is anything to say.
    pub fn message(&self) -> Option<String> {
        (self.cost > 0).then(|| format!("Charged {} credits for the mission.", self.cost))
    }
}

/// Outcome of the early-return settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Nothing owed: the mission ran to term or cost no less early.
    NotDue,
    Refunded(i64),
    RefundFailed(i64),
}

/// What happened when a vessel came back.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnReport {
    pub origin: OriginId,
    /// Id of the recreated vessel.
    pub restored_as: OriginId,
    pub ore: String,
    pub yield_units: f64,
    pub delivered_units: f64,
    pub dropped_units: f64,
    pub failed: bool,
    pub settlement: Settlement,
}

impl ReturnReport {
    /// Player-facing messages in display order.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = vec![if self.failed {
            "Mission ended early.".to_string()
        } else {
            "Mission successful.".to_string()
        }];
        match self.settlement {
            Settlement::NotDue => {}
            Settlement::Refunded(amount) => {
                messages.push(format!("Refunded {} credits due to early return.", amount))
            }
            Settlement::RefundFailed(_) => {
                messages.push("Mission complete, but refund could not be issued.".to_string())
            }
        }
        messages
    }
}

/// One phase transition (or abandoned transition) during a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum MissionEvent {
    /// `mission_seconds` is the time actually flown; `planned_seconds` is the
    /// full simulated duration the charge was priced on.
    Departed {
        origin: OriginId,
        mission_seconds: f64,
        planned_seconds: f64,
        length_scale: f64,
    },
    Returned(ReturnReport),
    Completed { origin: OriginId },
    /// A collaborator failed mid-transition; the mission was abandoned.
    Dropped { origin: OriginId, phase: Phase, reason: HostError },
}

#[derive(Debug, Default)]
pub struct TickReport {
    pub events: Vec<MissionEvent>,
    /// Whether the active set was written this tick.
    pub persisted: bool,
    pub save_error: Option<StorageError>,
}

impl TickReport {
    pub fn transitions(&self) -> usize {
        self.events.len()
    }
}

/// Read-only view of a vessel's mission state.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionStatus {
    pub origin: OriginId,
    /// Projection for a new mission; `None` when the vessel cannot be scanned.
    pub forecast: Option<MissionForecast>,
    pub active_phase: Option<Phase>,
    pub remaining_seconds: Option<f64>,
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.forecast {
            Some(forecast) => write!(f, "{}", forecast)?,
            None => write!(f, "Mining Missions\nDrills detected: 0")?,
        }
        if let (Some(phase), Some(remaining)) = (self.active_phase, self.remaining_seconds) {
            write!(f, "\nActive mission: {} ({} left)", phase, format_duration(remaining))?;
        }
        Ok(())
    }
}

pub struct MissionScheduler {
    config: SchedulerConfig,
    role: Role,
    store: Box<dyn MissionStore>,
    rng: Box<dyn UniformSource>,
    active: Vec<MissionEntry>,
}

impl MissionScheduler {
    /// Construct a scheduler and, on the authority, resume stored missions
    /// against `now_tick`.
    pub fn open(
        config: SchedulerConfig,
        role: Role,
        mut store: Box<dyn MissionStore>,
        now_tick: u64,
    ) -> Self {
        let active = match role {
            Role::Authority => storage::load(store.as_mut(), now_tick, config.ticks_per_second),
            Role::Replica => Vec::new(),
        };
        if !active.is_empty() {
            log::info!("Resumed {} active mission(s)", active.len());
        }
        Self {
            config,
            role,
            store,
            rng: Box::new(StdRng::from_entropy()),
            active,
        }
    }

    /// Replace the random source the models draw from.
    pub fn with_source(mut self, rng: impl UniformSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Flush the active set and release the scheduler.
    pub fn close(mut self, now_tick: u64) -> Result<(), StorageError> {
        self.flush(now_tick)
    }

    pub fn flush(&mut self, now_tick: u64) -> Result<(), StorageError> {
        if self.role != Role::Authority {
            return Ok(());
        }
        storage::save(
            self.store.as_mut(),
            &self.active,
            now_tick,
            self.config.ticks_per_second,
        )
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn active(&self) -> &[MissionEntry] {
        &self.active
    }

    pub fn entry(&self, origin: OriginId) -> Option<&MissionEntry> {
        self.active.iter().find(|e| e.origin == origin)
    }

    pub fn is_active(&self, origin: OriginId) -> bool {
        self.entry(origin).is_some()
    }

    // ── Start ──────────────────────────────────────────────────────────

    /// Validate, price and launch a mission. Nothing is mutated on rejection.
    pub fn try_start<H: MissionHost + ?Sized>(
        &mut self,
        host: &mut H,
        request: &StartRequest,
        now_tick: u64,
    ) -> Result<MissionReceipt, Rejection> {
        if self.role != Role::Authority {
            return Err(Rejection::NotAuthority);
        }
        let origin = request.origin;
        // A stored vessel is out of the world, so this must precede the lookup.
        if self.is_active(origin) {
            return Err(Rejection::AlreadyActive);
        }
        let (Some(placement), Some(equipment)) =
            (host.placement_of(origin), host.scan_equipment(origin))
        else {
            return Err(Rejection::OriginNotFound(origin));
        };
        self.check_equipment(&equipment)?;

        let config = &self.config;
        let ores = &config.ores;
        let tuning = &config.tuning;
        let operator = request.operator.clamped();
        let ore = ores.resolve_name(&request.ore).to_string();
        let scale = config.clamp_length_scale(request.length_scale);
        let drills = equipment.max_directional_drill_count;

        let expected_yield = (estimate_yield_units(
            ores,
            &tuning.yield_model,
            operator.yield_skill,
            operator.skill,
            drills,
            &ore,
        ) * scale)
            .max(MIN_YIELD_UNITS);
        if !host.cargo_capacity_for(origin, &ore, expected_yield) {
            return Err(Rejection::InsufficientCargo {
                ore,
                units: expected_yield,
            });
        }

        let payer = request
            .requester
            .filter(|id| id.is_valid())
            .or_else(|| host.primary_owner(origin).filter(|id| id.is_valid()))
            .ok_or(Rejection::NoBillingIdentity)?;

        let rng = self.rng.as_mut();
        let sampled_yield = simulate_yield_units(
            ores,
            &tuning.yield_model,
            operator.yield_skill,
            &ore,
            expected_yield,
            rng,
        );
        let planned = simulate_mission_seconds(
            ores,
            &tuning.duration,
            operator.speed,
            &ore,
            equipment.max_acceleration,
            drills,
            scale,
            rng,
        );
        let outcome = resolve_outcome(operator.reliability, planned, &tuning.reliability, rng);
        let yield_units = (sampled_yield * outcome.yield_factor).max(MIN_YIELD_UNITS);
        let flown = planned * outcome.return_progress;
        log::debug!(
            "Simulated {} mission for {}: planned {:.1}s, flown {:.1}s, yield {:.1} (failure check {})",
            ore,
            origin,
            planned,
            flown,
            yield_units,
            outcome.failure_tick
        );

        let cost = estimate_mission_cost(ores, &tuning.pricing, operator.skill, &ore, planned);
        if cost > 0 && !host.charge_identity(payer, cost) {
            return Err(Rejection::InsufficientFunds { cost });
        }

        let deadline = config.deadline_after(now_tick, config.countdown_seconds);
        self.active.push(MissionEntry {
            origin,
            snapshot: Vec::new(),
            return_placement: placement,
            phase: Phase::Countdown,
            deadline_tick: deadline,
            remaining_seconds: config.countdown_seconds,
            ore: ore.clone(),
            planned_duration_seconds: planned,
            mission_duration_seconds: flown,
            length_scale: scale,
            yield_units,
            failed: outcome.failed,
            operator_skill: operator.skill,
            charge_identity: payer,
            full_mission_cost: cost,
        });
        log::info!(
            "Mission started for {}: {} x{:.2}, {} credits charged to {}",
            origin,
            ore,
            scale,
            cost,
            payer
        );

        let save_error = self.persist(now_tick);

        let cues = &self.config.cues;
        host.play_cue(&Cue {
            kind: CueKind::Departure,
            origin,
            effect: &cues.departure_effect,
            sound: &cues.departure_sound,
            position: placement.position,
        });

        Ok(MissionReceipt {
            origin,
            ore,
            cost,
            charged_to: payer,
            planned_duration_seconds: planned,
            launch_deadline_tick: deadline,
            save_error,
        })
    }

    fn check_equipment(&self, equipment: &EquipmentReport) -> Result<(), Rejection> {
        if equipment.drill_count < self.config.min_drills {
            return Err(Rejection::NotEnoughDrills {
                required: self.config.min_drills,
                found: equipment.drill_count,
            });
        }
        if !equipment.has_gyroscope {
            return Err(Rejection::MissingGyroscope);
        }
        if !equipment.has_cockpit {
            return Err(Rejection::MissingCockpit);
        }
        let missing = equipment.missing_thrust_axes();
        if !missing.is_empty() {
            return Err(Rejection::MissingThrusters(missing));
        }
        if !equipment.has_antenna {
            return Err(Rejection::MissingAntenna);
        }
        Ok(())
    }

    // ── Tick ───────────────────────────────────────────────────────────

    /// Advance every mission whose deadline has passed. A replica does
    /// nothing.
    pub fn tick<H: MissionHost + ?Sized>(&mut self, host: &mut H, now_tick: u64) -> TickReport {
        let mut report = TickReport::default();
        if self.role != Role::Authority {
            return report;
        }

        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|e| e.deadline_tick <= now_tick);
        self.active = waiting;
        if due.is_empty() {
            return report;
        }

        for entry in due {
            let origin = entry.origin;
            let phase = entry.phase;
            match self.advance(host, entry, now_tick) {
                Ok((event, next)) => {
                    report.events.push(event);
                    if let Some(next) = next {
                        self.active.push(next);
                    }
                }
                Err(reason) => {
                    log::warn!(
                        "Abandoning mission for {} during {}: {}",
                        origin,
                        phase,
                        reason
                    );
                    report.events.push(MissionEvent::Dropped {
                        origin,
                        phase,
                        reason,
                    });
                }
            }
        }

        report.save_error = self.persist(now_tick);
        report.persisted = report.save_error.is_none();
        report
    }

    /// Run one phase transition. Returns the event and the entry to keep, if
    /// the mission continues.
    fn advance<H: MissionHost + ?Sized>(
        &self,
        host: &mut H,
        entry: MissionEntry,
        now_tick: u64,
    ) -> Result<(MissionEvent, Option<MissionEntry>), HostError> {
        match entry.phase {
            Phase::Countdown => self.depart(host, entry, now_tick),
            Phase::Stored => self.arrive(host, entry, now_tick),
            Phase::Returning | Phase::Complete => {
                let mut entry = entry;
                entry.advance(now_tick);
                log::info!("Mission for {} complete", entry.origin);
                Ok((MissionEvent::Completed { origin: entry.origin }, None))
            }
        }
    }

    fn depart<H: MissionHost + ?Sized>(
        &self,
        host: &mut H,
        mut entry: MissionEntry,
        now_tick: u64,
    ) -> Result<(MissionEvent, Option<MissionEntry>), HostError> {
        let origin = entry.origin;
        if let Some(placement) = host.placement_of(origin) {
            entry.return_placement = placement;
        }
        host.evacuate(origin)?;
        host.halt(origin)?;
        let snapshot = host.snapshot_entity(origin)?;
        if snapshot.is_empty() {
            return Err(HostError::Failed(format!("empty snapshot for {}", origin)));
        }
        host.remove_entity(origin)?;

        let seconds = entry.mission_duration_seconds.max(0.0);
        entry.snapshot = snapshot;
        entry.advance(self.config.deadline_after(now_tick, seconds));
        log::info!(
            "Mission for {} departed at x{:.2}, back in {:.0}s of {:.0}s planned",
            origin,
            entry.length_scale,
            seconds,
            entry.planned_duration_seconds
        );
        Ok((
            MissionEvent::Departed {
                origin,
                mission_seconds: seconds,
                planned_seconds: entry.planned_duration_seconds,
                length_scale: entry.length_scale,
            },
            Some(entry),
        ))
    }

    fn arrive<H: MissionHost + ?Sized>(
        &self,
        host: &mut H,
        mut entry: MissionEntry,
        now_tick: u64,
    ) -> Result<(MissionEvent, Option<MissionEntry>), HostError> {
        let origin = entry.origin;
        let mut placement = entry.return_placement;
        if let Some(free) = host.find_free_placement(placement.position, placement.radius) {
            placement.position = free;
        }
        entry.return_placement = placement;

        let cues = &self.config.cues;
        host.play_cue(&Cue {
            kind: CueKind::Arrival,
            origin,
            effect: &cues.arrival_effect,
            sound: &cues.arrival_sound,
            position: placement.position,
        });

        let restored = host.restore_entity(&entry.snapshot, &placement)?;
        let delivered = host
            .deposit_resource(restored, &entry.ore, entry.yield_units)?
            .clamp(0.0, entry.yield_units);
        let dropped = entry.yield_units - delivered;
        if dropped > 0.0 {
            log::warn!(
                "Dropped {:.1} {} that did not fit aboard {}",
                dropped,
                entry.ore,
                restored
            );
        }

        let settlement = self.settle(host, &entry);
        let report = ReturnReport {
            origin,
            restored_as: restored,
            ore: entry.ore.clone(),
            yield_units: entry.yield_units,
            delivered_units: delivered,
            dropped_units: dropped,
            failed: entry.failed,
            settlement,
        };
        log::info!(
            "Mission for {} returned as {}: {}, delivered {:.1} {}",
            origin,
            restored,
            if entry.failed { "ended early" } else { "successful" },
            delivered,
            entry.ore
        );

        // The recreated vessel is now the one the mission is tied to.
        entry.origin = restored;
        entry.advance(
            self.config
                .deadline_after(now_tick, self.config.return_effect_seconds),
        );
        Ok((MissionEvent::Returned(report), Some(entry)))
    }

    fn settle<H: MissionHost + ?Sized>(&self, host: &mut H, entry: &MissionEntry) -> Settlement {
        let config = &self.config;
        let actual = estimate_mission_cost(
            &config.ores,
            &config.tuning.pricing,
            entry.operator_skill,
            &entry.ore,
            entry.mission_duration_seconds,
        );
        let refund = refund_amount(entry.full_mission_cost, actual, entry.failed);
        if refund <= 0 {
            return Settlement::NotDue;
        }
        if entry.charge_identity.is_valid() && host.refund_identity(entry.charge_identity, refund) {
            log::info!("Refunded {} credits to {}", refund, entry.charge_identity);
            Settlement::Refunded(refund)
        } else {
            log::warn!(
                "Refund of {} credits to {} could not be issued",
                refund,
                entry.charge_identity
            );
            Settlement::RefundFailed(refund)
        }
    }

    fn persist(&mut self, now_tick: u64) -> Option<StorageError> {
        match self.flush(now_tick) {
            Ok(()) => None,
            Err(e) => {
                log::error!("Failed to save active missions: {}", e);
                Some(e)
            }
        }
    }

    // ── Status ─────────────────────────────────────────────────────────

    /// Side-effect-free status of `origin`, projecting a mission with the
    /// given selection.
    pub fn status<S: EquipmentScanner + ?Sized>(
        &self,
        scanner: &S,
        origin: OriginId,
        operator: OperatorAttributes,
        ore: &str,
        length_scale: f64,
        now_tick: u64,
    ) -> MissionStatus {
        let forecast = scanner.scan_equipment(origin).map(|equipment| {
            MissionForecast::project(
                &self.config.ores,
                &self.config.tuning,
                operator,
                ore,
                &equipment,
                self.config.clamp_length_scale(length_scale),
            )
        });
        let active = self.entry(origin);
        MissionStatus {
            origin,
            forecast,
            active_phase: active.map(|e| e.phase),
            remaining_seconds: active.map(|e| {
                self.config
                    .ticks_to_seconds(e.deadline_tick.saturating_sub(now_tick))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            Rejection::NotEnoughDrills { required: 2, found: 1 }.to_string(),
            "Requires at least 2 drills."
        );
        assert_eq!(
            Rejection::MissingThrusters(vec![Axis::Left, Axis::Down]).to_string(),
            "Missing thrusters: Left, Down."
        );
        assert_eq!(
            Rejection::InsufficientCargo { ore: "Gold".into(), units: 5.0 }.to_string(),
            "Not enough cargo space for the expected Gold ore yield."
        );
        assert_eq!(Rejection::NotAuthority.to_string(), "Start mission on the server.");
    }

    #[test]
    fn test_return_messages() {
        let mut report = ReturnReport {
            origin: OriginId(1),
            restored_as: OriginId(2),
            ore: "Iron".into(),
            yield_units: 10.0,
            delivered_units: 10.0,
            dropped_units: 0.0,
            failed: false,
            settlement: Settlement::NotDue,
        };
        assert_eq!(report.messages(), vec!["Mission successful."]);

        report.failed = true;
        report.settlement = Settlement::Refunded(1200);
        assert_eq!(
            report.messages(),
            vec!["Mission ended early.", "Refunded 1200 credits due to early return."]
        );

        report.settlement = Settlement::RefundFailed(1200);
        assert_eq!(
            report.messages()[1],
            "Mission complete, but refund could not be issued."
        );
    }

    #[test]
    fn test_receipt_message_only_when_charged() {
        let mut receipt = MissionReceipt {
            origin: OriginId(1),
            ore: "Iron".into(),
            cost: 0,
            charged_to: IdentityId(1),
            planned_duration_seconds: 90.0,
            launch_deadline_tick: 600,
            save_error: None,
        };
        assert!(receipt.message().is_none());
        receipt.cost = 2000;
        assert_eq!(
            receipt.message().as_deref(),
            Some("Charged 2000 credits for the mission.")
        );
    }
}
