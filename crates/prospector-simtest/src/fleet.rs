//! Lifecycle sections: a small fleet flown end to end through the real
//! scheduler, file store and sandbox world.

use std::collections::HashMap;

use prospector_core::host::{CueKind, EntityHost};
use prospector_core::prelude::*;
use prospector_core::scheduler::Settlement;
use prospector_logic::ores::OreTable;
use prospector_logic::tuning::SimulationTuning;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::TestResult;

/// Scheduler ticks advanced per harness step (one second at 60 Hz).
const STEP_TICKS: u64 = 60;
const STARTING_BALANCE: i64 = 1_000_000;

struct Sortie {
    operator: OperatorAttributes,
    ore: &'static str,
    length_scale: f64,
}

fn sorties() -> Vec<Sortie> {
    let sortie = |skill, ore, length_scale| Sortie {
        operator: OperatorAttributes::new(skill, skill, skill, skill),
        ore,
        length_scale,
    };
    vec![
        sortie(0, "Stone", 1.0),
        sortie(1, "Iron", 0.5),
        sortie(2, "Nickel", 1.5),
        sortie(3, "Cobalt", 1.0),
        sortie(4, "Gold", 2.0),
        sortie(5, "Platinum", 4.0),
        sortie(0, "Uranium", 4.0),
        sortie(5, "Ice", 0.25),
    ]
}

fn config(ores: &OreTable, tuning: &SimulationTuning) -> SchedulerConfig {
    SchedulerConfig {
        ores: ores.clone(),
        tuning: tuning.clone(),
        ..SchedulerConfig::default()
    }
}

/// One vessel per sortie, each with its own owner and wallet.
fn launch_fleet(
    host: &mut SandboxHost,
    scheduler: &mut MissionScheduler,
    results: &mut Vec<TestResult>,
) -> HashMap<IdentityId, i64> {
    let mut charged = HashMap::new();
    let mut rejected = Vec::new();
    for (i, sortie) in sorties().iter().enumerate() {
        let owner = IdentityId(i as i64 + 1);
        host.set_balance(owner, STARTING_BALANCE);
        let position = Vec3::new(0.0, 0.0, i as f64 * 200.0);
        let vessel = host.add_vessel(Vessel::mining_rig(owner, position));
        let request = StartRequest::new(vessel, sortie.operator, sortie.ore)
            .with_length_scale(sortie.length_scale);
        match scheduler.try_start(host, &request, 0) {
            Ok(receipt) => {
                *charged.entry(receipt.charged_to).or_insert(0) += receipt.cost;
            }
            Err(e) => rejected.push(format!("{}: {}", sortie.ore, e)),
        }
    }
    results.push(TestResult::check(
        "fleet_launch",
        rejected.is_empty(),
        if rejected.is_empty() {
            format!("{} missions launched", scheduler.active().len())
        } else {
            format!("rejected: {:?}", rejected)
        },
    ));
    charged
}

/// Entry invariants that must hold between ticks.
fn check_world(host: &SandboxHost, scheduler: &MissionScheduler) -> Result<(), String> {
    for entry in scheduler.active() {
        if !entry.is_consistent() {
            return Err(format!("{} inconsistent in {}", entry.origin, entry.phase));
        }
        let present = host.vessel(entry.origin).is_some();
        let expected = entry.phase != Phase::Stored;
        if present != expected {
            return Err(format!(
                "{} in {} but present in world = {}",
                entry.origin, entry.phase, present
            ));
        }
    }
    Ok(())
}

// ── 6. Fleet Lifecycle ──────────────────────────────────────────────────

pub fn validate_fleet_lifecycle(
    ores: &OreTable,
    tuning: &SimulationTuning,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Fleet Lifecycle ---");
    let mut results = Vec::new();
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            results.push(TestResult::check("fleet_storage", false, e.to_string()));
            return results;
        }
    };

    let mut host = SandboxHost::new();
    let config = config(ores, tuning);
    let store = Box::new(FileStore::in_dir(dir.path(), &config.storage_file));
    let mut scheduler = MissionScheduler::open(config, Role::Authority, store, 0)
        .with_source(StdRng::seed_from_u64(42));

    let charged = launch_fleet(&mut host, &mut scheduler, &mut results);
    let vessel_count = sorties().len();

    let mut refunded: HashMap<IdentityId, i64> = HashMap::new();
    let mut returns = Vec::new();
    let mut dropped = Vec::new();
    let mut violation = None;
    let mut now = 0;
    let limit = scheduler
        .config()
        .seconds_to_ticks(tuning.duration.max_mission_seconds + 3600.0);

    while !scheduler.active().is_empty() && now < limit {
        now += STEP_TICKS;
        let report = scheduler.tick(&mut host, now);
        if let Some(e) = &report.save_error {
            violation.get_or_insert(format!("save failed at tick {}: {}", now, e));
        }
        for event in report.events {
            match event {
                MissionEvent::Returned(ret) => {
                    if let Settlement::Refunded(amount) = ret.settlement {
                        let payer = host.primary_owner(ret.restored_as);
                        if let Some(payer) = payer {
                            *refunded.entry(payer).or_insert(0) += amount;
                        }
                    }
                    if verbose {
                        println!(
                            "  t={:>6}s {} -> {} {:.1} {} ({})",
                            now / STEP_TICKS,
                            ret.origin,
                            ret.restored_as,
                            ret.delivered_units,
                            ret.ore,
                            ret.messages().join(" ")
                        );
                    }
                    returns.push(ret);
                }
                MissionEvent::Dropped { origin, phase, reason } => {
                    dropped.push(format!("{} in {}: {}", origin, phase, reason));
                }
                MissionEvent::Departed { .. } | MissionEvent::Completed { .. } => {}
            }
        }
        if violation.is_none() {
            if let Err(e) = check_world(&host, &scheduler) {
                violation = Some(format!("tick {}: {}", now, e));
            }
        }
    }

    results.push(TestResult::check(
        "fleet_all_complete",
        scheduler.active().is_empty() && dropped.is_empty(),
        format!(
            "{} returned, {} dropped, {} still active after {}s",
            returns.len(),
            dropped.len(),
            scheduler.active().len(),
            now / STEP_TICKS
        ),
    ));

    results.push(TestResult::check(
        "fleet_invariants",
        violation.is_none(),
        violation.unwrap_or_else(|| "entries consistent every tick".into()),
    ));

    results.push(TestResult::check(
        "fleet_vessels_restored",
        host.vessel_count() == vessel_count,
        format!("{} of {} vessels back in the world", host.vessel_count(), vessel_count),
    ));

    let cargo_ok = returns.iter().all(|ret| {
        host.vessel(ret.restored_as).is_some_and(|v| {
            let held = v.cargo.get(&ret.ore).copied().unwrap_or(0.0);
            (held - ret.delivered_units).abs() < 1e-9
                && (ret.delivered_units + ret.dropped_units - ret.yield_units).abs() < 1e-9
                && ret.yield_units >= 1.0
        })
    });
    results.push(TestResult::check(
        "fleet_cargo_delivered",
        cargo_ok,
        "holds match delivered units, nothing lost unaccounted",
    ));

    let mut ledger_errors = Vec::new();
    for i in 0..sorties().len() {
        let owner = IdentityId(i as i64 + 1);
        let expected = STARTING_BALANCE - charged.get(&owner).copied().unwrap_or(0)
            + refunded.get(&owner).copied().unwrap_or(0);
        let actual = host.balance(owner).unwrap_or(0);
        if actual != expected {
            ledger_errors.push(format!("{}: {} != {}", owner, actual, expected));
        }
    }
    results.push(TestResult::check(
        "fleet_ledger_balanced",
        ledger_errors.is_empty(),
        if ledger_errors.is_empty() {
            format!(
                "charged {}, refunded {}",
                charged.values().sum::<i64>(),
                refunded.values().sum::<i64>()
            )
        } else {
            ledger_errors.join("; ")
        },
    ));

    let departures = host.cues.iter().filter(|c| c.kind == CueKind::Departure).count();
    let arrivals = host.cues.iter().filter(|c| c.kind == CueKind::Arrival).count();
    results.push(TestResult::check(
        "fleet_cues",
        departures == vessel_count && arrivals == vessel_count,
        format!("{} departure / {} arrival cues", departures, arrivals),
    ));

    let closed = scheduler.close(now);
    results.push(TestResult::check(
        "fleet_close",
        closed.is_ok(),
        match closed {
            Ok(()) => "empty active set written".to_string(),
            Err(e) => e.to_string(),
        },
    ));
    results
}

// ── 7. Restart Recovery ─────────────────────────────────────────────────

pub fn validate_restart_recovery(
    ores: &OreTable,
    tuning: &SimulationTuning,
    _verbose: bool,
) -> Vec<TestResult> {
    println!("--- Restart Recovery ---");
    let mut results = Vec::new();
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            results.push(TestResult::check("restart_storage", false, e.to_string()));
            return results;
        }
    };
    let config = config(ores, tuning);
    let path = dir.path().join(&config.storage_file);

    let mut host = SandboxHost::new();
    let mut scheduler = MissionScheduler::open(
        config.clone(),
        Role::Authority,
        Box::new(FileStore::new(&path)),
        0,
    )
    .with_source(StdRng::seed_from_u64(7));
    launch_fleet(&mut host, &mut scheduler, &mut results);

    // Past every countdown: the whole fleet is away.
    let away_tick = config.seconds_to_ticks(config.countdown_seconds) + STEP_TICKS;
    scheduler.tick(&mut host, away_tick);
    let stored_before: Vec<(OriginId, f64)> = scheduler
        .active()
        .iter()
        .filter(|e| e.phase == Phase::Stored)
        .map(|e| (e.origin, e.yield_units))
        .collect();
    let closed = scheduler.close(away_tick);
    results.push(TestResult::check(
        "restart_saved",
        closed.is_ok() && path.exists(),
        format!("{} stored missions written", stored_before.len()),
    ));

    // The process comes back an arbitrary while later.
    let resume_tick = 5_000_000;
    let mut scheduler = MissionScheduler::open(
        config.clone(),
        Role::Authority,
        Box::new(FileStore::new(&path)),
        resume_tick,
    )
    .with_source(StdRng::seed_from_u64(8));
    let resumed: Vec<(OriginId, f64)> = scheduler
        .active()
        .iter()
        .map(|e| (e.origin, e.yield_units))
        .collect();
    results.push(TestResult::check(
        "restart_resumed",
        resumed == stored_before && scheduler.active().iter().all(|e| e.deadline_tick > resume_tick),
        format!("{} of {} missions resumed", resumed.len(), stored_before.len()),
    ));

    let replica = MissionScheduler::open(
        config.clone(),
        Role::Replica,
        Box::new(FileStore::new(&path)),
        resume_tick,
    );
    results.push(TestResult::check(
        "restart_replica_inert",
        replica.active().is_empty(),
        "replica ignores stored missions",
    ));

    let mut now = resume_tick;
    let limit = resume_tick + config.seconds_to_ticks(tuning.duration.max_mission_seconds + 3600.0);
    while !scheduler.active().is_empty() && now < limit {
        now += STEP_TICKS;
        scheduler.tick(&mut host, now);
    }
    results.push(TestResult::check(
        "restart_completed",
        scheduler.active().is_empty() && host.vessel_count() == stored_before.len(),
        format!("{} vessels back after restart", host.vessel_count()),
    ));
    results
}
