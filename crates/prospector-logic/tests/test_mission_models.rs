//! Property tests across the mission models.
//!
//! Exercises: duration → yield → reliability → pricing, checking the
//! monotonicity and bounds every host relies on.

use prospector_logic::duration::{estimate_mission_seconds, simulate_mission_seconds};
use prospector_logic::ores::OreTable;
use prospector_logic::pricing::{estimate_mission_cost, refund_amount};
use prospector_logic::random::{ScriptedSource, UniformSource};
use prospector_logic::reliability::{
    per_tick_failure_probability, resolve_outcome, sample_failure_tick, success_probability,
};
use prospector_logic::tuning::SimulationTuning;
use prospector_logic::yields::{
    drill_cap, effective_drill_count, estimate_yield_units, simulate_yield_units,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── Helpers ────────────────────────────────────────────────────────────

fn setup() -> (OreTable, SimulationTuning) {
    (OreTable::default(), SimulationTuning::default())
}

/// Uniform draws at and near both ends of the unit interval.
const EDGE_DRAWS: [f64; 8] = [0.0, 1e-300, 1e-12, 0.25, 0.5, 0.999_999, 1.0 - f64::EPSILON, 1.0];

// ── Duration ───────────────────────────────────────────────────────────

#[test]
fn test_duration_non_increasing_in_speed_accel_drills() {
    let (ores, t) = setup();
    for ore in ores.names() {
        for speed in 0..5u8 {
            let a = estimate_mission_seconds(&ores, &t.duration, speed, ore, 4.0, 3);
            let b = estimate_mission_seconds(&ores, &t.duration, speed + 1, ore, 4.0, 3);
            assert!(b <= a, "{ore}: speed {speed}");
        }
        let mut prev = f64::INFINITY;
        for accel in [0.0, 0.05, 0.5, 2.0, 5.0, 20.0, 100.0] {
            let m = estimate_mission_seconds(&ores, &t.duration, 2, ore, accel, 3);
            assert!(m <= prev, "{ore}: accel {accel}");
            prev = m;
        }
        let mut prev = f64::INFINITY;
        for drills in 0..12 {
            let m = estimate_mission_seconds(&ores, &t.duration, 2, ore, 4.0, drills);
            assert!(m <= prev, "{ore}: drills {drills}");
            prev = m;
        }
    }
}

#[test]
fn test_zero_drills_behave_like_one() {
    let (ores, t) = setup();
    for ore in ores.names() {
        assert_eq!(
            estimate_mission_seconds(&ores, &t.duration, 3, ore, 7.0, 0),
            estimate_mission_seconds(&ores, &t.duration, 3, ore, 7.0, 1)
        );
        assert_eq!(
            estimate_yield_units(&ores, &t.yield_model, 3, 3, 0, ore),
            estimate_yield_units(&ores, &t.yield_model, 3, 3, 1, ore)
        );
    }
}

#[test]
fn test_sampled_duration_within_bounds_for_edge_draws() {
    let (ores, t) = setup();
    for &u1 in &EDGE_DRAWS {
        for &u2 in &EDGE_DRAWS {
            for scale in [0.1, 1.0, 3.0, 50.0] {
                let mut src = ScriptedSource::new(vec![u1, u2]);
                let s = simulate_mission_seconds(&ores, &t.duration, 0, "Uranium", 0.0, 1, scale, &mut src);
                assert!(s.is_finite());
                assert!(
                    (t.duration.min_mission_seconds..=t.duration.max_mission_seconds).contains(&s),
                    "u=({u1}, {u2}) scale {scale}: {s}"
                );
            }
        }
    }
}

// ── Yield ──────────────────────────────────────────────────────────────

#[test]
fn test_yield_non_decreasing_in_skill_and_drills() {
    let (ores, t) = setup();
    for ore in ores.names() {
        for skill in 0..5u8 {
            let a = estimate_yield_units(&ores, &t.yield_model, skill, 5, 4, ore);
            let b = estimate_yield_units(&ores, &t.yield_model, skill + 1, 5, 4, ore);
            assert!(b >= a, "{ore}: yield skill {skill}");
        }
        let mut prev = 0.0;
        for drills in 0..12 {
            let y = estimate_yield_units(&ores, &t.yield_model, 2, 5, drills, ore);
            assert!(y >= prev, "{ore}: drills {drills}");
            prev = y;
        }
    }
}

#[test]
fn test_effective_drills_never_exceed_cap() {
    let (_, t) = setup();
    for skill in 0..=5u8 {
        let cap = 1 + (u32::from(skill) * 7) / 5;
        assert_eq!(drill_cap(skill, &t.yield_model), cap);
        for drills in 0..40 {
            assert!(effective_drill_count(drills, skill, &t.yield_model) <= cap);
        }
    }
}

#[test]
fn test_sampled_yield_at_least_one_for_edge_draws() {
    let (ores, t) = setup();
    for &u1 in &EDGE_DRAWS {
        for &u2 in &EDGE_DRAWS {
            let mut src = ScriptedSource::new(vec![u1, u2]);
            let y = simulate_yield_units(&ores, &t.yield_model, 0, "Platinum", 2.0, &mut src);
            assert!(y.is_finite() && y >= 1.0, "u=({u1}, {u2}): {y}");
        }
    }
}

// ── Reliability ────────────────────────────────────────────────────────

#[test]
fn test_success_probability_monotone_and_bounded() {
    let (_, t) = setup();
    let lengths = [10.0, 100.0, 300.0, 900.0, 2000.0, 5400.0, 1e6];
    for &seconds in &lengths {
        let mut prev = 0.0;
        for r in 0..=5u8 {
            let p = success_probability(r, seconds, &t.reliability);
            assert!((0.0..=0.999).contains(&p));
            assert!(p >= prev, "r {r} at {seconds}s");
            prev = p;
        }
    }
    for r in 0..=5u8 {
        let mut prev = 1.0;
        for &seconds in &lengths {
            let p = success_probability(r, seconds, &t.reliability);
            assert!(p <= prev, "r {r} at {seconds}s");
            prev = p;
        }
    }
}

#[test]
fn test_master_operator_short_mission() {
    let (_, t) = setup();
    let p = success_probability(5, 100.0, &t.reliability);
    assert!((p - 0.995).abs() < 1e-12);

    let mut rng = StdRng::seed_from_u64(2024);
    let n = 10_000;
    let successes = (0..n)
        .filter(|_| !resolve_outcome(5, 100.0, &t.reliability, &mut rng).failed)
        .count();
    assert!(successes >= n * 99 / 100, "{successes} / {n}");
}

#[test]
fn test_failure_tick_matches_probability() {
    let (_, t) = setup();
    let checks = t.reliability.check_ticks;
    let p = 0.8;
    let p_tick = per_tick_failure_probability(p, checks);
    let mut rng = StdRng::seed_from_u64(99);
    let n = 20_000;
    let survived = (0..n)
        .filter(|_| sample_failure_tick(p_tick, checks, &mut rng) > checks)
        .count();
    let rate = survived as f64 / n as f64;
    assert!((rate - p).abs() < 0.02, "survival rate {rate}");
}

#[test]
fn test_failed_outcome_ranges() {
    let (_, t) = setup();
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..2_000 {
        let o = resolve_outcome(0, 5400.0, &t.reliability, &mut rng);
        assert!(o.return_progress > 0.0 && o.return_progress <= 1.0);
        assert!(o.yield_factor > 0.0 && o.yield_factor <= 1.0);
        if !o.failed {
            assert_eq!(o.return_progress, 1.0);
        }
    }
}

#[test]
fn test_boxed_source_drives_models() {
    let (ores, t) = setup();
    let mut boxed: Box<dyn UniformSource> = Box::new(StdRng::seed_from_u64(1));
    let s = simulate_mission_seconds(&ores, &t.duration, 1, "Iron", 5.0, 2, 1.0, boxed.as_mut());
    assert!(s >= t.duration.min_mission_seconds);
    let o = resolve_outcome(3, s, &t.reliability, boxed.as_mut());
    assert!(o.return_progress <= 1.0);
}

// ── Pricing ────────────────────────────────────────────────────────────

#[test]
fn test_cost_and_refund_scenarios() {
    let (ores, t) = setup();
    let full = estimate_mission_cost(&ores, &t.pricing, 0, "Iron", 600.0);
    assert_eq!(full, 2000);
    assert_eq!(refund_amount(full, 800, true), 1200);
    assert_eq!(refund_amount(full, 2000, true), 0);
    assert_eq!(refund_amount(full, 2600, true), 0);
}

#[test]
fn test_cost_non_decreasing_in_duration() {
    let (ores, t) = setup();
    for ore in ores.names() {
        let mut prev = 0;
        for seconds in (0..=5400).step_by(90) {
            let c = estimate_mission_cost(&ores, &t.pricing, 3, ore, seconds as f64);
            assert!(c >= prev, "{ore} at {seconds}s");
            prev = c;
        }
    }
}
