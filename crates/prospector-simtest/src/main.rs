//! Prospector Headless Mission Harness
//!
//! Sweeps the mission models and flies full mission lifecycles against the
//! real scheduler, file storage and an in-process sandbox world.
//! Runs entirely in-process: no game host, no rendering.
//!
//! Usage:
//!   cargo run -p prospector-simtest
//!   cargo run -p prospector-simtest -- --verbose
//!   cargo run -p prospector-simtest -- --tuning path/to/tuning.json

mod fleet;

use prospector_logic::duration::{estimate_mission_seconds, simulate_mission_seconds};
use prospector_logic::ores::OreTable;
use prospector_logic::pricing::{estimate_mission_cost, refund_amount};
use prospector_logic::random::ScriptedSource;
use prospector_logic::reliability::{resolve_outcome, success_probability};
use prospector_logic::tuning::SimulationTuning;
use prospector_logic::yields::{drill_cap, estimate_yield_units, simulate_yield_units};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── Stock ore table (same JSON a host would ship) ───────────────────────
const ORES_JSON: &str = include_str!("../../../data/ores.json");

// ── Test harness ────────────────────────────────────────────────────────

pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl TestResult {
    pub fn check(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

struct Options {
    verbose: bool,
    tuning_path: Option<String>,
}

fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().skip(1).collect();
    Options {
        verbose: args.iter().any(|a| a == "--verbose"),
        tuning_path: args
            .iter()
            .position(|a| a == "--tuning")
            .and_then(|i| args.get(i + 1).cloned()),
    }
}

fn main() {
    let options = parse_args();
    let verbose = options.verbose;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "info" } else { "warn" }),
    )
    .init();
    println!("=== Prospector Mission Harness ===\n");

    let mut results = Vec::new();

    // 1. Data & tuning
    let tuning = load_tuning(options.tuning_path.as_deref(), &mut results).unwrap_or_default();
    let ores = validate_ore_table(verbose, &mut results);

    // 2. Duration model sweep
    results.extend(validate_duration_model(&ores, &tuning, verbose));

    // 3. Yield model sweep
    results.extend(validate_yield_model(&ores, &tuning, verbose));

    // 4. Reliability model
    results.extend(validate_reliability_model(&tuning, verbose));

    // 5. Pricing & refunds
    results.extend(validate_pricing(&ores, &tuning, verbose));

    // 6. Full lifecycles against the scheduler
    results.extend(fleet::validate_fleet_lifecycle(&ores, &tuning, verbose));

    // 7. Crash recovery
    results.extend(fleet::validate_restart_recovery(&ores, &tuning, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Data & Tuning ────────────────────────────────────────────────────

fn load_tuning(path: Option<&str>, results: &mut Vec<TestResult>) -> Option<SimulationTuning> {
    let path = path?;
    println!("--- Tuning ({}) ---", path);
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| SimulationTuning::from_json(&text).map_err(|e| e.to_string()));
    match loaded {
        Ok(tuning) => {
            results.push(TestResult::check("tuning_load", true, "tuning document accepted"));
            Some(tuning)
        }
        Err(e) => {
            results.push(TestResult::check("tuning_load", false, e));
            None
        }
    }
}

fn validate_ore_table(verbose: bool, results: &mut Vec<TestResult>) -> OreTable {
    println!("--- Ore Table ---");
    let table = match OreTable::from_json(ORES_JSON) {
        Ok(t) => t,
        Err(e) => {
            results.push(TestResult::check(
                "ores_parse",
                false,
                format!("JSON parse error: {}", e),
            ));
            return OreTable::default();
        }
    };

    results.push(TestResult::check(
        "ores_match_stock_table",
        table == OreTable::default(),
        format!("{} ores in data file", table.names().len()),
    ));

    let default = table.default_ore().to_string();
    results.push(TestResult::check(
        "ores_default_present",
        table.contains(&default),
        format!("default ore {}", default),
    ));

    let bad: Vec<&str> = table
        .names()
        .into_iter()
        .filter(|name| {
            table.get(name).map_or(true, |o| {
                o.speed.base_travel_seconds <= 0.0
                    || o.speed.base_mine_seconds <= 0.0
                    || o.yields.base_yield <= 0.0
                    || o.mined_ratio <= 0.0
                    || !(1..=5).contains(&o.rarity)
            })
        })
        .collect();
    results.push(TestResult::check(
        "ores_params_positive",
        bad.is_empty(),
        if bad.is_empty() {
            "all parameters positive, rarity 1..=5".to_string()
        } else {
            format!("bad entries: {:?}", bad)
        },
    ));

    if verbose {
        for name in table.names() {
            println!("  {:<10} rarity {}", name, table.rarity(name));
        }
    }
    table
}

// ── 2. Duration Model ───────────────────────────────────────────────────

fn validate_duration_model(ores: &OreTable, tuning: &SimulationTuning, verbose: bool) -> Vec<TestResult> {
    println!("--- Duration Model ---");
    let mut results = Vec::new();
    let d = &tuning.duration;

    let mut violations = Vec::new();
    for ore in ores.names() {
        for speed in 0..5u8 {
            for drills in 0..10u32 {
                for &accel in &[0.0, 0.5, 5.0, 25.0] {
                    let m = estimate_mission_seconds(ores, d, speed, ore, accel, drills);
                    if estimate_mission_seconds(ores, d, speed + 1, ore, accel, drills) > m
                        || estimate_mission_seconds(ores, d, speed, ore, accel, drills + 1) > m
                        || estimate_mission_seconds(ores, d, speed, ore, accel * 2.0 + 0.1, drills) > m
                    {
                        violations.push(format!("{ore} s{speed} d{drills} a{accel}"));
                    }
                }
            }
        }
    }
    results.push(TestResult::check(
        "duration_monotone",
        violations.is_empty(),
        format!("{} monotonicity violations", violations.len()),
    ));

    let zero_like_one = ores.names().iter().all(|ore| {
        estimate_mission_seconds(ores, d, 2, ore, 5.0, 0)
            == estimate_mission_seconds(ores, d, 2, ore, 5.0, 1)
    });
    results.push(TestResult::check(
        "duration_zero_drills",
        zero_like_one,
        "0 drills behaves as 1",
    ));

    let edges = [0.0, 1e-12, 0.5, 0.999_999, 1.0];
    let mut out_of_bounds = 0;
    for &u1 in &edges {
        for &u2 in &edges {
            let mut src = ScriptedSource::new(vec![u1, u2]);
            let s = simulate_mission_seconds(ores, d, 0, "Platinum", 0.0, 1, 4.0, &mut src);
            if !(d.min_mission_seconds..=d.max_mission_seconds).contains(&s) {
                out_of_bounds += 1;
            }
        }
    }
    results.push(TestResult::check(
        "duration_bounded",
        out_of_bounds == 0,
        format!(
            "{} edge draws outside [{}, {}]",
            out_of_bounds, d.min_mission_seconds, d.max_mission_seconds
        ),
    ));

    if verbose {
        for ore in ores.names() {
            println!(
                "  {:<10} unskilled {:>7.1}s  master {:>7.1}s",
                ore,
                estimate_mission_seconds(ores, d, 0, ore, 5.0, 2),
                estimate_mission_seconds(ores, d, 5, ore, 5.0, 2)
            );
        }
    }
    results
}

// ── 3. Yield Model ──────────────────────────────────────────────────────

fn validate_yield_model(ores: &OreTable, tuning: &SimulationTuning, verbose: bool) -> Vec<TestResult> {
    println!("--- Yield Model ---");
    let mut results = Vec::new();
    let y = &tuning.yield_model;

    let mut violations = 0;
    for ore in ores.names() {
        for skill in 0..=5u8 {
            for drills in 0..12u32 {
                let m = estimate_yield_units(ores, y, skill.min(4), skill, drills, ore);
                if estimate_yield_units(ores, y, skill.min(4) + 1, skill, drills, ore) < m
                    || estimate_yield_units(ores, y, skill.min(4), skill, drills + 1, ore) < m
                {
                    violations += 1;
                }
            }
        }
    }
    results.push(TestResult::check(
        "yield_monotone",
        violations == 0,
        format!("{} monotonicity violations", violations),
    ));

    let caps: Vec<u32> = (0..=5).map(|s| drill_cap(s, y)).collect();
    results.push(TestResult::check(
        "yield_drill_cap",
        caps[0] == 1
            && caps[5] == 1 + y.drill_bonus_at_max_skill
            && caps.windows(2).all(|w| w[1] >= w[0]),
        format!("caps {:?}", caps),
    ));

    let mut rng = StdRng::seed_from_u64(7);
    let floor_ok = (0..5_000).all(|_| simulate_yield_units(ores, y, 0, "Uranium", 1.5, &mut rng) >= 1.0);
    results.push(TestResult::check(
        "yield_floor",
        floor_ok,
        "5000 low-mean draws all >= 1",
    ));

    if verbose {
        for ore in ores.names() {
            println!(
                "  {:<10} 1 drill {:>8.1}  8 drills/master {:>8.1}",
                ore,
                estimate_yield_units(ores, y, 0, 0, 1, ore),
                estimate_yield_units(ores, y, 5, 5, 8, ore)
            );
        }
    }
    results
}

// ── 4. Reliability Model ────────────────────────────────────────────────

fn validate_reliability_model(tuning: &SimulationTuning, verbose: bool) -> Vec<TestResult> {
    println!("--- Reliability Model ---");
    let mut results = Vec::new();
    let r = &tuning.reliability;

    let lengths = [60.0, 300.0, 900.0, 1800.0, 3600.0, 5400.0];
    let mut ok = true;
    for &s in &lengths {
        for level in 0..5u8 {
            let p = success_probability(level, s, r);
            ok &= (0.0..=r.p_cap).contains(&p);
            ok &= success_probability(level + 1, s, r) >= p;
        }
    }
    for level in 0..=5u8 {
        ok &= lengths
            .windows(2)
            .all(|w| success_probability(level, w[1], r) <= success_probability(level, w[0], r));
    }
    results.push(TestResult::check(
        "reliability_monotone_bounded",
        ok,
        "p within [0, cap], up with skill, down with length",
    ));

    let p = success_probability(5, 100.0, r);
    results.push(TestResult::check(
        "reliability_master_short",
        (p - 0.995).abs() < 1e-12,
        format!("p = {:.6}", p),
    ));

    let mut rng = StdRng::seed_from_u64(2024);
    let n = 10_000;
    let successes = (0..n).filter(|_| !resolve_outcome(5, 100.0, r, &mut rng).failed).count();
    results.push(TestResult::check(
        "reliability_master_monte_carlo",
        successes * 100 >= n * 99,
        format!("{}/{} missions succeeded", successes, n),
    ));

    let mut rng = StdRng::seed_from_u64(9);
    let expected = success_probability(0, 1800.0, r);
    let observed = (0..n).filter(|_| !resolve_outcome(0, 1800.0, r, &mut rng).failed).count() as f64
        / n as f64;
    results.push(TestResult::check(
        "reliability_sampled_rate",
        (observed - expected).abs() < 0.02,
        format!("expected {:.3}, observed {:.3}", expected, observed),
    ));

    if verbose {
        for level in 0..=5u8 {
            let row: Vec<String> = lengths
                .iter()
                .map(|&s| format!("{:.3}", success_probability(level, s, r)))
                .collect();
            println!("  r{} {}", level, row.join(" "));
        }
    }
    results
}

// ── 5. Pricing ──────────────────────────────────────────────────────────

fn validate_pricing(ores: &OreTable, tuning: &SimulationTuning, _verbose: bool) -> Vec<TestResult> {
    println!("--- Pricing ---");
    let mut results = Vec::new();
    let p = &tuning.pricing;

    let cost = estimate_mission_cost(ores, p, 0, "Iron", 600.0);
    results.push(TestResult::check(
        "pricing_unskilled_iron",
        cost == 2000,
        format!("10 min Iron costs {}", cost),
    ));

    let refunds = (
        refund_amount(2000, 800, true),
        refund_amount(2000, 2000, true),
        refund_amount(2000, 800, false),
    );
    results.push(TestResult::check(
        "pricing_refunds",
        refunds == (1200, 0, 0),
        format!("refunds {:?}", refunds),
    ));

    let monotone = ores.names().iter().all(|ore| {
        (0..5u8).all(|skill| {
            estimate_mission_cost(ores, p, skill + 1, ore, 900.0)
                >= estimate_mission_cost(ores, p, skill, ore, 900.0)
        })
    });
    results.push(TestResult::check(
        "pricing_skill_monotone",
        monotone,
        "better operators never cost less",
    ));
    results
}
