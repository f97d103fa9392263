//! Reliability and early-termination model.
//!
//! A mission's overall success probability comes from the operator's
//! reliability and a long-mission penalty. It is spread over a fixed number
//! of discrete checks (`pTick = 1 − p^(1/T)`) and the first failing check is
//! sampled with an inverse-geometric draw. A failed mission returns one check
//! after the failure and delivers a sub-linear share of its yield.

use serde::{Deserialize, Serialize};

use crate::operator::{level, MAX_LEVEL};
use crate::random::UniformSource;
use crate::tuning::ReliabilityTuning;

/// Smallest uniform draw used when sampling a failure check.
const MIN_FAILURE_DRAW: f64 = 1e-12;

/// Mission length a reliability level tolerates before the penalty applies.
pub fn length_reference_seconds(reliability: u8, tuning: &ReliabilityTuning) -> f64 {
    tuning.reference_seconds[usize::from(reliability.min(MAX_LEVEL))]
}

/// Long-mission penalty: 1 up to the reference length, then
/// `(ref / seconds)^lambda` clamped to `[f_min, 1]`.
pub fn length_factor(mission_seconds: f64, reference_seconds: f64, tuning: &ReliabilityTuning) -> f64 {
    if mission_seconds <= reference_seconds {
        return 1.0;
    }
    (reference_seconds / mission_seconds)
        .powf(tuning.lambda)
        .clamp(tuning.f_min, 1.0)
}

/// Probability that a mission of `mission_seconds` completes without an
/// early return. Always within `[0, p_cap]`.
pub fn success_probability(reliability: u8, mission_seconds: f64, tuning: &ReliabilityTuning) -> f64 {
    let x = level(reliability) / f64::from(MAX_LEVEL);
    let base = tuning.p_min + (tuning.p_max - tuning.p_min) * x.powf(tuning.gamma);
    let factor = length_factor(
        mission_seconds,
        length_reference_seconds(reliability, tuning),
        tuning,
    );
    let p = (base * factor).min(tuning.p_cap);
    if p.is_nan() {
        0.0
    } else {
        p.max(0.0)
    }
}

/// Failure probability per check so that `checks` independent checks
/// succeed together with probability `p_success`.
pub fn per_tick_failure_probability(p_success: f64, checks: u32) -> f64 {
    if checks == 0 || p_success <= 0.0 {
        return 1.0;
    }
    if p_success >= 1.0 {
        return 0.0;
    }
    1.0 - p_success.powf(1.0 / f64::from(checks))
}

/// Sample the 1-based check at which the mission fails. A value greater
/// than `checks` means the mission never fails.
pub fn sample_failure_tick(p_tick: f64, checks: u32, rng: &mut (impl UniformSource + ?Sized)) -> u32 {
    if checks == 0 {
        return 1;
    }
    if p_tick <= 0.0 {
        return checks + 1;
    }
    if p_tick >= 1.0 {
        return 1;
    }

    let u = rng.next_uniform().clamp(MIN_FAILURE_DRAW, 1.0);
    let tick = ((1.0 - u).ln() / (1.0 - p_tick).ln()).ceil();
    if tick.is_nan() {
        return checks + 1;
    }
    // `as` saturates: +inf (u == 1) lands far past `checks`.
    (tick as u32).max(1)
}

/// Resolved outcome of the reliability model for one mission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityOutcome {
    /// Whether the mission ends early.
    pub failed: bool,
    /// Check at which the failure happened (`checks + 1` or more on success).
    pub failure_tick: u32,
    /// Fraction of the planned duration actually flown.
    pub return_progress: f64,
    /// Multiplier applied to the simulated yield.
    pub yield_factor: f64,
}

impl ReliabilityOutcome {
    pub const SUCCESS: Self = Self {
        failed: false,
        failure_tick: u32::MAX,
        return_progress: 1.0,
        yield_factor: 1.0,
    };
}

/// Turn a sampled failure check into return progress and yield factor.
pub fn outcome_for_failure_tick(failure_tick: u32, checks: u32, tuning: &ReliabilityTuning) -> ReliabilityOutcome {
    if checks == 0 || failure_tick > checks {
        return ReliabilityOutcome {
            failure_tick,
            ..ReliabilityOutcome::SUCCESS
        };
    }
    let t = f64::from(checks);
    let return_tick = (failure_tick + 1).min(checks);
    ReliabilityOutcome {
        failed: true,
        failure_tick,
        return_progress: f64::from(return_tick) / t,
        yield_factor: (f64::from(failure_tick) / t).powf(tuning.partial_yield_exponent),
    }
}

/// Run the whole reliability model for a mission of `mission_seconds`.
pub fn resolve_outcome(
    reliability: u8,
    mission_seconds: f64,
    tuning: &ReliabilityTuning,
    rng: &mut (impl UniformSource + ?Sized),
) -> ReliabilityOutcome {
    let checks = tuning.check_ticks;
    let p_success = success_probability(reliability, mission_seconds, tuning);
    let p_tick = per_tick_failure_probability(p_success, checks);
    let failure_tick = sample_failure_tick(p_tick, checks, rng);
    outcome_for_failure_tick(failure_tick, checks, tuning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedSource;

    #[test]
    fn test_reference_table() {
        let t = ReliabilityTuning::default();
        assert_eq!(length_reference_seconds(0, &t), 300.0);
        assert_eq!(length_reference_seconds(3, &t), 1800.0);
        assert_eq!(length_reference_seconds(5, &t), 3000.0);
        assert_eq!(length_reference_seconds(200, &t), 3000.0);
    }

    #[test]
    fn test_length_factor_floor() {
        let t = ReliabilityTuning::default();
        assert_eq!(length_factor(100.0, 300.0, &t), 1.0);
        assert_eq!(length_factor(300.0, 300.0, &t), 1.0);
        // (300 / 4800)^0.25 = 0.5
        assert!((length_factor(4800.0, 300.0, &t) - 0.5).abs() < 1e-12);
        assert_eq!(length_factor(1e9, 300.0, &t), 0.5);
    }

    #[test]
    fn test_unskilled_short_mission() {
        let t = ReliabilityTuning::default();
        assert!((success_probability(0, 200.0, &t) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_cap_applies() {
        let t = ReliabilityTuning {
            p_max: 1.0,
            ..ReliabilityTuning::default()
        };
        assert_eq!(success_probability(5, 10.0, &t), 0.999);
    }

    #[test]
    fn test_per_tick_edges() {
        assert_eq!(per_tick_failure_probability(0.5, 0), 1.0);
        assert_eq!(per_tick_failure_probability(0.0, 5), 1.0);
        assert_eq!(per_tick_failure_probability(1.0, 5), 0.0);
        let p = per_tick_failure_probability(0.9, 5);
        assert!(((1.0 - p).powi(5) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_sample_failure_tick_edges() {
        let mut src = ScriptedSource::constant(0.5);
        assert_eq!(sample_failure_tick(0.0, 5, &mut src), 6);
        assert_eq!(sample_failure_tick(1.0, 5, &mut src), 1);
        assert_eq!(sample_failure_tick(0.3, 0, &mut src), 1);

        let mut zero = ScriptedSource::constant(0.0);
        assert_eq!(sample_failure_tick(0.1, 5, &mut zero), 1);

        let mut one = ScriptedSource::constant(1.0);
        assert!(sample_failure_tick(0.1, 5, &mut one) > 5);
    }

    #[test]
    fn test_sample_failure_tick_inverse() {
        // pTick = 0.5: ln(1-u)/ln(0.5); u = 0.8 → 2.32 → 3
        let mut src = ScriptedSource::constant(0.8);
        assert_eq!(sample_failure_tick(0.5, 5, &mut src), 3);
    }

    #[test]
    fn test_failure_outcome() {
        let t = ReliabilityTuning::default();
        let outcome = outcome_for_failure_tick(2, 5, &t);
        assert!(outcome.failed);
        assert!((outcome.return_progress - 0.6).abs() < 1e-12);
        assert!((outcome.yield_factor - 0.4f64.powf(0.8)).abs() < 1e-12);

        let last = outcome_for_failure_tick(5, 5, &t);
        assert_eq!(last.return_progress, 1.0);
        assert!(last.failed);

        let success = outcome_for_failure_tick(6, 5, &t);
        assert!(!success.failed);
        assert_eq!(success.return_progress, 1.0);
        assert_eq!(success.yield_factor, 1.0);
    }

    #[test]
    fn test_resolve_outcome_certain_failure() {
        let t = ReliabilityTuning {
            p_min: 0.0,
            ..ReliabilityTuning::default()
        };
        let mut src = ScriptedSource::constant(0.5);
        let outcome = resolve_outcome(0, 100.0, &t, &mut src);
        assert!(outcome.failed);
        assert_eq!(outcome.failure_tick, 1);
        assert!((outcome.return_progress - 0.4).abs() < 1e-12);
    }
}
