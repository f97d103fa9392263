//! Mission yield model.
//!
//! `mean = base_yield × mined_ratio × (1 + k·yield) × d_eff^beta`
//!
//! where `d_eff` is the drill count capped by the operator's overall skill:
//! an unskilled operator only works one drill, a master works up to eight.

use crate::operator::{level, MAX_LEVEL};
use crate::ores::{OreTable, YieldParams};
use crate::random::{perturb, UniformSource};
use crate::tuning::YieldTuning;

/// Smallest amount a mission may deliver.
pub const MIN_YIELD_UNITS: f64 = 1.0;

/// Most drills an operator with `overall_skill` can make use of.
pub fn drill_cap(overall_skill: u8, tuning: &YieldTuning) -> u32 {
    let skill = u32::from(overall_skill.min(MAX_LEVEL));
    1 + skill * tuning.drill_bonus_at_max_skill / u32::from(MAX_LEVEL)
}

/// Drill count that actually contributes to yield: at least one, at most
/// the operator's cap.
pub fn effective_drill_count(drill_count: u32, overall_skill: u8, tuning: &YieldTuning) -> u32 {
    drill_count.max(1).min(drill_cap(overall_skill, tuning))
}

/// Expected delivered units at length scale 1.
pub fn yield_mean(
    yield_skill: u8,
    overall_skill: u8,
    drill_count: u32,
    mined_ratio: f64,
    params: &YieldParams,
    tuning: &YieldTuning,
) -> f64 {
    let d_eff = f64::from(effective_drill_count(drill_count, overall_skill, tuning));
    let f_skill = 1.0 + tuning.k_yield * level(yield_skill);
    let f_drill = d_eff.powf(tuning.drill_beta);
    params.base_yield * mined_ratio * f_skill * f_drill
}

/// Standard deviation of the delivered units around `mean`.
pub fn yield_std(mean: f64, yield_skill: u8, params: &YieldParams, tuning: &YieldTuning) -> f64 {
    let consistency = (1.0 - tuning.r_yield * level(yield_skill)).max(tuning.min_variance_factor);
    mean * params.cv0 * consistency
}

/// Draw a delivered amount, floored at [`MIN_YIELD_UNITS`].
pub fn sample_yield_units(mean: f64, std: f64, rng: &mut (impl UniformSource + ?Sized)) -> f64 {
    let value = perturb(mean, std, rng);
    if value.is_nan() {
        MIN_YIELD_UNITS
    } else {
        value.max(MIN_YIELD_UNITS)
    }
}

/// Expected delivered units for `ore` at length scale 1.
pub fn estimate_yield_units(
    ores: &OreTable,
    tuning: &YieldTuning,
    yield_skill: u8,
    overall_skill: u8,
    drill_count: u32,
    ore: &str,
) -> f64 {
    let params = ores.yields(ore);
    yield_mean(
        yield_skill,
        overall_skill,
        drill_count,
        ores.mined_ratio(ore),
        &params,
        tuning,
    )
}

/// Simulate delivered units for `ore` around an already-scaled mean.
pub fn simulate_yield_units(
    ores: &OreTable,
    tuning: &YieldTuning,
    yield_skill: u8,
    ore: &str,
    scaled_mean: f64,
    rng: &mut (impl UniformSource + ?Sized),
) -> f64 {
    let params = ores.yields(ore);
    let std = yield_std(scaled_mean, yield_skill, &params, tuning);
    sample_yield_units(scaled_mean, std, rng)
}
