//! Mission duration model.
//!
//! Mean time is travel plus mining:
//!
//! * `travel = base_travel × (1 + difficulty) × f_skill × f_accel`
//! * `mine = base_mine × f_skill × f_drills`
//!
//! with diminishing returns on speed skill (`1 / (1 + k·speed)`), a square-root
//! acceleration factor against a reference acceleration, and a power-law drill
//! factor. Sampled durations add Gaussian noise whose spread shrinks with
//! speed skill, then clamp to the configured mission bounds.

use crate::operator::level;
use crate::ores::{OreTable, SpeedParams};
use crate::random::{perturb, UniformSource};
use crate::tuning::DurationTuning;

/// Expected mission time in seconds.
///
/// `drill_count` is floored at 1 and `max_acceleration` at the tuning's
/// minimum, so the result is always finite and positive.
pub fn mission_time_mean(
    speed_skill: u8,
    max_acceleration: f64,
    drill_count: u32,
    params: &SpeedParams,
    tuning: &DurationTuning,
) -> f64 {
    let s = level(speed_skill);
    let drills = f64::from(drill_count.max(1));
    let accel = if max_acceleration.is_finite() {
        max_acceleration.max(tuning.min_acceleration)
    } else {
        tuning.min_acceleration
    };

    let f_skill = 1.0 / (1.0 + tuning.k_speed * s);
    let f_accel = 1.0 / (accel / tuning.reference_acceleration).sqrt();
    let f_drills = 1.0 / drills.powf(params.drill_exponent);

    let travel = params.base_travel_seconds * (1.0 + params.travel_difficulty) * f_skill * f_accel;
    let mine = params.base_mine_seconds * f_skill * f_drills;
    travel + mine
}

/// Standard deviation of the mission time around `mean`.
pub fn mission_time_std(
    mean: f64,
    speed_skill: u8,
    params: &SpeedParams,
    tuning: &DurationTuning,
) -> f64 {
    let consistency =
        (1.0 - tuning.r_speed * level(speed_skill)).clamp(tuning.min_variance_factor, 1.0);
    mean * params.sigma0 * consistency
}

/// Draw a mission time and clamp it to `[min, max]` mission seconds.
pub fn sample_mission_seconds(
    mean: f64,
    std: f64,
    tuning: &DurationTuning,
    rng: &mut (impl UniformSource + ?Sized),
) -> f64 {
    perturb(mean, std, rng).clamp(tuning.min_mission_seconds, tuning.max_mission_seconds)
}

/// Expected mission time for `ore` at length scale 1.
pub fn estimate_mission_seconds(
    ores: &OreTable,
    tuning: &DurationTuning,
    speed_skill: u8,
    ore: &str,
    max_acceleration: f64,
    drill_count: u32,
) -> f64 {
    let params = ores.speed(ore, tuning.default_drill_exponent);
    mission_time_mean(speed_skill, max_acceleration, drill_count, &params, tuning)
}

/// Simulate the full mission time for `ore`, scaled by `length_scale`.
///
/// The scale applies to the mean before sampling, so the spread scales with
/// it and the clamp bounds the final, scaled duration.
#[allow(clippy::too_many_arguments)]
pub fn simulate_mission_seconds(
    ores: &OreTable,
    tuning: &DurationTuning,
    speed_skill: u8,
    ore: &str,
    max_acceleration: f64,
    drill_count: u32,
    length_scale: f64,
    rng: &mut (impl UniformSource + ?Sized),
) -> f64 {
    let params = ores.speed(ore, tuning.default_drill_exponent);
    let mean = mission_time_mean(speed_skill, max_acceleration, drill_count, &params, tuning)
        * length_scale;
    let std = mission_time_std(mean, speed_skill, &params, tuning);
    sample_mission_seconds(mean, std, tuning, rng)
}
