//! Tunable constants for the mission models.
//!
//! Every model reads its coefficients from one of the sections below rather
//! than from free constants, so a host can rebalance missions from a JSON
//! document without recompiling. Missing fields keep their stock values.
//!
//! ```
//! use prospector_logic::tuning::SimulationTuning;
//!
//! let tuning = SimulationTuning::from_json(r#"{ "reliability": { "check_ticks": 8 } }"#).unwrap();
//! assert_eq!(tuning.reliability.check_ticks, 8);
//! assert_eq!(tuning.duration.min_mission_seconds, 90.0);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading a tuning document.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning value: {0}")]
    Invalid(String),
}

/// All model coefficients, grouped by model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationTuning {
    pub duration: DurationTuning,
    pub yield_model: YieldTuning,
    pub reliability: ReliabilityTuning,
    pub pricing: PricingTuning,
}

impl SimulationTuning {
    /// Parse a (possibly partial) JSON tuning document.
    pub fn from_json(text: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(text)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would make the models degenerate.
    pub fn validate(&self) -> Result<(), TuningError> {
        let d = &self.duration;
        if d.min_mission_seconds < 0.0 || d.max_mission_seconds < d.min_mission_seconds {
            return Err(TuningError::Invalid(format!(
                "mission bounds [{}, {}] are not an ordered non-negative range",
                d.min_mission_seconds, d.max_mission_seconds
            )));
        }
        if d.reference_acceleration <= 0.0 || d.min_acceleration <= 0.0 {
            return Err(TuningError::Invalid(
                "acceleration reference and floor must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&d.min_variance_factor) {
            return Err(TuningError::Invalid(format!(
                "duration min_variance_factor {} must lie in [0, 1]",
                d.min_variance_factor
            )));
        }
        let r = &self.reliability;
        if !(0.0..=1.0).contains(&r.f_min) {
            return Err(TuningError::Invalid(format!(
                "reliability f_min {} must lie in [0, 1]",
                r.f_min
            )));
        }
        if r.check_ticks == 0 {
            return Err(TuningError::Invalid("check_ticks must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&r.p_min) || !(0.0..=1.0).contains(&r.p_max) {
            return Err(TuningError::Invalid(
                "success probabilities must lie in [0, 1]".into(),
            ));
        }
        if self.pricing.base_price_by_skill.is_empty()
            || self.pricing.rate_per_minute_by_rarity.is_empty()
        {
            return Err(TuningError::Invalid("price tables must not be empty".into()));
        }
        Ok(())
    }
}

/// Coefficients of the mission duration model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationTuning {
    /// Speed-skill coefficient in `1 / (1 + k·speed)`.
    pub k_speed: f64,
    /// Acceleration (m/s²) at which travel time is unscaled.
    pub reference_acceleration: f64,
    /// Floor applied to the measured acceleration.
    pub min_acceleration: f64,
    /// Drill exponent used when an ore declares a non-positive one.
    pub default_drill_exponent: f64,
    /// Variance reduction per speed-skill level.
    pub r_speed: f64,
    /// Lowest consistency factor skill can reach.
    pub min_variance_factor: f64,
    pub min_mission_seconds: f64,
    pub max_mission_seconds: f64,
}

impl Default for DurationTuning {
    fn default() -> Self {
        Self {
            k_speed: 0.15,
            reference_acceleration: 5.0,
            min_acceleration: 0.1,
            default_drill_exponent: 0.75,
            r_speed: 0.08,
            min_variance_factor: 0.5,
            min_mission_seconds: 90.0,
            max_mission_seconds: 5400.0,
        }
    }
}

/// Coefficients of the yield model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldTuning {
    /// Yield-skill coefficient in `1 + k·yield`.
    pub k_yield: f64,
    /// Exponent applied to the effective drill count.
    pub drill_beta: f64,
    /// Variance reduction per yield-skill level.
    pub r_yield: f64,
    pub min_variance_factor: f64,
    /// Extra contributing drills a level-5 operator unlocks; lower levels
    /// get a proportional, rounded-down share.
    pub drill_bonus_at_max_skill: u32,
}

impl Default for YieldTuning {
    fn default() -> Self {
        Self {
            k_yield: 0.18,
            drill_beta: 0.45,
            r_yield: 0.10,
            min_variance_factor: 0.5,
            drill_bonus_at_max_skill: 7,
        }
    }
}

/// Coefficients of the reliability / early-termination model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliabilityTuning {
    /// Success probability of an unskilled operator.
    pub p_min: f64,
    /// Success probability of a fully reliable operator.
    pub p_max: f64,
    pub gamma: f64,
    /// Exponent of the long-mission penalty.
    pub lambda: f64,
    /// Lowest value the long-mission penalty can reach.
    pub f_min: f64,
    /// Hard ceiling on success probability.
    pub p_cap: f64,
    /// Number of discrete reliability checks over a mission.
    pub check_ticks: u32,
    /// Exponent of the partial-yield curve for failed missions.
    pub partial_yield_exponent: f64,
    /// Mission length (seconds) each reliability level tolerates before the
    /// penalty applies, indexed by level 0..=5.
    pub reference_seconds: [f64; 6],
}

impl Default for ReliabilityTuning {
    fn default() -> Self {
        Self {
            p_min: 0.75,
            p_max: 0.995,
            gamma: 1.7,
            lambda: 0.25,
            f_min: 0.5,
            p_cap: 0.999,
            check_ticks: 5,
            partial_yield_exponent: 0.8,
            reference_seconds: [300.0, 600.0, 1200.0, 1800.0, 2400.0, 3000.0],
        }
    }
}

/// Mission price tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingTuning {
    /// Flat fee by overall skill level; the last entry covers higher levels.
    pub base_price_by_skill: Vec<i64>,
    /// Per-minute rate by ore rarity tier; index 0 is unused.
    pub rate_per_minute_by_rarity: Vec<f64>,
    /// Rate surcharge per overall skill level.
    pub skill_rate_multiplier: f64,
}

impl Default for PricingTuning {
    fn default() -> Self {
        Self {
            base_price_by_skill: vec![1000, 1000, 2000, 3000, 4500, 6000],
            rate_per_minute_by_rarity: vec![0.0, 100.0, 200.0, 350.0, 500.0, 750.0],
            skill_rate_multiplier: 0.10,
        }
    }
}
