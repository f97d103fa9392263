//! Scheduler configuration.
//!
//! Everything the scheduler needs besides its collaborators: clock rate,
//! phase lengths, eligibility thresholds, cue names and the full model
//! tuning. Loadable from a partial JSON document; missing fields keep the
//! stock values.

use std::fs;
use std::path::Path;

use prospector_logic::ores::OreTable;
use prospector_logic::tuning::{SimulationTuning, TuningError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config document: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Names of the effects and sounds played around a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    pub departure_effect: String,
    pub departure_sound: String,
    pub arrival_effect: String,
    pub arrival_sound: String,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            departure_effect: "Warp_Prototech".into(),
            departure_sound: "ShipJumpDriveJumpOut".into(),
            arrival_effect: "Warp_Prototech".into(),
            arrival_sound: "ShipJumpDriveJumpIn".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Scheduler clock rate.
    pub ticks_per_second: u32,
    /// Length of the departure countdown.
    pub countdown_seconds: f64,
    /// Length of the arrival effect before a mission completes.
    pub return_effect_seconds: f64,
    /// Fewest drills a vessel needs to launch.
    pub min_drills: u32,
    pub min_length_scale: f64,
    pub max_length_scale: f64,
    /// File name the active missions are saved under.
    pub storage_file: String,
    pub cues: CueConfig,
    pub tuning: SimulationTuning,
    pub ores: OreTable,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 60,
            countdown_seconds: 10.0,
            return_effect_seconds: 10.0,
            min_drills: 2,
            min_length_scale: 0.25,
            max_length_scale: 4.0,
            storage_file: "missions.bin".into(),
            cues: CueConfig::default(),
            tuning: SimulationTuning::default(),
            ores: OreTable::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticks_per_second == 0 {
            return Err(ConfigError::Invalid("ticks_per_second must be positive".into()));
        }
        if !(self.countdown_seconds >= 0.0 && self.countdown_seconds.is_finite())
            || !(self.return_effect_seconds >= 0.0 && self.return_effect_seconds.is_finite())
        {
            return Err(ConfigError::Invalid(
                "phase lengths must be finite and non-negative".into(),
            ));
        }
        if !(self.min_length_scale > 0.0) || self.max_length_scale < self.min_length_scale {
            return Err(ConfigError::Invalid(format!(
                "length scale bounds [{}, {}] are not an ordered positive range",
                self.min_length_scale, self.max_length_scale
            )));
        }
        self.tuning.validate()?;
        Ok(())
    }

    /// Whole ticks covering `seconds` (truncating; negative is zero).
    pub fn seconds_to_ticks(&self, seconds: f64) -> u64 {
        (seconds * f64::from(self.ticks_per_second)) as u64
    }

    /// Tick at which a phase of `seconds` started at `now_tick` ends. Saturates
    /// at the end of the clock.
    pub fn deadline_after(&self, now_tick: u64, seconds: f64) -> u64 {
        now_tick.saturating_add(self.seconds_to_ticks(seconds))
    }

    pub fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        ticks as f64 / f64::from(self.ticks_per_second)
    }

    /// Clamp a requested length scale; unusable values mean 1.
    pub fn clamp_length_scale(&self, scale: f64) -> f64 {
        if scale.is_finite() && scale > 0.0 {
            scale.clamp(self.min_length_scale, self.max_length_scale)
        } else {
            1.0
        }
    }
}
