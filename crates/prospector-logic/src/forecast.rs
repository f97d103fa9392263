//! Side-effect-free mission projection for status displays.
//!
//! A forecast uses the same model means as a real start, without drawing
//! any randomness, so the numbers shown before launch match what a mission
//! would cost.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::duration::estimate_mission_seconds;
use crate::equipment::EquipmentReport;
use crate::operator::OperatorAttributes;
use crate::ores::OreTable;
use crate::pricing::estimate_mission_cost;
use crate::reliability::success_probability;
use crate::tuning::SimulationTuning;
use crate::yields::{estimate_yield_units, MIN_YIELD_UNITS};

/// Expected outcome of a mission that has not been started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionForecast {
    /// Canonical ore name the projection was made for.
    pub ore: String,
    pub operator: OperatorAttributes,
    /// Every drill on the vessel.
    pub drills_detected: u32,
    /// Largest group of drills sharing a facing; the models work from this.
    pub aligned_drills: u32,
    pub length_scale: f64,
    /// Mean mission time after length scaling, clamped to mission bounds.
    pub expected_seconds: f64,
    /// Mean delivered units after length scaling, at least one.
    pub expected_yield_units: f64,
    pub success_probability: f64,
    pub estimated_cost: i64,
}

impl MissionForecast {
    pub fn project(
        ores: &OreTable,
        tuning: &SimulationTuning,
        operator: OperatorAttributes,
        ore: &str,
        equipment: &EquipmentReport,
        length_scale: f64,
    ) -> Self {
        let operator = operator.clamped();
        let ore = ores.resolve_name(ore);
        let drills = equipment.max_directional_drill_count;
        let d = &tuning.duration;

        let seconds = (estimate_mission_seconds(
            ores,
            d,
            operator.speed,
            ore,
            equipment.max_acceleration,
            drills,
        ) * length_scale)
            .clamp(d.min_mission_seconds, d.max_mission_seconds);
        let yield_units = (estimate_yield_units(
            ores,
            &tuning.yield_model,
            operator.yield_skill,
            operator.skill,
            drills,
            ore,
        ) * length_scale)
            .max(MIN_YIELD_UNITS);

        Self {
            ore: ore.to_string(),
            operator,
            drills_detected: equipment.drill_count,
            aligned_drills: drills,
            length_scale,
            expected_seconds: seconds,
            expected_yield_units: yield_units,
            success_probability: success_probability(
                operator.reliability,
                seconds,
                &tuning.reliability,
            ),
            estimated_cost: estimate_mission_cost(
                ores,
                &tuning.pricing,
                operator.skill,
                ore,
                seconds,
            ),
        }
    }
}

impl fmt::Display for MissionForecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = &self.operator;
        writeln!(f, "Mining Missions")?;
        writeln!(f, "Drills detected: {}", self.drills_detected)?;
        writeln!(f, "Aligned drills: {}", self.aligned_drills)?;
        writeln!(
            f,
            "Pilot: skill {} / reliability {} / yield {} / speed {}",
            op.skill, op.reliability, op.yield_skill, op.speed
        )?;
        writeln!(f, "Ore: {} (x{:.2})", self.ore, self.length_scale)?;
        writeln!(f, "Expected time: {}", format_duration(self.expected_seconds))?;
        writeln!(f, "Expected yield: {:.0}", self.expected_yield_units)?;
        writeln!(f, "Success chance: {:.1}%", self.success_probability * 100.0)?;
        write!(f, "Estimated cost: {} credits", self.estimated_cost)
    }
}

/// `m:ss`, or `h:mm:ss` from an hour up.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).round() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
