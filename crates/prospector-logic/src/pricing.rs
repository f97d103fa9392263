//! Mission pricing and early-return refunds.

use crate::operator::{level, MAX_LEVEL};
use crate::ores::{OreTable, MAX_RARITY, MIN_RARITY};
use crate::tuning::PricingTuning;

/// Price of a mission lasting `mission_seconds`, rounded up to whole credits.
///
/// `base_price[skill] + rate[rarity] × (1 + m·skill) × minutes`. Skill and
/// rarity indices past the end of their tables use the last entry; negative
/// or non-finite durations count as zero.
pub fn mission_cost(skill: u8, rarity: u8, mission_seconds: f64, tuning: &PricingTuning) -> i64 {
    let skill_index = usize::from(skill.min(MAX_LEVEL));
    let base = lookup(&tuning.base_price_by_skill, skill_index).unwrap_or(0) as f64;

    let rarity_index = usize::from(rarity.clamp(MIN_RARITY, MAX_RARITY));
    let rate = lookup(&tuning.rate_per_minute_by_rarity, rarity_index).unwrap_or(0.0);
    let multiplier = 1.0 + tuning.skill_rate_multiplier * level(skill);

    let seconds = if mission_seconds.is_finite() {
        mission_seconds.max(0.0)
    } else {
        0.0
    };
    (base + rate * multiplier * seconds / 60.0).ceil() as i64
}

/// Price of a mission for `ore`, looking up its rarity in `ores`.
pub fn estimate_mission_cost(
    ores: &OreTable,
    tuning: &PricingTuning,
    skill: u8,
    ore: &str,
    mission_seconds: f64,
) -> i64 {
    mission_cost(skill, ores.rarity(ore), mission_seconds, tuning)
}

/// Credits owed back after an early return: the difference between the full
/// price and the price of the time actually flown, never negative. Missions
/// that did not fail are never refunded.
pub fn refund_amount(full_cost: i64, actual_cost: i64, failed: bool) -> i64 {
    if !failed {
        return 0;
    }
    full_cost.saturating_sub(actual_cost).max(0)
}

fn lookup<T: Copy>(table: &[T], index: usize) -> Option<T> {
    table.get(index).or_else(|| table.last()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unskilled_iron_ten_minutes() {
        let ores = OreTable::default();
        let t = PricingTuning::default();
        assert_eq!(estimate_mission_cost(&ores, &t, 0, "Iron", 600.0), 2000);
    }

    #[test]
    fn test_rounds_up() {
        let t = PricingTuning::default();
        // 1000 + 100 × 1 × 0.5 s / 60 = 1000.83…
        assert_eq!(mission_cost(0, 1, 0.5, &t), 1001);
    }

    #[test]
    fn test_skill_surcharge() {
        let t = PricingTuning::default();
        // 6000 + 750 × 1.5 × 2 = 8250
        assert_eq!(mission_cost(5, 5, 120.0, &t), 8250);
        assert_eq!(mission_cost(9, 9, 120.0, &t), 8250);
    }

    #[test]
    fn test_negative_duration_is_base_only() {
        let t = PricingTuning::default();
        assert_eq!(mission_cost(2, 3, -50.0, &t), 2000);
        assert_eq!(mission_cost(2, 3, f64::NAN, &t), 2000);
    }

    #[test]
    fn test_short_tables_use_last_entry() {
        let t = PricingTuning {
            base_price_by_skill: vec![500],
            rate_per_minute_by_rarity: vec![0.0, 60.0],
            skill_rate_multiplier: 0.0,
        };
        assert_eq!(mission_cost(4, 5, 60.0, &t), 560);
    }

    #[test]
    fn test_refund() {
        assert_eq!(refund_amount(2000, 800, true), 1200);
        assert_eq!(refund_amount(2000, 2000, true), 0);
        assert_eq!(refund_amount(2000, 2500, true), 0);
        assert_eq!(refund_amount(2000, 800, false), 0);
    }
}
