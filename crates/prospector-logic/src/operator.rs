//! Operator (pilot) attributes resolved from the selected profile.

use serde::{Deserialize, Serialize};

/// Highest attribute level.
pub const MAX_LEVEL: u8 = 5;

/// The four attribute dimensions of a mission operator, each 0–5.
///
/// A mission without a selected operator uses [`OperatorAttributes::UNSKILLED`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatorAttributes {
    /// Overall skill: drill cap and price tier.
    pub skill: u8,
    /// Reliability: success probability and long-mission tolerance.
    pub reliability: u8,
    /// Yield: mean delivered amount and its consistency.
    pub yield_skill: u8,
    /// Speed: mission time and its consistency.
    pub speed: u8,
}

impl OperatorAttributes {
    pub const UNSKILLED: Self = Self {
        skill: 0,
        reliability: 0,
        yield_skill: 0,
        speed: 0,
    };

    pub fn new(skill: u8, reliability: u8, yield_skill: u8, speed: u8) -> Self {
        Self {
            skill,
            reliability,
            yield_skill,
            speed,
        }
    }

    /// Copy with every attribute clamped to `0..=MAX_LEVEL`.
    pub fn clamped(self) -> Self {
        Self {
            skill: self.skill.min(MAX_LEVEL),
            reliability: self.reliability.min(MAX_LEVEL),
            yield_skill: self.yield_skill.min(MAX_LEVEL),
            speed: self.speed.min(MAX_LEVEL),
        }
    }
}

/// Clamp a raw level into `0..=MAX_LEVEL` and widen it for the formulas.
pub(crate) fn level(value: u8) -> f64 {
    f64::from(value.min(MAX_LEVEL))
}
