//! Ore economy tables: per-ore travel, mining, yield and rarity parameters.
//!
//! Lookups are case-insensitive. Each table has its own fallback for ores it
//! does not list: speed and yield parameters fall back to the default ore
//! ([`DEFAULT_ORE`]), the mined ratio to 1.0 and rarity to tier 1.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tuning::TuningError;

/// Ore used when a request names none, and the fallback for unknown ores.
pub const DEFAULT_ORE: &str = "Iron";

/// Lowest and highest rarity tiers.
pub const MIN_RARITY: u8 = 1;
pub const MAX_RARITY: u8 = 5;

const FALLBACK_SIGMA0: f64 = 0.15;
const FALLBACK_BASE_YIELD: f64 = 1000.0;
const FALLBACK_CV0: f64 = 0.20;

/// Travel and mining time parameters for one ore.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedParams {
    /// Travel time to the deposit at reference acceleration (seconds).
    pub base_travel_seconds: f64,
    /// Mining time with a single drill (seconds).
    pub base_mine_seconds: f64,
    /// Extra travel share for hard-to-reach deposits.
    pub travel_difficulty: f64,
    /// How strongly extra drills shorten mining.
    pub drill_exponent: f64,
    /// Relative standard deviation of the mission time.
    pub sigma0: f64,
}

/// Yield parameters for one ore.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldParams {
    /// Units delivered by one drill and an unskilled operator.
    pub base_yield: f64,
    /// Coefficient of variation of the delivered amount.
    pub cv0: f64,
}

/// Everything the models know about one ore.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OreParams {
    pub speed: SpeedParams,
    pub yields: YieldParams,
    /// Ore units recovered per unit mined.
    pub mined_ratio: f64,
    /// Price tier, 1 (common) to 5 (rare).
    pub rarity: u8,
}

/// Ore parameter table keyed by lower-cased ore name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "OreTableDoc")]
pub struct OreTable {
    default_ore: String,
    ores: HashMap<String, OreParams>,
}

/// Serialized shape of [`OreTable`]; names may use any case.
#[derive(Deserialize)]
struct OreTableDoc {
    default_ore: String,
    ores: HashMap<String, OreParams>,
}

impl From<OreTableDoc> for OreTable {
    fn from(doc: OreTableDoc) -> Self {
        let mut table = Self::empty(&doc.default_ore);
        for (name, params) in doc.ores {
            table.insert(&name, params);
        }
        table
    }
}

impl OreTable {
    /// An empty table with the given fallback ore name.
    pub fn empty(default_ore: &str) -> Self {
        Self {
            default_ore: default_ore.to_string(),
            ores: HashMap::new(),
        }
    }

    /// Parse a table from JSON (same shape as the serialized form).
    pub fn from_json(text: &str) -> Result<Self, TuningError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn insert(&mut self, ore: &str, params: OreParams) {
        self.ores.insert(ore.to_ascii_lowercase(), params);
    }

    pub fn get(&self, ore: &str) -> Option<&OreParams> {
        if ore.is_empty() {
            return None;
        }
        self.ores.get(&ore.to_ascii_lowercase())
    }

    pub fn contains(&self, ore: &str) -> bool {
        self.get(ore).is_some()
    }

    pub fn default_ore(&self) -> &str {
        &self.default_ore
    }

    /// Resolve a requested ore name, substituting the default for blanks.
    pub fn resolve_name<'a>(&'a self, ore: &'a str) -> &'a str {
        if ore.trim().is_empty() {
            &self.default_ore
        } else {
            ore
        }
    }

    /// Ore names in the table, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ores.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Speed parameters for `ore`, sanitized. `default_drill_exponent`
    /// replaces non-positive exponents.
    pub fn speed(&self, ore: &str, default_drill_exponent: f64) -> SpeedParams {
        let mut p = self
            .get(ore)
            .or_else(|| self.get(&self.default_ore))
            .map(|o| o.speed)
            .unwrap_or(SpeedParams {
                base_travel_seconds: 300.0,
                base_mine_seconds: 600.0,
                travel_difficulty: 0.3,
                drill_exponent: default_drill_exponent,
                sigma0: FALLBACK_SIGMA0,
            });
        if p.drill_exponent <= 0.0 {
            p.drill_exponent = default_drill_exponent;
        }
        if p.sigma0 <= 0.0 {
            p.sigma0 = FALLBACK_SIGMA0;
        }
        p
    }

    /// Yield parameters for `ore`, sanitized.
    pub fn yields(&self, ore: &str) -> YieldParams {
        let mut p = self
            .get(ore)
            .or_else(|| self.get(&self.default_ore))
            .map(|o| o.yields)
            .unwrap_or(YieldParams {
                base_yield: FALLBACK_BASE_YIELD,
                cv0: FALLBACK_CV0,
            });
        if p.base_yield <= 0.0 {
            p.base_yield = FALLBACK_BASE_YIELD;
        }
        if p.cv0 <= 0.0 {
            p.cv0 = FALLBACK_CV0;
        }
        p
    }

    /// Mined-ore ratio; unknown ores recover 1:1.
    pub fn mined_ratio(&self, ore: &str) -> f64 {
        self.get(ore).map(|o| o.mined_ratio).unwrap_or(1.0)
    }

    /// Rarity tier clamped to 1..=5; unknown ores are tier 1.
    pub fn rarity(&self, ore: &str) -> u8 {
        self.get(ore)
            .map(|o| o.rarity.clamp(MIN_RARITY, MAX_RARITY))
            .unwrap_or(MIN_RARITY)
    }
}

impl Default for OreTable {
    fn default() -> Self {
        let mut table = Self::empty(DEFAULT_ORE);
        for &(name, travel, mine, difficulty, exponent, sigma0, base_yield, cv0, ratio, rarity) in
            STOCK_ORES
        {
            table.insert(
                name,
                OreParams {
                    speed: SpeedParams {
                        base_travel_seconds: travel,
                        base_mine_seconds: mine,
                        travel_difficulty: difficulty,
                        drill_exponent: exponent,
                        sigma0,
                    },
                    yields: YieldParams { base_yield, cv0 },
                    mined_ratio: ratio,
                    rarity,
                },
            );
        }
        table
    }
}

// name, travel s, mine s, difficulty, drill exp, sigma0, base yield, cv0, mined ratio, rarity
#[allow(clippy::type_complexity)]
const STOCK_ORES: &[(&str, f64, f64, f64, f64, f64, f64, f64, f64, u8)] = &[
    ("Stone", 180.0, 360.0, 0.10, 0.85, 0.10, 1200.0, 0.20, 5.0, 1),
    ("Iron", 240.0, 480.0, 0.20, 0.80, 0.12, 1000.0, 0.20, 5.0, 1),
    ("Nickel", 260.0, 520.0, 0.25, 0.80, 0.14, 900.0, 0.20, 3.0, 1),
    ("Silicon", 270.0, 540.0, 0.30, 0.78, 0.14, 850.0, 0.20, 3.0, 1),
    ("Ice", 220.0, 420.0, 0.20, 0.82, 0.12, 1100.0, 0.20, 5.0, 1),
    ("Cobalt", 360.0, 520.0, 0.40, 0.72, 0.18, 700.0, 0.25, 3.0, 2),
    ("Magnesium", 420.0, 450.0, 0.55, 0.70, 0.20, 650.0, 0.25, 3.0, 3),
    ("Silver", 520.0, 500.0, 0.70, 0.65, 0.22, 550.0, 0.30, 1.0, 4),
    ("Gold", 560.0, 520.0, 0.75, 0.65, 0.23, 500.0, 0.30, 1.0, 4),
    ("Platinum", 680.0, 420.0, 0.85, 0.62, 0.24, 420.0, 0.30, 1.0, 5),
    ("Uranium", 720.0, 300.0, 0.90, 0.60, 0.25, 380.0, 0.30, 0.3, 5),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_table_has_all_ores() {
        let table = OreTable::default();
        assert_eq!(table.names().len(), 11);
        assert!(table.contains("Uranium"));
        assert_eq!(table.default_ore(), "Iron");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = OreTable::default();
        assert_eq!(table.rarity("gold"), 4);
        assert_eq!(table.rarity("GOLD"), 4);
        assert_eq!(table.mined_ratio("uRaNiUm"), 0.3);
    }

    #[test]
    fn test_unknown_ore_fallbacks() {
        let table = OreTable::default();
        let iron = table.speed("Iron", 0.75);
        assert_eq!(table.speed("Unobtainium", 0.75), iron);
        assert_eq!(table.yields("Unobtainium"), table.yields("Iron"));
        assert_eq!(table.mined_ratio("Unobtainium"), 1.0);
        assert_eq!(table.rarity("Unobtainium"), 1);
        assert_eq!(table.rarity(""), 1);
    }

    #[test]
    fn test_fallback_without_default_ore() {
        let table = OreTable::empty("Iron");
        let speed = table.speed("Gold", 0.75);
        assert_eq!(speed.base_travel_seconds, 300.0);
        assert_eq!(speed.drill_exponent, 0.75);
        assert_eq!(table.yields("Gold").base_yield, 1000.0);
    }

    #[test]
    fn test_sanitizes_bad_params() {
        let mut table = OreTable::empty("Iron");
        table.insert(
            "Slag",
            OreParams {
                speed: SpeedParams {
                    base_travel_seconds: 100.0,
                    base_mine_seconds: 100.0,
                    travel_difficulty: 0.0,
                    drill_exponent: -1.0,
                    sigma0: 0.0,
                },
                yields: YieldParams { base_yield: 0.0, cv0: -0.1 },
                mined_ratio: 2.0,
                rarity: 9,
            },
        );
        let speed = table.speed("Slag", 0.75);
        assert_eq!(speed.drill_exponent, 0.75);
        assert_eq!(speed.sigma0, 0.15);
        let yields = table.yields("Slag");
        assert_eq!(yields.base_yield, 1000.0);
        assert_eq!(yields.cv0, 0.20);
        assert_eq!(table.rarity("Slag"), 5);
    }

    #[test]
    fn test_resolve_blank_name() {
        let table = OreTable::default();
        assert_eq!(table.resolve_name("  "), "Iron");
        assert_eq!(table.resolve_name("Gold"), "Gold");
    }

    #[test]
    fn test_json_roundtrip_case_folds() {
        let json = r#"{
            "default_ore": "Ice",
            "ores": {
                "ICE": {
                    "speed": { "base_travel_seconds": 10.0, "base_mine_seconds": 20.0,
                               "travel_difficulty": 0.0, "drill_exponent": 1.0, "sigma0": 0.1 },
                    "yields": { "base_yield": 50.0, "cv0": 0.1 },
                    "mined_ratio": 2.0,
                    "rarity": 2
                }
            }
        }"#;
        let table = OreTable::from_json(json).unwrap();
        assert_eq!(table.default_ore(), "Ice");
        assert_eq!(table.rarity("ice"), 2);
        assert_eq!(table.speed("anything", 0.75).base_travel_seconds, 10.0);
    }
}
