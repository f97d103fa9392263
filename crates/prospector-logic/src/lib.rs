//! Pure mission simulation logic for Prospector.
//!
//! Nothing in this crate touches storage, entities or wallets. Functions take
//! plain data plus an injected random source and return results, so every
//! model can be unit-tested and swept from the headless harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`duration`] | Mean, spread and sampling of mission time |
//! | [`equipment`] | Vessel equipment summary, thrust coverage, acceleration |
//! | [`forecast`] | Randomness-free mission projection for status displays |
//! | [`operator`] | Pilot attributes (skill, reliability, yield, speed) |
//! | [`ores`] | Per-ore economy tables with fallbacks |
//! | [`pricing`] | Mission cost and early-return refunds |
//! | [`random`] | Injectable uniform source, Box–Muller noise |
//! | [`reliability`] | Success probability and sampled early termination |
//! | [`tuning`] | JSON-loadable model coefficients |
//! | [`yields`] | Mean, spread and sampling of delivered ore |

pub mod duration;
pub mod equipment;
pub mod forecast;
pub mod operator;
pub mod ores;
pub mod pricing;
pub mod random;
pub mod reliability;
pub mod tuning;
pub mod yields;
