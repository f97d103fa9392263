//! Injectable random source for the mission models.
//!
//! The models only ever need uniform draws in `[0, 1)`. Any `rand`
//! generator works as a source; [`ScriptedSource`] replays fixed values so
//! tests can pin exact outcomes.

use std::collections::VecDeque;
use std::f64::consts::PI;

use rand::{Rng, RngCore};

/// A source of uniform draws in `[0, 1)`.
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

impl<R: RngCore> UniformSource for R {
    fn next_uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
///
/// Values are returned as given, including pathological ones such as `0.0`
/// or `1.0`, so the models' guards can be exercised directly.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    script: Vec<f64>,
    pending: VecDeque<f64>,
}

impl ScriptedSource {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let script = values.into();
        Self {
            pending: script.iter().copied().collect(),
            script,
        }
    }

    /// A source that always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl UniformSource for ScriptedSource {
    fn next_uniform(&mut self) -> f64 {
        if self.pending.is_empty() {
            self.pending.extend(self.script.iter().copied());
        }
        self.pending.pop_front().unwrap_or(0.5)
    }
}

/// Standard normal draw via the Box–Muller transform.
///
/// Both uniforms are reflected to `(0, 1]` so a zero draw does not hit
/// `ln(0)` on the usual path. Scripted `1.0` draws can still produce an
/// infinite result; callers fall back to the mean for non-finite samples.
pub fn gaussian(rng: &mut (impl UniformSource + ?Sized)) -> f64 {
    let u1 = 1.0 - rng.next_uniform();
    let u2 = 1.0 - rng.next_uniform();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// `mean + gaussian × std`, with non-finite results replaced by `mean`.
pub fn perturb(mean: f64, std: f64, rng: &mut (impl UniformSource + ?Sized)) -> f64 {
    let value = if std > 0.0 {
        mean + gaussian(rng) * std
    } else {
        mean
    };
    if value.is_finite() {
        value
    } else {
        mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rng_draws_are_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let u = rng.next_uniform();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_scripted_source_cycles() {
        let mut src = ScriptedSource::new(vec![0.1, 0.2]);
        assert_eq!(src.next_uniform(), 0.1);
        assert_eq!(src.next_uniform(), 0.2);
        assert_eq!(src.next_uniform(), 0.1);
    }

    #[test]
    fn test_gaussian_median_draw() {
        // u1 = 1 - 0.0 = 1 → radius 0 → exactly zero.
        let mut src = ScriptedSource::new(vec![0.0, 0.3]);
        assert_eq!(gaussian(&mut src), 0.0);
    }

    #[test]
    fn test_perturb_non_finite_falls_back_to_mean() {
        // u1 = 1 - 1.0 = 0 → ln(0) = -inf → infinite radius.
        let mut src = ScriptedSource::constant(1.0);
        assert_eq!(perturb(100.0, 10.0, &mut src), 100.0);
    }

    #[test]
    fn test_perturb_zero_std_is_mean() {
        let mut src = ScriptedSource::constant(0.9);
        assert_eq!(perturb(42.0, 0.0, &mut src), 42.0);
    }

    #[test]
    fn test_gaussian_moments() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| gaussian(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.1, "var {var}");
    }
}
