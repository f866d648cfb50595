//! Measurement noise for the simulated temperature sensor.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Source of additive measurement noise.
pub trait NoiseSource: fmt::Debug + Send {
    /// Draw one sample from `[-amplitude, amplitude]`.
    fn sample(&mut self, amplitude: f64) -> f64;
}

/// Uniformly distributed noise.
#[derive(Debug, Clone)]
pub struct UniformNoise {
    rng: StdRng,
}

impl UniformNoise {
    /// Reproducible noise stream.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl NoiseSource for UniformNoise {
    fn sample(&mut self, amplitude: f64) -> f64 {
        if !(amplitude > 0.0) || !amplitude.is_finite() {
            return 0.0;
        }
        self.rng.gen_range(-amplitude..=amplitude)
    }
}

/// Noise-free sensor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn sample(&mut self, _amplitude: f64) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_noise_stays_in_band() {
        let mut noise = UniformNoise::seeded(7);
        for _ in 0..10_000 {
            let n = noise.sample(0.5);
            assert!((-0.5..=0.5).contains(&n));
        }
    }

    #[test]
    fn seeded_noise_is_reproducible() {
        let mut a = UniformNoise::seeded(42);
        let mut b = UniformNoise::seeded(42);
        for _ in 0..100 {
            assert_eq!(a.sample(0.5), b.sample(0.5));
        }
    }

    #[test]
    fn zero_amplitude_is_silent() {
        let mut noise = UniformNoise::from_entropy();
        assert_eq!(noise.sample(0.0), 0.0);
        assert_eq!(noise.sample(-1.0), 0.0);
        assert_eq!(NoNoise.sample(0.5), 0.0);
    }
}
