//! Seeded coherent noise channels
//!
//! Each channel is an independent OpenSimplex instance seeded with
//! `seed + channel index`, so channels are uncorrelated but reproducible.

use noise::{NoiseFn, OpenSimplex};

/// Independent noise channels used by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseChannel {
    Elevation,
    Temperature,
    Rainfall,
    Detail,
}

impl NoiseChannel {
    fn seed_offset(self) -> u32 {
        match self {
            NoiseChannel::Elevation => 0,
            NoiseChannel::Temperature => 1,
            NoiseChannel::Rainfall => 2,
            NoiseChannel::Detail => 3,
        }
    }
}

/// Pure function of (seed, channel, coordinates)
#[derive(Clone)]
pub struct NoiseField {
    seed: u32,
    elevation: OpenSimplex,
    temperature: OpenSimplex,
    rainfall: OpenSimplex,
    detail: OpenSimplex,
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").field("seed", &self.seed).finish()
    }
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        let make = |channel: NoiseChannel| OpenSimplex::new(seed.wrapping_add(channel.seed_offset()));
        Self {
            seed,
            elevation: make(NoiseChannel::Elevation),
            temperature: make(NoiseChannel::Temperature),
            rainfall: make(NoiseChannel::Rainfall),
            detail: make(NoiseChannel::Detail),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    fn source(&self, channel: NoiseChannel) -> &OpenSimplex {
        match channel {
            NoiseChannel::Elevation => &self.elevation,
            NoiseChannel::Temperature => &self.temperature,
            NoiseChannel::Rainfall => &self.rainfall,
            NoiseChannel::Detail => &self.detail,
        }
    }

    /// Raw sample, roughly in [-1, 1]
    #[inline]
    pub fn sample(&self, channel: NoiseChannel, x: f64, y: f64) -> f64 {
        self.source(channel).get([x, y])
    }

    /// Octave sum: the first weight samples at `frequency`, each following
    /// weight at double the previous frequency
    pub fn octaves(&self, channel: NoiseChannel, x: f64, y: f64, frequency: f64, weights: &[f64]) -> f64 {
        let mut freq = frequency;
        let mut total = 0.0;
        for weight in weights {
            total += self.sample(channel, x * freq, y * freq) * weight;
            freq *= 2.0;
        }
        total
    }

    /// Map a [-1, 1] sample into [0, 1], clamped
    #[inline]
    pub fn normalize(value: f64) -> f64 {
        ((value + 1.0) / 2.0).clamp(0.0, 1.0)
    }
}
