use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SleepBand;

/// Source of the randomized waits used while a page renders.
pub trait JitterSource: Send {
    /// Pick a duration inside `band` (both ends inclusive).
    fn pick(&mut self, band: SleepBand) -> Duration;
}

/// Millisecond-granular uniform jitter backed by a seeded RNG.
#[derive(Debug, Clone)]
pub struct RandomJitter {
    rng: StdRng,
}

impl RandomJitter {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl JitterSource for RandomJitter {
    fn pick(&mut self, band: SleepBand) -> Duration {
        let min = band.min.as_millis() as u64;
        let max = band.max.as_millis() as u64;
        if max <= min {
            return band.min;
        }
        Duration::from_millis(self.rng.gen_range(min..=max))
    }
}

/// Replays a fixed list of offsets from each band's minimum, clamped to
/// the band. Once the list runs out every pick is the band minimum.
#[derive(Debug, Clone, Default)]
pub struct FixedJitter {
    offsets: VecDeque<Duration>,
}

impl FixedJitter {
    pub fn new(offsets: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            offsets: offsets.into_iter().collect(),
        }
    }

    /// Always the lower end of the band.
    pub fn minimum() -> Self {
        Self::default()
    }
}

impl JitterSource for FixedJitter {
    fn pick(&mut self, band: SleepBand) -> Duration {
        let offset = self.offsets.pop_front().unwrap_or_default();
        (band.min + offset).min(band.max)
    }
}
