//! Injectable source of uniform samples in `[0, 1)`.
//!
//! Every probabilistic decision in the core (seed selection, bias rules,
//! source blending, delay draws) samples through this handle so determinism
//! is a constructor argument, never a hidden global.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

type Sampler = Box<dyn FnMut() -> f64 + Send>;

/// Cloneable handle over a sampler function returning values in `[0, 1)`.
#[derive(Clone)]
pub struct UnitRng {
    inner: Arc<Mutex<Sampler>>,
}

impl UnitRng {
    pub fn new(sampler: impl FnMut() -> f64 + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(sampler))),
        }
    }

    /// Always returns the same sample. `UnitRng::fixed(0.0)` forces "first
    /// candidate in sorted order" everywhere a uniform pick happens.
    #[must_use]
    pub fn fixed(sample: f64) -> Self {
        Self::new(move || sample)
    }

    /// Replays `samples` in order, repeating the last one once exhausted.
    #[must_use]
    pub fn sequence(samples: Vec<f64>) -> Self {
        let mut queue = samples;
        queue.reverse();
        let mut last = 0.0;
        Self::new(move || {
            if let Some(next) = queue.pop() {
                last = next;
            }
            last
        })
    }

    pub fn from_rng<R: Rng + Send + 'static>(mut rng: R) -> Self {
        Self::new(move || rng.gen_range(0.0..1.0))
    }

    pub fn sample(&self) -> f64 {
        let mut sampler = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        sampler()
    }
}

impl Default for UnitRng {
    /// Non-cryptographic platform RNG.
    fn default() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }
}

impl fmt::Debug for UnitRng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UnitRng")
    }
}
