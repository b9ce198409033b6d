//! Seedable pseudo-random number generator (xorshift64) plus the small
//! `RandomSource` seam scenes draw from, so tests can script the dice.

pub trait RandomSource {
    /// Uniform value in [0, 1).
    fn next_f64(&mut self) -> f64;

    /// Uniform integer in [min, max] (inclusive).
    fn between(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        min + ((self.next_f64() * span).floor() as i64).min(max - min)
    }
}

#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Seed from the platform entropy source (crypto.getRandomValues in the browser).
    pub fn from_entropy() -> Self {
        let mut buf = [0u8; 8];
        if let Err(e) = getrandom::getrandom(&mut buf) {
            log::warn!("entropy unavailable ({e}), using fixed seed");
            return Rng::new(0x9e37_79b9_7f4a_7c15);
        }
        Rng::new(u64::from_le_bytes(buf))
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl RandomSource for Rng {
    fn next_f64(&mut self) -> f64 {
        // 53 high bits -> [0, 1)
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}
