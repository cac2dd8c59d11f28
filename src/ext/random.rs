/// Seeded xorshift64* generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0xA5A5_A5A5_A5A5_A5A5 } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform index in `0..len`; `len` must be non-zero.
    pub fn below(&mut self, len: usize) -> usize {
        (self.next_f64() * len as f64) as usize % len
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(0)
    }
}
