// Fast per-worker random number generator (PCG-LCG).
//
// Each worker thread owns one FastRng; histories derive independent streams
// with `for_history`, which skips the base LCG ahead by a fixed stride in
// O(log n) so that worker streams never overlap.

use rand::{RngCore, SeedableRng};

/// LCG multiplier
const PRN_MULT: u64 = 6364136223846793005;
/// LCG additive constant
const PRN_ADD: u64 = 1442695040888963407;
/// Draws reserved per particle history
const PRN_STRIDE: u64 = 152917;

/// PCG variant using an LCG base generator with RXS-M-XS output permutation.
///
/// Reference: Melissa E. O'Neill, "PCG: A Family of Simple Fast
/// Space-Efficient Statistically Good Algorithms for Random Number
/// Generation"
#[derive(Clone, Copy, Debug)]
pub struct FastRng {
    seed: u64,
}

/// Advance an LCG state by `n` steps in O(log n).
///
/// Uses the standard skip-ahead identity for x' = g*x + c mod 2^64:
/// the n-step multiplier and increment are accumulated by binary
/// decomposition of n.
fn lcg_skip(seed: u64, n: u64) -> u64 {
    let mut g = PRN_MULT;
    let mut c = PRN_ADD;
    let mut g_new: u64 = 1;
    let mut c_new: u64 = 0;
    let mut n = n;
    while n > 0 {
        if n & 1 == 1 {
            g_new = g_new.wrapping_mul(g);
            c_new = c_new.wrapping_mul(g).wrapping_add(c);
        }
        c = c.wrapping_mul(g.wrapping_add(1));
        g = g.wrapping_mul(g);
        n >>= 1;
    }
    g_new.wrapping_mul(seed).wrapping_add(c_new)
}

impl FastRng {
    /// Create a new FastRng with the given seed
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Independent stream for a given particle history: the state is the
    /// master seed skipped ahead by `history * PRN_STRIDE` draws.
    #[inline]
    pub fn for_history(master_seed: u64, history: u64) -> Self {
        Self {
            seed: lcg_skip(master_seed, history.wrapping_mul(PRN_STRIDE)),
        }
    }

    /// Generate a random f64 in [0, 1)
    #[inline(always)]
    pub fn random(&mut self) -> f64 {
        // Advance the LCG
        self.seed = PRN_MULT.wrapping_mul(self.seed).wrapping_add(PRN_ADD);

        // PCG output permutation (RXS-M-XS variant)
        let word = ((self.seed >> ((self.seed >> 59) + 5)) ^ self.seed)
            .wrapping_mul(12605985483714917081);
        let result = (word >> 43) ^ word;

        // Convert to f64 in [0, 1) - equivalent to ldexp(result, -64)
        (result as f64) * 5.421010862427522e-20
    }

    /// Reseed the RNG (for reuse across histories)
    #[inline]
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
    }
}

impl SeedableRng for FastRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self {
            seed: u64::from_le_bytes(seed),
        }
    }
}

impl RngCore for FastRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        // Advance the LCG
        self.seed = PRN_MULT.wrapping_mul(self.seed).wrapping_add(PRN_ADD);

        // PCG output permutation
        let word = ((self.seed >> ((self.seed >> 59) + 5)) ^ self.seed)
            .wrapping_mul(12605985483714917081);
        (word >> 43) ^ word
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut left = dest;
        while left.len() >= 8 {
            let bytes = self.next_u64().to_le_bytes();
            left[..8].copy_from_slice(&bytes);
            left = &mut left[8..];
        }
        if !left.is_empty() {
            let bytes = self.next_u64().to_le_bytes();
            left.copy_from_slice(&bytes[..left.len()]);
        }
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
