//! RNG module - uniform random pattern selection
//!
//! Every catalog pattern is equally likely on every draw; there is no bag or
//! history. The generator is a small seeded LCG so a session replays the same
//! block sequence for the same seed.

use crate::catalog::{pattern, BlockPattern};
use crate::types::PatternKind;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    ///
    /// Uses the high half of the state; the low bits of an LCG cycle with a short period.
    pub fn next_range(&mut self, max: u32) -> u32 {
        (self.next_u32() >> 16) % max
    }

    /// Current generator state
    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Source of block patterns for a session
#[derive(Debug, Clone)]
pub struct PatternSource {
    rng: SimpleRng,
    seed: u32,
}

impl PatternSource {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
            seed,
        }
    }

    /// Draw the kind of the next block
    pub fn draw_kind(&mut self) -> PatternKind {
        let idx = self.rng.next_range(PatternKind::ALL.len() as u32) as usize;
        PatternKind::ALL[idx]
    }

    /// Draw the next block pattern, uniformly over the catalog
    pub fn draw(&mut self) -> BlockPattern {
        pattern(self.draw_kind())
    }

    /// Seed this source was created with
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for PatternSource {
    fn default() -> Self {
        Self::new(1)
    }
}
