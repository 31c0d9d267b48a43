//! Overwrite patterns: the pass sequence, per-pass byte generators, and the
//! process-wide seed source random passes draw from.
//!
//! Random passes are reproducible from their seed. They exist to defeat
//! trivial pattern recovery, not targeted cryptanalysis, so a plain seeded
//! `StdRng` is used rather than an OS entropy stream per byte.

#![allow(missing_docs)]

use std::fmt;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// What a single pass writes over the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Pseudo-random bytes from a freshly seeded generator.
    Random,
    /// The same byte repeated over the whole file.
    Constant(u8),
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => f.write_str("random"),
            Self::Constant(byte) => write!(f, "{byte:#04x}"),
        }
    }
}

/// Seven passes alternating random fill with saturation patterns, ending on
/// all zeros.
pub const STANDARD_PASSES: [PassKind; 7] = [
    PassKind::Random,
    PassKind::Constant(0xFF),
    PassKind::Random,
    PassKind::Constant(0x00),
    PassKind::Constant(0xFF),
    PassKind::Random,
    PassKind::Constant(0x00),
];

/// Supplies one seed per random pass.
///
/// Shared by every worker in a run; implementations must be safe to call
/// concurrently.
pub trait SeedSource: Send + Sync {
    fn next_seed(&self) -> u64;
}

/// Seed source backed by a single `StdRng` behind a mutex.
pub struct RngSeedSource {
    rng: Mutex<StdRng>,
}

impl RngSeedSource {
    /// Seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Seeded deterministically; every run yields the same seed sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl SeedSource for RngSeedSource {
    fn next_seed(&self) -> u64 {
        self.rng.lock().next_u64()
    }
}

/// Infinite byte producer for one pass.
pub enum ByteGenerator {
    Constant(u8),
    Random(RandomBytes),
}

impl ByteGenerator {
    pub fn constant(byte: u8) -> Self {
        Self::Constant(byte)
    }

    pub fn random(seed: u64) -> Self {
        Self::Random(RandomBytes::new(seed))
    }

    /// Build the generator for `kind`, drawing a seed only for random passes.
    pub fn for_pass(kind: PassKind, seeds: &dyn SeedSource) -> Self {
        match kind {
            PassKind::Random => Self::random(seeds.next_seed()),
            PassKind::Constant(byte) => Self::constant(byte),
        }
    }

    pub fn next_byte(&mut self) -> u8 {
        match self {
            Self::Constant(byte) => *byte,
            Self::Random(random) => random.next_byte(),
        }
    }

    /// Fill `out` with exactly the bytes `next_byte` would have produced.
    pub fn fill(&mut self, out: &mut [u8]) {
        match self {
            Self::Constant(byte) => out.fill(*byte),
            Self::Random(random) => random.fill(out),
        }
    }
}

impl Iterator for ByteGenerator {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        Some(self.next_byte())
    }
}

/// Seeded pseudo-random bytes, eight per 64-bit draw, least significant first.
pub struct RandomBytes {
    rng: StdRng,
    word: [u8; 8],
    offset: usize,
}

impl RandomBytes {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let word = rng.next_u64().to_le_bytes();
        Self {
            rng,
            word,
            offset: 0,
        }
    }

    fn refill(&mut self) {
        self.word = self.rng.next_u64().to_le_bytes();
        self.offset = 0;
    }

    pub fn next_byte(&mut self) -> u8 {
        if self.offset == self.word.len() {
            self.refill();
        }
        let byte = self.word[self.offset];
        self.offset += 1;
        byte
    }

    pub fn fill(&mut self, out: &mut [u8]) {
        // Drain what is left of the current word first.
        let leftover = (self.word.len() - self.offset).min(out.len());
        out[..leftover].copy_from_slice(&self.word[self.offset..self.offset + leftover]);
        self.offset += leftover;

        let mut chunks = out[leftover..].chunks_exact_mut(8);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&self.rng.next_u64().to_le_bytes());
        }
        let tail = chunks.into_remainder();
        if !tail.is_empty() {
            self.refill();
            let len = tail.len();
            tail.copy_from_slice(&self.word[..len]);
            self.offset = len;
        }
    }
}
