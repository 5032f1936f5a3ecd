//! Deterministic dice for accuracy and critical rolls.
//!
//! A battle never keeps mutable RNG state. Every roll derives its own seed from
//! the battle seed, the round, the cast and a per-roll context, so replaying
//! the same decisions against the same seed reproduces the same commit log.
use crate::ids::{CastId, Round};

/// Stateless source of pseudo-random numbers keyed by seed.
pub trait Dice: Send + Sync {
    fn next_u32(&self, seed: u64) -> u32;

    /// Percentile roll in `1..=100`.
    fn roll_d100(&self, seed: u64) -> u32 {
        self.next_u32(seed) % 100 + 1
    }

    /// Uniform value in `min..=max`.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        min + self.next_u32(seed) % (max - min + 1)
    }
}

/// PCG-XSH-RR: one LCG step followed by xorshift and a random rotation.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgDice;

impl PcgDice {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        xorshifted.rotate_right((state >> 59) as u32)
    }
}

impl Dice for PcgDice {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::output(Self::step(seed))
    }
}

/// Seed for one roll of `cast` in `round`.
///
/// `context` separates independent rolls made by the same firing (hit check
/// per target, critical check, ...).
pub fn roll_seed(battle_seed: u64, round: Round, cast: CastId, context: u32) -> u64 {
    let mut hash = battle_seed;
    hash ^= round.0.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= u64::from(cast.0).wrapping_mul(0x517cc1b727220a95);
    hash ^= u64::from(context).wrapping_mul(0x85ebca6b);

    // murmur3 finalizer
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}
