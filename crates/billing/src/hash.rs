//! Deterministic hashing and rounding used by the synthetic generator.
//!
//! `stable_hash` is a polynomial rolling hash (multiplier 31) over UTF-16 code
//! units, truncated to 32 bits. Identical text yields the identical value on
//! every run and every process.

use rust_decimal::{Decimal, RoundingStrategy};

const HASH_MULTIPLIER: u32 = 31;

/// Polynomial rolling hash of `input`, wrapping at 32 bits.
pub fn stable_hash(input: &str) -> u32 {
    input.encode_utf16().fold(0u32, |hash, unit| {
        hash.wrapping_mul(HASH_MULTIPLIER)
            .wrapping_add(u32::from(unit))
    })
}

/// `floor + (hash(seed) % spread)`: the per-scope spend magnitude.
pub fn seeded_magnitude(seed: &str, floor: u32, spread: u32) -> u32 {
    floor + stable_hash(seed) % spread.max(1)
}

/// Pass/fail flag derived from a seed, true roughly once every `modulus` seeds.
pub fn seeded_flag(seed: &str, modulus: u32) -> bool {
    stable_hash(seed) % modulus.max(1) == 0
}

/// Round to 2 decimal places, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
