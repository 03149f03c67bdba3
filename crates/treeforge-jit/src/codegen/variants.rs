//! Canonical condition-vector variants.
//!
//! A leaf path fixes `S` of the `M = 2^S - 1` condition bits. The remaining
//! bits are don't-cares, so every leaf owns `2^(M - S)` concrete vectors.
//! Across all leaves of a subtree these sets partition `[0, 2^M)`, which is
//! what makes the jump table total.

use super::paths::PathBits;

/// Vector with every fixed bit set to its required value and all others zero.
pub fn fixed_template(bits: &PathBits) -> u64 {
    bits.iter()
        .fold(0, |vector, (&bit, &value)| vector | (u64::from(value) << bit))
}

/// All vectors of `condition_bits` bits that agree with `bits`.
pub fn expand_variants(condition_bits: u32, bits: &PathBits) -> Vec<u64> {
    let free: Vec<u32> = (0..condition_bits)
        .filter(|bit| !bits.contains_key(bit))
        .collect();

    let mut result = Vec::with_capacity(1 << free.len());
    vary(fixed_template(bits), &free, &mut result);
    debug_assert_eq!(result.len(), 1 << free.len());
    result
}

fn vary(vector: u64, free: &[u32], result: &mut Vec<u64>) {
    match free.split_first() {
        None => result.push(vector),
        Some((&bit, rest)) => {
            let mask = 1u64 << bit;
            debug_assert_eq!(vector & mask, 0, "bit {bit} varied twice");
            vary(vector | mask, rest, result);
            vary(vector, rest, result);
        }
    }
}
