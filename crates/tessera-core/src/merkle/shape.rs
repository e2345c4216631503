//! Canonical tree shape
//!
//! The shape needs no placeholder leaves. For `n > 1` leaves, with `k` the
//! largest power of two strictly below `n`:
//!
//! ```text
//! MTH(leaves[0..n]) = H(MTH(leaves[0..k]) || MTH(leaves[k..n]))
//! ```
//!
//! Row by row this is the same as pairing adjacent nodes and promoting an
//! unpaired last node unchanged to the next row, so row `r` always holds
//! `ceil(n / 2^r)` entries and there are `depth_for(n)` rows.

use tessera_crypto::{Digest, Hasher};

/// Smallest power of two `>= n` (0 for 0)
pub fn next_pow2(n: usize) -> usize {
    match n {
        0 => 0,
        _ => n.next_power_of_two(),
    }
}

/// Largest power of two `<= n` (0 for 0)
pub fn prev_pow2(n: usize) -> usize {
    match n {
        0 => 0,
        _ => 1 << log2(n),
    }
}

/// Floor of the base-2 logarithm (0 for 0)
pub fn log2(n: usize) -> usize {
    n.checked_ilog2().unwrap_or(0) as usize
}

/// Number of rows for `size` leaves
pub fn depth_for(size: usize) -> usize {
    match size {
        0 => 0,
        _ => log2(next_pow2(size)) + 1,
    }
}

/// Largest power of two strictly less than `n` (0 when `n < 2`)
pub fn split_point(n: usize) -> usize {
    prev_pow2(n.saturating_sub(1))
}

/// Number of entries in `row` for `size` leaves
pub fn row_len(size: usize, row: usize) -> usize {
    match row {
        0 => size,
        _ if row >= usize::BITS as usize => usize::from(size > 0),
        _ => size.div_ceil(1 << row),
    }
}

/// Root of the canonical shape computed by direct recursion
///
/// This is the reference the incremental algorithm is checked against.
pub fn canonical_root<H: Hasher>(leaves: &[Digest]) -> Option<Digest> {
    match leaves.len() {
        0 => None,
        1 => Some(leaves[0]),
        n => {
            let (left, right) = leaves.split_at(split_point(n));
            let left = canonical_root::<H>(left)?;
            let right = canonical_root::<H>(right)?;
            Some(H::hash_pair(&left, &right))
        }
    }
}
