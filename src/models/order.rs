//! Fractional ordering for group membership.
//!
//! Members carry an `f64` position. New positions are picked between two
//! neighbours so existing members keep their values. When no representable
//! value is left between two neighbours the caller rebalances the whole
//! list to integer gaps.

use std::cmp::Ordering;

pub const FIRST_INDEX: f64 = 0.0;
const HEAD_STEP: f64 = 1.0;

/// Position after every existing member, or `0` for an empty list.
pub fn index_after_last(indices: impl IntoIterator<Item = f64>) -> f64 {
    indices
        .into_iter()
        .max_by(|a, b| a.total_cmp(b))
        .map_or(FIRST_INDEX, |max| max + HEAD_STEP)
}

/// Position immediately before `anchor`.
///
/// Returns `None` when the computed value does not land strictly between the
/// neighbours, which means the list has run out of precision there.
pub fn index_before(anchor: f64, prev: Option<f64>) -> Option<f64> {
    let index = match prev {
        Some(prev) => prev + (anchor - prev) / 2.0,
        None => anchor - HEAD_STEP,
    };
    let above_prev = prev.map_or(true, |prev| index > prev);
    (index.is_finite() && above_prev && index < anchor).then_some(index)
}

/// Integer positions for a list of `len` members, in order.
pub fn rebalanced(len: usize) -> impl Iterator<Item = f64> {
    (0..len).map(|i| i as f64)
}

pub fn compare(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

#[cfg(test)]
#[path = "../../tests/unit/models/order.rs"]
mod tests;
