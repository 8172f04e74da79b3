//! Coverage merge engine.
//!
//! Unions an arbitrary number of per-shape coverages into one. Inputs
//! are merged largest-first into a range-set accumulator at the maximum
//! order, which keeps each union linear in the number of ranges rather
//! than the number of cells. Once the accumulator spans the whole
//! sphere, the remaining inputs are never visited: the result cannot
//! grow further.

use crate::coverage::{Coverage, RangeSet};
use crate::error::{MocError, Result};
use crate::healpix::MAX_ORDER;

/// Cell-set materializations above this size stay in range form.
const MATERIALIZE_LIMIT: u64 = 1 << 22;

/// Statistics from one union pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeStats {
    /// Number of coverages handed in.
    pub inputs_total: usize,

    /// Number of coverages actually folded into the accumulator.
    pub inputs_merged: usize,

    /// Whether full-sky coverage stopped the pass early.
    pub short_circuited: bool,
}

/// Union all coverages into one.
///
/// Fails with [`MocError::EmptyInput`] on an empty batch; callers
/// special-case the zero- and one-coverage paths before invoking this
/// for two or more.
pub fn union_all(coverages: Vec<Coverage>) -> Result<Coverage> {
    union_all_with_stats(coverages).map(|(coverage, _)| coverage)
}

/// Union all coverages, reporting how many inputs were visited.
pub fn union_all_with_stats(mut coverages: Vec<Coverage>) -> Result<(Coverage, MergeStats)> {
    if coverages.is_empty() {
        return Err(MocError::EmptyInput);
    }

    let mut stats = MergeStats {
        inputs_total: coverages.len(),
        ..MergeStats::default()
    };

    // The result is expressed at the finest order any input carries.
    let target_order = coverages.iter().map(Coverage::order).max().unwrap_or(0);

    // Merge into the largest coverage first: restructuring the
    // accumulator's ranges dominates, so growing from the biggest input
    // minimizes the work the smaller ones add.
    coverages.sort_by(|a, b| b.cell_count().cmp(&a.cell_count()));

    let mut inputs = coverages.into_iter();
    let first = inputs.next().ok_or(MocError::EmptyInput)?;
    let mut acc = first.to_range_set(MAX_ORDER);
    stats.inputs_merged = 1;

    for coverage in inputs {
        if acc.is_full_sky() {
            stats.short_circuited = true;
            break;
        }
        acc = acc.union(&coverage.to_range_set(MAX_ORDER));
        stats.inputs_merged += 1;
    }
    if acc.is_full_sky() && stats.inputs_merged < stats.inputs_total {
        stats.short_circuited = true;
    }

    Ok((finalize(acc, target_order), stats))
}

/// Convert the accumulator back to the normalized cell-set form at the
/// target order, unless the materialization would be pathologically
/// large (e.g. full sky at a very fine order).
fn finalize(acc: RangeSet, target_order: u8) -> Coverage {
    let shift = 2 * u32::from(MAX_ORDER - target_order);
    let cell_estimate = (acc.covered() >> shift) + acc.ranges().len() as u64;
    if cell_estimate > MATERIALIZE_LIMIT {
        tracing::debug!(
            target_order,
            cell_estimate,
            "keeping range representation, cell set would be too large"
        );
        return Coverage::Ranges(acc);
    }
    Coverage::Cells(acc.to_cell_set(target_order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::CellSet;
    use crate::healpix::n_cells;
    use std::collections::HashSet;

    fn cov(order: u8, cells: Vec<u64>) -> Coverage {
        Coverage::Cells(CellSet::from_cells(order, cells).unwrap())
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(union_all(vec![]).unwrap_err(), MocError::EmptyInput));
    }

    #[test]
    fn test_single_input_normalizes() {
        let c = cov(3, vec![5, 1, 9, 1]);
        let out = union_all(vec![c.clone()]).unwrap();
        assert_eq!(out, c);
        assert_eq!(out.order(), 3);
    }

    #[test]
    fn test_union_matches_brute_force() {
        let a = cov(4, vec![1, 2, 3, 100, 101]);
        let b = cov(4, vec![3, 4, 200]);
        let c = cov(4, vec![0, 2, 300, 301, 302]);

        let expected: HashSet<u64> = [1u64, 2, 3, 100, 101, 4, 200, 0, 300, 301, 302]
            .into_iter()
            .collect();
        let mut expected: Vec<u64> = expected.into_iter().collect();
        expected.sort_unstable();
        let expected = cov(4, expected);

        let out = union_all(vec![a.clone(), b.clone(), c.clone()]).unwrap();
        assert_eq!(out, expected);

        // Order of inputs must not matter.
        let reordered = union_all(vec![c, a, b]).unwrap();
        assert_eq!(reordered, expected);
    }

    #[test]
    fn test_union_across_orders() {
        // Parent cell at order 1 already covers all four order-2 children.
        let parent = cov(1, vec![9]);
        let children = cov(2, vec![36, 39]);
        let out = union_all(vec![parent.clone(), children]).unwrap();
        assert_eq!(out, parent);
        // Result expressed at the finest input order.
        assert_eq!(out.order(), 2);
    }

    #[test]
    fn test_full_sky_short_circuits() {
        let n = n_cells(1);
        let lower = Coverage::Ranges(
            crate::coverage::RangeSet::from_ranges(1, vec![0..n / 2 + 2]).unwrap(),
        );
        let upper = Coverage::Ranges(
            crate::coverage::RangeSet::from_ranges(1, vec![n / 2 - 2..n]).unwrap(),
        );
        // Small coverages that must never be visited.
        let extras = vec![cov(1, vec![0]), cov(1, vec![1]), cov(1, vec![2])];

        let mut inputs = vec![lower, upper];
        inputs.extend(extras);

        let (out, stats) = union_all_with_stats(inputs).unwrap();
        assert!(out.is_full_sky());
        assert_eq!(stats.inputs_total, 5);
        assert_eq!(stats.inputs_merged, 2, "remaining inputs must be skipped");
        assert!(stats.short_circuited);
    }

    #[test]
    fn test_no_short_circuit_below_full_sky() {
        let inputs = vec![cov(2, vec![0, 1]), cov(2, vec![2]), cov(2, vec![3])];
        let (out, stats) = union_all_with_stats(inputs).unwrap();
        assert_eq!(stats.inputs_merged, 3);
        assert!(!stats.short_circuited);
        assert_eq!(out, cov(2, vec![0, 1, 2, 3]));
    }

    #[test]
    fn test_large_result_stays_in_range_form() {
        let n = n_cells(MAX_ORDER);
        let a = Coverage::Ranges(crate::coverage::RangeSet::from_ranges(MAX_ORDER, vec![0..n / 2]).unwrap());
        let b = Coverage::Ranges(crate::coverage::RangeSet::from_ranges(MAX_ORDER, vec![n / 2..n]).unwrap());
        let out = union_all(vec![a, b]).unwrap();
        assert!(matches!(out, Coverage::Ranges(_)));
        assert!(out.is_full_sky());
    }
}
