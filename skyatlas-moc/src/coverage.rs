//! Coverage representations.
//!
//! A coverage is the set of HEALPix cells a region (or a union of
//! regions) occupies. Two interchangeable forms are kept behind the
//! [`Coverage`] sum type:
//!
//! - [`CellSet`]: sorted, deduplicated leaf cell indices at one order.
//!   The normalized form handed back to callers.
//! - [`RangeSet`]: sorted, coalesced half-open index ranges at a single
//!   reference order. The merge engine works on ranges at
//!   [`MAX_ORDER`](crate::healpix::MAX_ORDER) so unions of many large
//!   coverages stay linear in the number of ranges instead of the number
//!   of cells.
//!
//! Conversions between the two forms are lossless. Equality between
//! coverages is semantic: two coverages are equal when they cover the
//! same solid angle, regardless of which form or order they carry.

use crate::error::Result;
use crate::geometry::SphericalPoint;
use crate::healpix::{self, n_cells, MAX_ORDER};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One hierarchical sphere partition element: an (order, index) pair.
///
/// Invariant: `idx < 12 * 4^order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Resolution level, `0..=29`.
    pub order: u8,

    /// Nested-scheme cell index, unique within an order.
    pub idx: u64,
}

/// Sorted, deduplicated cell indices at a single order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSet {
    order: u8,
    cells: Vec<u64>,
}

impl CellSet {
    /// Build a cell set from arbitrary indices at the given order.
    /// Indices are sorted and deduplicated.
    pub fn from_cells(order: u8, mut cells: Vec<u64>) -> Result<Self> {
        healpix::check_order(order)?;
        cells.sort_unstable();
        cells.dedup();
        debug_assert!(cells.last().map_or(true, |&c| c < n_cells(order)));
        Ok(Self { order, cells })
    }

    /// Empty set at the given order. Order is assumed valid.
    pub(crate) fn empty(order: u8) -> Self {
        Self {
            order,
            cells: Vec::new(),
        }
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    /// Sorted cell indices.
    pub fn cells(&self) -> &[u64] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether a cell index at this set's order is covered.
    pub fn contains_idx(&self, idx: u64) -> bool {
        self.cells.binary_search(&idx).is_ok()
    }

    /// Convert to coalesced ranges at `target_order >= self.order`.
    pub fn to_range_set(&self, target_order: u8) -> RangeSet {
        debug_assert!(target_order >= self.order && target_order <= MAX_ORDER);
        let shift = 2 * u32::from(target_order - self.order);
        let mut ranges: Vec<Range<u64>> = Vec::new();
        for &idx in &self.cells {
            let start = idx << shift;
            let end = (idx + 1) << shift;
            match ranges.last_mut() {
                Some(last) if last.end == start => last.end = end,
                _ => ranges.push(start..end),
            }
        }
        RangeSet {
            order: target_order,
            ranges,
        }
    }
}

/// Sorted, disjoint, coalesced half-open index ranges at one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSet {
    order: u8,
    ranges: Vec<Range<u64>>,
}

impl RangeSet {
    /// Build a range set from arbitrary ranges at the given order.
    /// Ranges are sorted, empty ranges dropped, overlaps coalesced.
    pub fn from_ranges(order: u8, mut ranges: Vec<Range<u64>>) -> Result<Self> {
        healpix::check_order(order)?;
        ranges.retain(|r| r.start < r.end);
        ranges.sort_unstable_by_key(|r| r.start);
        let mut coalesced: Vec<Range<u64>> = Vec::with_capacity(ranges.len());
        for r in ranges {
            match coalesced.last_mut() {
                Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
                _ => coalesced.push(r),
            }
        }
        Ok(Self {
            order,
            ranges: coalesced,
        })
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    /// Sorted disjoint ranges.
    pub fn ranges(&self) -> &[Range<u64>] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of covered indices at this set's order.
    pub fn covered(&self) -> u64 {
        self.ranges.iter().map(|r| r.end - r.start).sum()
    }

    /// Terminal state: the ranges span the entire index space at this
    /// order. Further unions cannot grow the coverage.
    pub fn is_full_sky(&self) -> bool {
        self.ranges.len() == 1 && self.ranges[0].start == 0 && self.ranges[0].end == n_cells(self.order)
    }

    /// Whether a cell index at this set's order is covered.
    pub fn contains_idx(&self, idx: u64) -> bool {
        let i = self.ranges.partition_point(|r| r.end <= idx);
        self.ranges.get(i).is_some_and(|r| r.start <= idx)
    }

    /// Union with another range set at the same order. Linear merge of
    /// the two sorted range lists.
    pub fn union(&self, other: &RangeSet) -> RangeSet {
        debug_assert_eq!(self.order, other.order);
        let a = &self.ranges;
        let b = &other.ranges;
        let mut out: Vec<Range<u64>> = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() || j < b.len() {
            let next = if j >= b.len() || (i < a.len() && a[i].start <= b[j].start) {
                let r = a[i].clone();
                i += 1;
                r
            } else {
                let r = b[j].clone();
                j += 1;
                r
            };
            match out.last_mut() {
                Some(last) if next.start <= last.end => last.end = last.end.max(next.end),
                _ => out.push(next),
            }
        }
        RangeSet {
            order: self.order,
            ranges: out,
        }
    }

    /// Whether any index is covered by both range sets.
    pub fn intersects(&self, other: &RangeSet) -> bool {
        debug_assert_eq!(self.order, other.order);
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let a = &self.ranges[i];
            let b = &other.ranges[j];
            if a.start < b.end && b.start < a.end {
                return true;
            }
            if a.end <= b.end {
                i += 1;
            } else {
                j += 1;
            }
        }
        false
    }

    /// Rescale to `target_order >= self.order`.
    pub fn upshift(&self, target_order: u8) -> RangeSet {
        debug_assert!(target_order >= self.order && target_order <= MAX_ORDER);
        let shift = 2 * u32::from(target_order - self.order);
        RangeSet {
            order: target_order,
            ranges: self
                .ranges
                .iter()
                .map(|r| (r.start << shift)..(r.end << shift))
                .collect(),
        }
    }

    /// Materialize as leaf cells at `target_order <= self.order`.
    ///
    /// Range endpoints that do not align to the target order are rounded
    /// outward, so the result never under-covers the ranges.
    pub fn to_cell_set(&self, target_order: u8) -> CellSet {
        debug_assert!(target_order <= self.order);
        let shift = 2 * u32::from(self.order - target_order);
        let round_up = (1u64 << shift) - 1;
        let mut cells: Vec<u64> = Vec::new();
        for r in &self.ranges {
            let start = r.start >> shift;
            let end = (r.end + round_up) >> shift;
            let resume = match cells.last() {
                Some(&last) if last >= start => last + 1,
                _ => start,
            };
            cells.extend(resume..end);
        }
        CellSet {
            order: target_order,
            cells,
        }
    }
}

/// A region's (or union's) coverage of the sphere, in either the
/// normalized cell-set form or the internal range-set form.
///
/// Immutable from the caller's perspective once produced. Equality is
/// semantic: compared as ranges at the maximum order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Coverage {
    /// Normalized leaf cells at one order.
    Cells(CellSet),

    /// Compacted ordered intervals at one reference order.
    Ranges(RangeSet),
}

impl Coverage {
    /// The order this coverage is expressed at.
    pub fn order(&self) -> u8 {
        match self {
            Coverage::Cells(c) => c.order(),
            Coverage::Ranges(r) => r.order(),
        }
    }

    /// Number of covered cells at this coverage's own order.
    pub fn cell_count(&self) -> u64 {
        match self {
            Coverage::Cells(c) => c.len() as u64,
            Coverage::Ranges(r) => r.covered(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Fraction of the full sphere covered, in `[0, 1]`.
    pub fn sky_fraction(&self) -> f64 {
        self.cell_count() as f64 / n_cells(self.order()) as f64
    }

    /// Whether the coverage spans the entire sphere.
    pub fn is_full_sky(&self) -> bool {
        self.cell_count() == n_cells(self.order())
    }

    /// Convert to the range-set form at `target_order` (>= this
    /// coverage's order).
    pub fn to_range_set(&self, target_order: u8) -> RangeSet {
        match self {
            Coverage::Cells(c) => c.to_range_set(target_order),
            Coverage::Ranges(r) => r.upshift(target_order),
        }
    }

    /// Whether the given sky position falls inside the coverage.
    pub fn contains_point(&self, point: &SphericalPoint) -> bool {
        match self {
            Coverage::Cells(c) => c.contains_idx(healpix::hash(c.order(), point)),
            Coverage::Ranges(r) => r.contains_idx(healpix::hash(r.order(), point)),
        }
    }

    /// Whether this coverage shares any solid angle with another,
    /// regardless of the orders the two are expressed at.
    pub fn intersects(&self, other: &Coverage) -> bool {
        self.to_range_set(MAX_ORDER)
            .intersects(&other.to_range_set(MAX_ORDER))
    }

    /// Enumerate covered cells at this coverage's own order.
    pub fn iter_cells(&self) -> Box<dyn Iterator<Item = Cell> + '_> {
        match self {
            Coverage::Cells(c) => {
                let order = c.order();
                Box::new(c.cells().iter().map(move |&idx| Cell { order, idx }))
            }
            Coverage::Ranges(r) => {
                let order = r.order();
                Box::new(
                    r.ranges()
                        .iter()
                        .flat_map(move |rg| rg.clone().map(move |idx| Cell { order, idx })),
                )
            }
        }
    }
}

impl PartialEq for Coverage {
    fn eq(&self, other: &Self) -> bool {
        self.to_range_set(MAX_ORDER) == other.to_range_set(MAX_ORDER)
    }
}

impl Eq for Coverage {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_set_sorts_and_dedups() {
        let cs = CellSet::from_cells(2, vec![7, 3, 3, 1, 7]).unwrap();
        assert_eq!(cs.cells(), &[1, 3, 7]);
        assert!(cs.contains_idx(3));
        assert!(!cs.contains_idx(4));
    }

    #[test]
    fn test_cell_set_rejects_bad_order() {
        assert!(CellSet::from_cells(30, vec![0]).is_err());
    }

    #[test]
    fn test_cell_to_ranges_coalesces_siblings() {
        // Cells 4..8 at order 1 are one contiguous run.
        let cs = CellSet::from_cells(1, vec![4, 5, 6, 7]).unwrap();
        let rs = cs.to_range_set(1);
        assert_eq!(rs.ranges(), &[4..8]);

        // Shifted two orders down, the run scales by 16.
        let rs = cs.to_range_set(3);
        assert_eq!(rs.ranges(), &[64..128]);
    }

    #[test]
    fn test_range_set_coalesces_overlaps() {
        let rs = RangeSet::from_ranges(5, vec![10..20, 15..25, 30..40, 40..50, 5..5]).unwrap();
        assert_eq!(rs.ranges(), &[10..25, 30..50]);
        assert_eq!(rs.covered(), 35);
    }

    #[test]
    fn test_range_union() {
        let a = RangeSet::from_ranges(5, vec![0..10, 20..30]).unwrap();
        let b = RangeSet::from_ranges(5, vec![5..22, 40..50]).unwrap();
        let u = a.union(&b);
        assert_eq!(u.ranges(), &[0..30, 40..50]);
        // Commutative
        assert_eq!(b.union(&a).ranges(), u.ranges());
    }

    #[test]
    fn test_range_intersects() {
        let a = RangeSet::from_ranges(5, vec![0..10, 20..30]).unwrap();
        let b = RangeSet::from_ranges(5, vec![10..20]).unwrap();
        let c = RangeSet::from_ranges(5, vec![25..26]).unwrap();
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
    }

    #[test]
    fn test_full_sky_detection() {
        let all = RangeSet::from_ranges(0, vec![0..12]).unwrap();
        assert!(all.is_full_sky());

        let half = RangeSet::from_ranges(0, vec![0..6]).unwrap();
        assert!(!half.is_full_sky());
        assert!(half.union(&RangeSet::from_ranges(0, vec![6..12]).unwrap()).is_full_sky());
    }

    #[test]
    fn test_ranges_to_cells_roundtrip() {
        let cs = CellSet::from_cells(3, vec![0, 1, 5, 6, 7, 100]).unwrap();
        let back = cs.to_range_set(MAX_ORDER).to_cell_set(3);
        assert_eq!(back, cs);
    }

    #[test]
    fn test_semantic_equality_across_orders() {
        // One cell at order 1 covers the same sky as its 4 children at order 2.
        let parent = Coverage::Cells(CellSet::from_cells(1, vec![9]).unwrap());
        let children = Coverage::Cells(CellSet::from_cells(2, vec![36, 37, 38, 39]).unwrap());
        assert_eq!(parent, children);

        let other = Coverage::Cells(CellSet::from_cells(2, vec![36, 37, 38]).unwrap());
        assert_ne!(parent, other);
    }

    #[test]
    fn test_sky_fraction() {
        let half = Coverage::Ranges(RangeSet::from_ranges(2, vec![0..96]).unwrap());
        assert!((half.sky_fraction() - 0.5).abs() < 1e-12);
        assert!(!half.is_full_sky());

        let full = Coverage::Ranges(RangeSet::from_ranges(2, vec![0..192]).unwrap());
        assert!(full.is_full_sky());
        assert_eq!(full.sky_fraction(), 1.0);
    }

    #[test]
    fn test_contains_point() {
        let p = SphericalPoint::new(83.6, 22.0);
        let idx = healpix::hash(6, &p);
        let cov = Coverage::Cells(CellSet::from_cells(6, vec![idx]).unwrap());
        assert!(cov.contains_point(&p));
        assert!(!cov.contains_point(&SphericalPoint::new(263.6, -22.0)));
    }

    #[test]
    fn test_iter_cells_expands_ranges() {
        let cov = Coverage::Ranges(RangeSet::from_ranges(2, vec![3..6]).unwrap());
        let cells: Vec<u64> = cov.iter_cells().map(|c| c.idx).collect();
        assert_eq!(cells, vec![3, 4, 5]);
        assert!(cov.iter_cells().all(|c| c.order == 2));
    }
}
