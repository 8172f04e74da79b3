//! HEALPix cell indexing.
//!
//! Thin wrapper over the `cdshealpix` nested scheme: the sole primitive
//! every other component depends on. Maps points and shapes on the
//! celestial sphere to hierarchical cell identifiers at a given order.
//!
//! All queries are exact at the chosen order in the conservative
//! direction: a coverage may include a boundary cell whose overlap is
//! marginal, but never misses a cell the shape touches.

use crate::coverage::{Cell, CellSet};
use crate::error::{MocError, Result};
use crate::geometry::SphericalPoint;
use cdshealpix::{n_hash, nested, DEPTH_MAX};
use std::f64::consts::PI;

/// Maximum supported HEALPix order.
pub const MAX_ORDER: u8 = DEPTH_MAX;

/// Extra subdivision depth used to tighten approximate cone coverages.
const CONE_DELTA_DEPTH: u8 = 2;

/// Number of cells at the given order: `12 * 4^order`.
pub fn n_cells(order: u8) -> u64 {
    n_hash(order)
}

/// Validate an order argument.
pub(crate) fn check_order(order: u8) -> Result<()> {
    if order > MAX_ORDER {
        Err(MocError::InvalidOrder {
            order,
            max: MAX_ORDER,
        })
    } else {
        Ok(())
    }
}

/// Nested cell index of a point at an order already known to be valid.
pub(crate) fn hash(order: u8, point: &SphericalPoint) -> u64 {
    let (lon, lat) = point.to_radians();
    nested::hash(order, lon, lat)
}

/// The cell containing a point at the given order.
pub fn point_to_cell(order: u8, point: &SphericalPoint) -> Result<Cell> {
    check_order(order)?;
    Ok(Cell {
        order,
        idx: hash(order, point),
    })
}

/// Sky position of a cell's center.
pub fn cell_center(cell: &Cell) -> SphericalPoint {
    let (lon, lat) = nested::center(cell.order, cell.idx);
    SphericalPoint::new(lon.to_degrees(), lat.to_degrees())
}

/// Cells at `order` intersecting (`inclusive`) or fully contained by
/// (`!inclusive`) the spherical cap of `radius_rad` around `center`.
pub fn circle_coverage(
    order: u8,
    center: &SphericalPoint,
    radius_rad: f64,
    inclusive: bool,
) -> Result<CellSet> {
    check_order(order)?;
    if radius_rad <= 0.0 {
        // A zero-radius cap is the center point itself.
        return CellSet::from_cells(order, vec![hash(order, center)]);
    }
    if radius_rad >= PI {
        return CellSet::from_cells(order, (0..n_cells(order)).collect());
    }
    let (lon, lat) = center.to_radians();
    let delta = CONE_DELTA_DEPTH.min(MAX_ORDER - order);
    let bmoc = nested::cone_coverage_approx_custom(order, delta, lon, lat, radius_rad);
    let cells = if inclusive {
        bmoc.flat_iter().collect()
    } else {
        // Keep only cells fully inside the cap, expanded to the target order.
        let mut cells = Vec::new();
        for c in &bmoc {
            if c.is_full {
                let shift = 2 * u32::from(order - c.depth);
                cells.extend((c.hash << shift)..((c.hash + 1) << shift));
            }
        }
        cells
    };
    CellSet::from_cells(order, cells)
}

/// Cells at `order` overlapping the interior of the polygon defined by
/// the ordered vertex ring.
///
/// The caller must already have resolved winding so the enclosed side,
/// not the exterior, is the interior.
pub fn polygon_coverage(order: u8, vertices_deg: &[(f64, f64)]) -> Result<CellSet> {
    check_order(order)?;
    if vertices_deg.is_empty() {
        return Err(MocError::DegeneratePolygon("empty vertex list".into()));
    }
    let vertices_rad: Vec<(f64, f64)> = vertices_deg
        .iter()
        .map(|&(lon, lat)| SphericalPoint::new(lon, lat).to_radians())
        .collect();
    let bmoc = nested::polygon_coverage(order, &vertices_rad, true);
    CellSet::from_cells(order, bmoc.flat_iter().collect())
}
