//! Region rasterization.
//!
//! Converts one normalized [`Region`] into a [`Coverage`] at an
//! automatically selected order:
//!
//! - Circles delegate to the cap query at the resolution picked from
//!   the cap diameter, with inclusive semantics (a cell touching the cap
//!   is covered) so coverage never under-reports.
//! - Polygons first resolve their winding direction from the signed turn
//!   at the lowest vertex of the ring, so the enclosed side rather than
//!   the exterior is rasterized, then delegate to the general polygon
//!   query at an order clamped to a minimum usable resolution.
//!
//! STC shape descriptors are normalized into regions here; an
//! unrecognized frame tag fails with
//! [`MocError::UnsupportedFrame`] and is skipped by the orchestrator.

use crate::config::BuildConfig;
use crate::coverage::Coverage;
use crate::error::{MocError, Result};
use crate::geometry::{ReferenceFrame, Region, Shape, SphericalPoint, StcGeometry, StcShape};
use crate::healpix::{self, MAX_ORDER};
use crate::resolution::select_order;

/// Turn angles closer than this to 0 or pi are treated as colinear.
const COLINEAR_EPS_RAD: f64 = 1e-9;

/// Consecutive vertices closer than this are treated as duplicates.
const DUPLICATE_EPS_DEG: f64 = 1e-9;

/// Ring traversal direction as authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    CounterClockwise,
    Clockwise,
}

/// Normalize a caller-supplied shape descriptor into a region.
///
/// Circles and polygons pass through; STC shapes have their frame tag
/// parsed against the accepted set.
pub fn normalize(shape: Shape) -> Result<Region> {
    match shape {
        Shape::Circle { center, radius_deg } => Ok(Region::Circle { center, radius_deg }),
        Shape::Polygon { frame, vertices } => Ok(Region::Polygon { frame, vertices }),
        Shape::Stc(StcShape { frame, geometry }) => {
            let frame = ReferenceFrame::parse(&frame)?;
            Ok(match geometry {
                StcGeometry::Circle { center, radius_deg } => {
                    Region::Circle { center, radius_deg }
                }
                StcGeometry::Polygon { vertices } => Region::Polygon { frame, vertices },
            })
        }
    }
}

/// Rasterize a region into a coverage at an automatically chosen order.
pub fn rasterize(region: &Region, config: &BuildConfig) -> Result<Coverage> {
    match region {
        Region::Circle { center, radius_deg } => rasterize_circle(center, *radius_deg, config),
        Region::Polygon { vertices, .. } => rasterize_polygon(vertices, config),
    }
}

fn rasterize_circle(
    center: &SphericalPoint,
    radius_deg: f64,
    config: &BuildConfig,
) -> Result<Coverage> {
    let order = select_order(2.0 * radius_deg, config);
    let cells = healpix::circle_coverage(order, center, radius_deg.to_radians(), true)?;
    Ok(Coverage::Cells(cells))
}

fn rasterize_polygon(vertices: &[SphericalPoint], config: &BuildConfig) -> Result<Coverage> {
    let ring = distinct_ring(vertices)?;
    let winding = winding(&ring)?;

    let order = select_order(ring_extent_deg(&ring), config)
        .clamp(config.min_polygon_order.min(MAX_ORDER), MAX_ORDER);

    let mut path: Vec<(f64, f64)> = ring.iter().map(|v| (v.lon_deg, v.lat_deg)).collect();
    if winding == Winding::Clockwise {
        path.reverse();
    }

    let cells = healpix::polygon_coverage(order, &path)?;
    let coverage = Coverage::Cells(cells);
    if coverage.sky_fraction() > 0.5 {
        // A polygon covering most of the sphere usually means the ring
        // was authored with inverted winding. Kept as computed; callers
        // can sanity-check via sky_fraction().
        tracing::warn!(
            sky_fraction = coverage.sky_fraction(),
            vertices = ring.len(),
            "polygon coverage exceeds half the sky"
        );
    }
    Ok(coverage)
}

/// Drop the closing duplicate and consecutive duplicate vertices,
/// keeping the authored order. Fails when fewer than 3 distinct
/// vertices remain.
fn distinct_ring(vertices: &[SphericalPoint]) -> Result<Vec<SphericalPoint>> {
    let mut ring: Vec<SphericalPoint> = Vec::with_capacity(vertices.len());
    for &v in vertices {
        if ring.last().map_or(true, |last| !same_point(last, &v)) {
            ring.push(v);
        }
    }
    if ring.len() > 1 && same_point(&ring[0], ring.last().unwrap_or(&ring[0])) {
        ring.pop();
    }
    if ring.len() < 3 {
        return Err(MocError::DegeneratePolygon(format!(
            "{} distinct vertices, need at least 3",
            ring.len()
        )));
    }
    Ok(ring)
}

fn same_point(a: &SphericalPoint, b: &SphericalPoint) -> bool {
    delta_lon_deg(a.lon_deg, b.lon_deg).abs() < DUPLICATE_EPS_DEG
        && (a.lat_deg - b.lat_deg).abs() < DUPLICATE_EPS_DEG
}

/// Signed longitude difference wrapped into `(-180, 180]`.
fn delta_lon_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Determine the winding direction of a distinct vertex ring.
///
/// The ring's lowest vertex (minimum latitude) lies on the hull, so the
/// signed turn there between the incoming and outgoing edges gives the
/// global traversal direction: a positive `atan2` turn means the ring is
/// wound counter-clockwise as authored. A turn of about 0 or pi means
/// the corner is colinear or a spike and the ring cannot be resolved.
pub(crate) fn winding(ring: &[SphericalPoint]) -> Result<Winding> {
    debug_assert!(ring.len() >= 3);
    let lowest = ring
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.lat_deg.total_cmp(&b.lat_deg))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let n = ring.len();
    let prev = &ring[(lowest + n - 1) % n];
    let v = &ring[lowest];
    let next = &ring[(lowest + 1) % n];

    // Edge vectors at the lowest vertex in the local (lon, lat) plane.
    let d_in = (delta_lon_deg(v.lon_deg, prev.lon_deg), v.lat_deg - prev.lat_deg);
    let d_out = (delta_lon_deg(next.lon_deg, v.lon_deg), next.lat_deg - v.lat_deg);

    let cross = d_in.0 * d_out.1 - d_in.1 * d_out.0;
    let dot = d_in.0 * d_out.0 + d_in.1 * d_out.1;
    let turn = cross.atan2(dot);

    if turn.abs() < COLINEAR_EPS_RAD || (std::f64::consts::PI - turn.abs()) < COLINEAR_EPS_RAD {
        return Err(MocError::DegeneratePolygon(
            "colinear edges at the extremal vertex".into(),
        ));
    }
    if turn > 0.0 {
        Ok(Winding::CounterClockwise)
    } else {
        Ok(Winding::Clockwise)
    }
}

/// Angular extent of the ring: the maximum separation between
/// consecutive vertices, including the closing pair.
fn ring_extent_deg(ring: &[SphericalPoint]) -> f64 {
    let mut max = 0.0_f64;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        max = max.max(ring[i].separation_deg(&ring[j]));
    }
    max
}
