//! Sky geometry primitives.
//!
//! This module provides:
//! - [`SphericalPoint`]: a (longitude, latitude) pair in degrees with a
//!   unit-vector form for geometric predicates
//! - [`ReferenceFrame`]: the closed set of accepted celestial frames
//! - [`Shape`] / [`Region`]: caller-facing shape descriptors and their
//!   normalized form consumed by the rasterizer
//!
//! Regions are constructed transiently from a user selection and consumed
//! once; they are not persisted. All accepted frames are equatorial and
//! treated as equivalent, so no coordinate transformation happens here.

use crate::error::{MocError, Result};
use serde::{Deserialize, Serialize};

/// A point on the celestial sphere.
///
/// Longitude is right ascension in `[0, 360)` degrees, latitude is
/// declination in `[-90, 90]` degrees. Both are normalized on
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalPoint {
    /// Longitude (right ascension) in degrees, `[0, 360)`.
    pub lon_deg: f64,

    /// Latitude (declination) in degrees, `[-90, 90]`.
    pub lat_deg: f64,
}

impl SphericalPoint {
    /// Create a point, normalizing longitude into `[0, 360)` and
    /// clamping latitude into `[-90, 90]`.
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon_deg: lon_deg.rem_euclid(360.0),
            lat_deg: lat_deg.clamp(-90.0, 90.0),
        }
    }

    /// Unit vector on the sphere: x toward (0, 0), z toward the north pole.
    pub fn unit_vector(&self) -> [f64; 3] {
        let lon = self.lon_deg.to_radians();
        let lat = self.lat_deg.to_radians();
        let (sin_lon, cos_lon) = lon.sin_cos();
        let (sin_lat, cos_lat) = lat.sin_cos();
        [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat]
    }

    /// Angular separation from another point, in radians.
    ///
    /// Uses `atan2(|a x b|, a . b)`, which stays accurate for both very
    /// small and near-antipodal separations.
    pub fn separation_rad(&self, other: &SphericalPoint) -> f64 {
        let a = self.unit_vector();
        let b = other.unit_vector();
        let cross = [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ];
        let cross_norm = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
        let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
        cross_norm.atan2(dot)
    }

    /// Angular separation from another point, in degrees.
    pub fn separation_deg(&self, other: &SphericalPoint) -> f64 {
        self.separation_rad(other).to_degrees()
    }

    /// (lon, lat) in radians, longitude in `[0, 2pi)`, latitude clamped
    /// to the open polar range expected by the cell indexer.
    pub(crate) fn to_radians(&self) -> (f64, f64) {
        (
            self.lon_deg.to_radians().rem_euclid(std::f64::consts::TAU),
            self.lat_deg
                .to_radians()
                .clamp(-std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2),
        )
    }
}

/// Celestial reference frame of a region.
///
/// The accepted set is closed: FK5, ICRS and J2000 are treated as
/// equivalent; an unspecified frame is accepted as-is. Any other tag is
/// rejected during normalization with
/// [`MocError::UnsupportedFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceFrame {
    Fk5,
    Icrs,
    J2000,
    /// No frame tag supplied; coordinates are taken as-is.
    Unspecified,
}

impl ReferenceFrame {
    /// Parse a frame tag. Empty or whitespace-only tags map to
    /// [`ReferenceFrame::Unspecified`].
    pub fn parse(tag: &str) -> Result<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(ReferenceFrame::Unspecified);
        }
        if tag.eq_ignore_ascii_case("fk5") {
            Ok(ReferenceFrame::Fk5)
        } else if tag.eq_ignore_ascii_case("icrs") {
            Ok(ReferenceFrame::Icrs)
        } else if tag.eq_ignore_ascii_case("j2000") {
            Ok(ReferenceFrame::J2000)
        } else {
            Err(MocError::UnsupportedFrame(tag.to_string()))
        }
    }
}

/// A normalized region, ready for rasterization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Region {
    /// Spherical cap.
    Circle {
        center: SphericalPoint,
        radius_deg: f64,
    },

    /// Ordered vertex ring. Winding direction is inferred by the
    /// rasterizer so the enclosed side is always the one covered.
    Polygon {
        frame: ReferenceFrame,
        vertices: Vec<SphericalPoint>,
    },
}

/// Geometry carried by an externally parsed STC shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StcGeometry {
    Circle {
        center: SphericalPoint,
        radius_deg: f64,
    },
    Polygon {
        vertices: Vec<SphericalPoint>,
    },
}

/// An externally parsed STC shape carrying its own raw frame tag.
///
/// The tag is validated during normalization; shapes with an
/// unrecognized tag are skipped by the orchestrator rather than failing
/// the whole selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StcShape {
    /// Raw frame tag as supplied (e.g. "ICRS", "FK5", "").
    pub frame: String,

    /// Shape geometry.
    pub geometry: StcGeometry,
}

/// A caller-supplied shape descriptor from the selection layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Circle: center plus radius in degrees. A radius <= 0 contributes
    /// nothing and is skipped.
    Circle {
        center: SphericalPoint,
        radius_deg: f64,
    },

    /// Polygon from freehand drawing, in an already-validated frame.
    Polygon {
        frame: ReferenceFrame,
        vertices: Vec<SphericalPoint>,
    },

    /// Externally supplied STC shape with its own frame tag.
    Stc(StcShape),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_normalization() {
        let p = SphericalPoint::new(-10.0, 95.0);
        assert_eq!(p.lon_deg, 350.0);
        assert_eq!(p.lat_deg, 90.0);

        let q = SphericalPoint::new(370.0, -100.0);
        assert!((q.lon_deg - 10.0).abs() < 1e-12);
        assert_eq!(q.lat_deg, -90.0);
    }

    #[test]
    fn test_separation() {
        let a = SphericalPoint::new(0.0, 0.0);
        let b = SphericalPoint::new(90.0, 0.0);
        assert!((a.separation_deg(&b) - 90.0).abs() < 1e-9);

        let pole = SphericalPoint::new(123.0, 90.0);
        let equator = SphericalPoint::new(45.0, 0.0);
        assert!((pole.separation_deg(&equator) - 90.0).abs() < 1e-9);

        // Antipodal
        let c = SphericalPoint::new(180.0, 0.0);
        assert!((a.separation_deg(&c) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_separation_small_angle() {
        let a = SphericalPoint::new(10.0, 20.0);
        let b = SphericalPoint::new(10.0, 20.0 + 1e-7);
        let sep = a.separation_deg(&b);
        assert!((sep - 1e-7).abs() < 1e-12);
    }

    #[test]
    fn test_frame_parse_accepted() {
        assert_eq!(ReferenceFrame::parse("FK5").unwrap(), ReferenceFrame::Fk5);
        assert_eq!(ReferenceFrame::parse("icrs").unwrap(), ReferenceFrame::Icrs);
        assert_eq!(
            ReferenceFrame::parse("J2000").unwrap(),
            ReferenceFrame::J2000
        );
        assert_eq!(
            ReferenceFrame::parse("  ").unwrap(),
            ReferenceFrame::Unspecified
        );
    }

    #[test]
    fn test_frame_parse_rejected() {
        let err = ReferenceFrame::parse("GALACTIC").unwrap_err();
        assert!(matches!(err, MocError::UnsupportedFrame(tag) if tag == "GALACTIC"));
    }
}
