//! HEALPix coverage construction for sky-atlas region selections.
//!
//! This crate turns a user selection of sky regions (circles, polygons,
//! STC shape descriptors) into one consolidated multi-order coverage map
//! over the HEALPix nested tessellation. It supports:
//!
//! - **Automatic resolution selection** scaled to each region's angular size
//! - **Winding-aware polygon rasterization** so the enclosed side, not the
//!   exterior, is covered regardless of how the ring was authored
//! - **Range-based unions** with a full-sky short circuit for very large
//!   selections
//! - **Skip-and-count recovery**: a malformed shape never fails the batch
//!
//! # Architecture
//!
//! Shapes flow through a single pipeline: normalize, pick an order,
//! rasterize to cells, batch, union. The result is a [`Coverage`] that
//! can answer point and overlap queries or be iterated as cells.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     CoverageBuilder                      │
//! ├──────────────────────────────────────────────────────────┤
//! │   shapes ──► normalize (frame tags, STC descriptors)     │
//! │                │                                         │
//! │                ▼                                         │
//! │   select_order (angular size ──► HEALPix order)          │
//! │                │                                         │
//! │                ▼                                         │
//! │   rasterize (cone / winding-corrected polygon query)     │
//! │                │          skips degenerate shapes        │
//! │                ▼                                         │
//! │   batch of CellSets ──► union_all (ranges at max order)  │
//! │                │          full-sky short circuit         │
//! │                ▼                                         │
//! │   Coverage (cell set, or range set when too large)       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`]: Build configuration (resolution targets, batching cadence)
//! - [`geometry`]: Spherical points, reference frames, shape descriptors
//! - [`healpix`]: Cell indexing primitives over the nested scheme
//! - [`resolution`]: Angular size to order selection
//! - [`rasterize`]: Shape normalization and per-region rasterization
//! - [`coverage`]: Cell-set and range-set coverage representations
//! - [`merge`]: Union of many coverages into one
//! - [`error`]: Error types

pub mod config;
pub mod error;

mod collector;
pub mod coverage;
pub mod geometry;
pub mod healpix;
pub mod merge;
pub mod rasterize;
pub mod resolution;

// Re-export key types
pub use collector::{
    BuildOutcome, BuildProgress, BuildStats, CancelToken, CoverageBuilder,
};
pub use config::BuildConfig;
pub use coverage::{Cell, CellSet, Coverage, RangeSet};
pub use error::{MocError, Result};
pub use geometry::{
    ReferenceFrame, Region, Shape, SphericalPoint, StcGeometry, StcShape,
};
pub use healpix::{n_cells, MAX_ORDER};
pub use merge::{union_all, union_all_with_stats, MergeStats};
pub use rasterize::{normalize, rasterize};
pub use resolution::select_order;
