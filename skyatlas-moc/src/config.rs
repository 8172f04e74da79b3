//! Coverage build configuration.
//!
//! Controls resolution selection, polygon order clamping, and the
//! batching cadence of the orchestrator.

use serde::{Deserialize, Serialize};

/// Configuration for building a coverage from a region selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Baseline HEALPix order the resolution selector starts from.
    /// Default: 4 (cell edge ~3.7 degrees).
    pub base_order: u8,

    /// Minimum order used for polygon rasterization. Coarser selections
    /// are clamped up to this value so thin rings still resolve.
    /// Default: 10.
    pub min_polygon_order: u8,

    /// Target number of cells across a region's diameter. Higher values
    /// give a tighter fit at a higher cell count. Default: 200.
    pub target_cells_across: u32,

    /// Number of shapes between progress callbacks and cancellation
    /// polls. Default: 1000.
    pub progress_interval: usize,

    /// Number of accumulated per-shape coverages that triggers an
    /// intermediate union flush, bounding peak memory for very large
    /// selections. Default: 10000.
    pub flush_threshold: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            base_order: 4,
            min_polygon_order: 10,
            target_cells_across: 200,
            progress_interval: 1000,
            flush_threshold: 10_000,
        }
    }
}

impl BuildConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target number of cells across a region's diameter.
    pub fn with_target_cells_across(mut self, target: u32) -> Self {
        self.target_cells_across = target;
        self
    }

    /// Set the minimum polygon rasterization order.
    pub fn with_min_polygon_order(mut self, order: u8) -> Self {
        self.min_polygon_order = order;
        self
    }

    /// Set the progress callback / cancellation poll interval.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Set the intermediate union flush threshold.
    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold;
        self
    }
}
