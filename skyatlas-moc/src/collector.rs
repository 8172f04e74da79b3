//! Region collector and orchestrator.
//!
//! Walks a user selection once, rasterizes each shape, batches the
//! per-shape coverages and hands them to the merge engine. Per-shape
//! failures (degenerate rings, unsupported frames, empty circles) are
//! recovered locally: the shape is skipped, logged and counted, never
//! fatal. Only the whole-batch condition (nothing valid to build)
//! propagates to the caller.
//!
//! The build is single-threaded and synchronous; it runs on whichever
//! thread invokes it. A progress callback fires at a fixed shape-count
//! cadence, and a caller-owned [`CancelToken`] is polled at the same
//! cadence for cooperative cancellation, returning whatever coverage
//! was accumulated so far.

use crate::config::BuildConfig;
use crate::coverage::Coverage;
use crate::error::{MocError, Result};
use crate::geometry::{Region, Shape};
use crate::merge;
use crate::rasterize::{normalize, rasterize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation handle.
///
/// Cloneable across threads; the orchestrator polls it once per
/// progress interval. There is no preemptive cancellation within a
/// single rasterization or union call.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the build holding this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Progress snapshot passed to the orchestrator's callback.
#[derive(Debug, Clone, Copy)]
pub struct BuildProgress {
    /// Shapes consumed from the selection so far.
    pub shapes_seen: usize,

    /// Per-shape coverages currently waiting in the batch.
    pub batch_len: usize,
}

/// Statistics collected while building a coverage from a selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildStats {
    /// Shapes consumed from the selection.
    pub shapes_seen: usize,

    /// Shapes successfully rasterized.
    pub shapes_rasterized: usize,

    /// Circles skipped for a non-positive radius.
    pub skipped_empty_circles: usize,

    /// Polygons skipped as degenerate.
    pub skipped_degenerate: usize,

    /// Shapes skipped for an unrecognized frame tag.
    pub skipped_unsupported_frame: usize,

    /// Intermediate union flushes performed.
    pub flushes: usize,

    /// Whether the build stopped early on a cancellation request.
    pub cancelled: bool,
}

impl BuildStats {
    /// Total shapes skipped, for the caller-facing summary.
    pub fn shapes_skipped(&self) -> usize {
        self.skipped_empty_circles + self.skipped_degenerate + self.skipped_unsupported_frame
    }
}

/// Result of a selection build: the consolidated coverage plus the
/// skip/flush counters.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub coverage: Coverage,
    pub stats: BuildStats,
}

/// Builds one consolidated coverage from a shape selection.
///
/// Each invocation owns its accumulator and batch exclusively; no
/// global state is touched, so independent invocations over disjoint
/// inputs are safe to run in parallel.
#[derive(Debug, Clone, Default)]
pub struct CoverageBuilder {
    config: BuildConfig,
}

impl CoverageBuilder {
    /// Create a builder with the given configuration.
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build a coverage from a selection, without progress reporting.
    pub fn build(&self, shapes: impl IntoIterator<Item = Shape>) -> Result<BuildOutcome> {
        self.build_with(shapes, |_| {}, &CancelToken::new())
    }

    /// Build a coverage from a selection.
    ///
    /// `on_progress` fires and `cancel` is polled once every
    /// `config.progress_interval` shapes. On cancellation the coverage
    /// accumulated so far is returned with `stats.cancelled` set; if
    /// nothing was accumulated yet the build fails with
    /// [`MocError::NoValidRegions`], as it does for an empty or
    /// all-skipped selection.
    pub fn build_with<I, F>(
        &self,
        shapes: I,
        mut on_progress: F,
        cancel: &CancelToken,
    ) -> Result<BuildOutcome>
    where
        I: IntoIterator<Item = Shape>,
        F: FnMut(&BuildProgress),
    {
        let interval = self.config.progress_interval.max(1);
        let flush_threshold = self.config.flush_threshold.max(2);

        let mut stats = BuildStats::default();
        let mut batch: Vec<Coverage> = Vec::new();

        for shape in shapes {
            stats.shapes_seen += 1;
            self.collect_shape(shape, &mut batch, &mut stats)?;

            if stats.shapes_seen % interval == 0 {
                on_progress(&BuildProgress {
                    shapes_seen: stats.shapes_seen,
                    batch_len: batch.len(),
                });
                if cancel.is_cancelled() {
                    stats.cancelled = true;
                    tracing::debug!(
                        shapes_seen = stats.shapes_seen,
                        "coverage build cancelled"
                    );
                    break;
                }
            }

            if batch.len() >= flush_threshold {
                let merged = merge::union_all(std::mem::take(&mut batch))?;
                batch.push(merged);
                stats.flushes += 1;
            }
        }

        if stats.shapes_skipped() > 0 {
            tracing::debug!(
                skipped = stats.shapes_skipped(),
                degenerate = stats.skipped_degenerate,
                unsupported_frame = stats.skipped_unsupported_frame,
                empty_circles = stats.skipped_empty_circles,
                "skipped shapes during coverage build"
            );
        }

        let coverage = match batch.len() {
            0 => return Err(MocError::NoValidRegions),
            // Single shape: hand its coverage back directly, skipping
            // the needless range-set conversion.
            1 => batch.swap_remove(0),
            _ => merge::union_all(batch)?,
        };

        Ok(BuildOutcome { coverage, stats })
    }

    /// Rasterize one shape into the batch, recovering per-shape errors.
    fn collect_shape(
        &self,
        shape: Shape,
        batch: &mut Vec<Coverage>,
        stats: &mut BuildStats,
    ) -> Result<()> {
        let region = match normalize(shape) {
            Ok(region) => region,
            Err(MocError::UnsupportedFrame(tag)) => {
                stats.skipped_unsupported_frame += 1;
                tracing::debug!(frame = %tag, "skipping shape with unsupported frame");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if let Region::Circle { radius_deg, .. } = &region {
            if *radius_deg <= 0.0 {
                stats.skipped_empty_circles += 1;
                tracing::trace!(radius_deg, "skipping circle with non-positive radius");
                return Ok(());
            }
        }

        match rasterize(&region, &self.config) {
            Ok(coverage) => {
                batch.push(coverage);
                stats.shapes_rasterized += 1;
            }
            Err(MocError::DegeneratePolygon(reason)) => {
                stats.skipped_degenerate += 1;
                tracing::debug!(reason = %reason, "skipping degenerate polygon");
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}
