//! Error types for MOC construction.

use thiserror::Error;

/// Errors raised while building multi-order coverage maps.
#[derive(Error, Debug)]
pub enum MocError {
    /// HEALPix order outside the supported range. Always a programming
    /// error in the caller, never a user-facing condition.
    #[error("invalid HEALPix order: {order} (supported range is 0..={max})")]
    InvalidOrder { order: u8, max: u8 },

    /// A polygon whose vertices cannot form a rasterizable ring
    /// (fewer than 3 distinct vertices, colinear corner, spike).
    #[error("degenerate polygon: {0}")]
    DegeneratePolygon(String),

    /// A shape's reference frame is outside the accepted set.
    #[error("unsupported reference frame: {0:?}")]
    UnsupportedFrame(String),

    /// Every input shape was skipped, or the selection was empty.
    #[error("no valid regions in selection")]
    NoValidRegions,

    /// The merge engine was handed an empty batch. The orchestrator
    /// guarantees this never happens; treat as an invariant violation.
    #[error("empty coverage batch handed to the merge engine")]
    EmptyInput,
}

/// Result type for MOC operations.
pub type Result<T> = std::result::Result<T, MocError>;
