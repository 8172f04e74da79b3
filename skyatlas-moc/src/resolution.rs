//! Resolution selection.
//!
//! Picks the coarsest HEALPix order whose cell size resolves a region
//! into roughly `target_cells_across` cells across its diameter. This is
//! a precision/cost tradeoff, not a hard requirement: finer orders give
//! tighter coverages at a higher cell count.

use crate::config::BuildConfig;
use crate::healpix::MAX_ORDER;
use std::f64::consts::PI;

/// Select an order for a region of the given angular extent in degrees.
///
/// A zero (or negative) size is treated as an infinitely small region
/// and returns [`MAX_ORDER`]. Otherwise the cell edge starts from the
/// whole-sky baseline at `config.base_order` and halves per order step
/// until it is at most `size / target_cells_across`, or the maximum
/// order is reached. The result always lies in
/// `[config.base_order, MAX_ORDER]`.
pub fn select_order(angular_size_deg: f64, config: &BuildConfig) -> u8 {
    if angular_size_deg <= 0.0 {
        return MAX_ORDER;
    }
    let mut order = config.base_order.min(MAX_ORDER);
    // Cell edge approximated from equal-area cells: sqrt(4*pi / n_cells).
    let n = 12.0 * 4.0_f64.powi(i32::from(order));
    let mut edge_deg = (4.0 * PI / n).sqrt().to_degrees();
    let target_deg = angular_size_deg / f64::from(config.target_cells_across.max(1));
    while edge_deg > target_deg && order < MAX_ORDER {
        order += 1;
        edge_deg /= 2.0;
    }
    order
}
