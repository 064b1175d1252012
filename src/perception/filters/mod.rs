//! Filtering algorithms for belief grids

use log::trace;
use nalgebra::Matrix3;

use crate::error::{LocalizationError, Result};
use crate::grid::BeliefGrid;

/// Per-cell tolerance used by [`close_enough`]
pub const CLOSE_ENOUGH_TOLERANCE: f64 = 0.001;

/// A generic filter interface
pub trait Filter<T> {
    /// Filter the input data, producing a new value
    fn filter(&self, input: &T) -> Result<T>;
}

/// Scale a grid so its cells sum to one
///
/// Fails with [`LocalizationError::DegenerateDistribution`] when the total
/// is zero or not finite.
pub fn normalize(grid: &BeliefGrid) -> Result<BeliefGrid> {
    let total = grid.total();
    if total == 0.0 || !total.is_finite() {
        return Err(LocalizationError::DegenerateDistribution);
    }
    BeliefGrid::from_matrix(grid.as_matrix() / total)
}

/// 3x3 smoothing window spreading belief into neighbouring cells
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurKernel {
    window: Matrix3<f64>,
}

impl BlurKernel {
    /// Create a new blur kernel
    ///
    /// `blurring` is expected in `[0, 1]`. Other values are accepted but
    /// produce negative weights.
    pub fn new(blurring: f64) -> Self {
        let center = 1.0 - blurring;
        let adjacent = blurring / 6.0;
        let corner = blurring / 12.0;

        #[rustfmt::skip]
        let window = Matrix3::new(
            corner,   adjacent, corner,
            adjacent, center,   adjacent,
            corner,   adjacent, corner,
        );
        BlurKernel { window }
    }

    /// Weight for a neighbour at offset `(dy, dx)`, both in `-1..=1`
    pub fn weight(&self, dy: isize, dx: isize) -> f64 {
        self.window[((dy + 1) as usize, (dx + 1) as usize)]
    }
}

impl Filter<BeliefGrid> for BlurKernel {
    fn filter(&self, input: &BeliefGrid) -> Result<BeliefGrid> {
        let shape = input.shape();
        let mut spread = vec![0.0; shape.area()];

        for (pose, &value) in input.iter_cells() {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let target = shape.wrap(pose.row as isize + dy, pose.col as isize + dx);
                    spread[target.row * shape.width + target.col] += self.weight(dy, dx) * value;
                }
            }
        }

        let blurred = BeliefGrid::from_fn(shape, |pose| spread[pose.row * shape.width + pose.col]);
        normalize(&blurred)
    }
}

/// Spread belief into neighbouring cells, then normalize
pub fn blur(grid: &BeliefGrid, blurring: f64) -> Result<BeliefGrid> {
    BlurKernel::new(blurring).filter(grid)
}

/// Check that two grids share a shape and agree cell-by-cell within tolerance
pub fn close_enough(g1: &BeliefGrid, g2: &BeliefGrid) -> bool {
    if g1.shape() != g2.shape() {
        trace!("shape differs: {} vs {}", g1.shape(), g2.shape());
        return false;
    }

    for ((pose, a), (_, b)) in g1.iter_cells().zip(g2.iter_cells()) {
        if (a - b).abs() > CLOSE_ENOUGH_TOLERANCE {
            trace!("cell {} differs: {} vs {}", pose, a, b);
            return false;
        }
    }
    true
}
