//! Localization module
//!
//! Discrete Bayes filter over a toroidal color world. `sense` is the
//! measurement update, `move_beliefs` the prediction step.

use log::trace;

use super::filters::{blur, normalize};
use crate::common::types::Pose;
use crate::error::{LocalizationError, Result};
use crate::grid::{BeliefGrid, ColorGrid, Grid};

/// Second-best belief at or below this counts as no competition
const SECOND_BEST_FLOOR: f64 = 1e-5;

/// Best belief must exceed the runner-up by this factor to be trusted
const STRONG_OPINION_RATIO: f64 = 2.0;

/// Uniform prior with the same shape as `grid`
pub fn initialize_beliefs<T: nalgebra::Scalar>(grid: &Grid<T>) -> BeliefGrid {
    let shape = grid.shape();
    let belief_per_cell = 1.0 / shape.area() as f64;
    BeliefGrid::from_fn(shape, |_| belief_per_cell)
}

/// Measurement update for an observed color
///
/// Every cell is weighted by `p_hit` when its color matches the observation
/// and by `p_miss` otherwise, then the result is normalized.
pub fn sense(
    color: &str,
    world: &ColorGrid,
    beliefs: &BeliefGrid,
    p_hit: f64,
    p_miss: f64,
) -> Result<BeliefGrid> {
    world.ensure_same_shape(beliefs)?;

    let posterior = BeliefGrid::from_fn(world.shape(), |pose| {
        let likelihood = if world[pose] == color { p_hit } else { p_miss };
        beliefs[pose] * likelihood
    });
    normalize(&posterior)
}

/// Prediction step: shift every cell by `(dy, dx)` with wraparound, then blur
pub fn move_beliefs(
    dy: isize,
    dx: isize,
    beliefs: &BeliefGrid,
    blurring: f64,
) -> Result<BeliefGrid> {
    let shape = beliefs.shape();
    // reduced first so the subtraction below cannot overflow
    let dy = dy.rem_euclid(shape.height as isize);
    let dx = dx.rem_euclid(shape.width as isize);
    let shifted = BeliefGrid::from_fn(shape, |pose| {
        *beliefs.wrapped(pose.row as isize - dy, pose.col as isize - dx)
    });
    blur(&shifted, blurring)
}

/// Outcome of checking whether the belief has settled on a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Localization {
    /// Strong opinion at the true position
    Correct(Pose),
    /// Strong opinion somewhere else
    Incorrect(Pose),
    /// No single cell stands out; carries the first best cell
    Indeterminate(Pose),
    /// No cell holds any positive belief
    NoEstimate,
}

impl Localization {
    /// `Some(true)` / `Some(false)` with a strong opinion, `None` otherwise
    pub fn is_localized(&self) -> Option<bool> {
        match self {
            Localization::Correct(_) => Some(true),
            Localization::Incorrect(_) => Some(false),
            Localization::Indeterminate(_) => None,
            // nothing to be right about
            Localization::NoEstimate => Some(false),
        }
    }

    pub fn best_position(&self) -> Option<Pose> {
        match *self {
            Localization::Correct(pose)
            | Localization::Incorrect(pose)
            | Localization::Indeterminate(pose) => Some(pose),
            Localization::NoEstimate => None,
        }
    }
}

/// Decide whether the beliefs single out `true_pos`
///
/// The best cell is trusted when the runner-up is negligible or the best is
/// more than twice the runner-up. On ties the first cell in row-major order
/// wins.
pub fn is_robot_localized(beliefs: &BeliefGrid, true_pos: Pose) -> Localization {
    let mut best_belief = 0.0;
    let mut second_best = 0.0;
    let mut best_pos: Option<Pose> = None;

    for (pose, &belief) in beliefs.iter_cells() {
        if belief > best_belief {
            second_best = best_belief;
            best_belief = belief;
            best_pos = Some(pose);
        } else if belief > second_best {
            second_best = belief;
        }
    }

    let Some(best_pos) = best_pos else {
        return Localization::NoEstimate;
    };

    trace!(
        "best belief {} at {}, second best {}",
        best_belief,
        best_pos,
        second_best
    );

    if second_best <= SECOND_BEST_FLOOR || best_belief / second_best > STRONG_OPINION_RATIO {
        if best_pos == true_pos {
            Localization::Correct(best_pos)
        } else {
            Localization::Incorrect(best_pos)
        }
    } else {
        Localization::Indeterminate(best_pos)
    }
}

/// A Bayes filter configured with a sensor model and motion blur
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Localizer {
    p_hit: f64,
    p_miss: f64,
    blurring: f64,
}

impl Localizer {
    /// Create a new localizer
    pub fn new(p_hit: f64, p_miss: f64, blurring: f64) -> Result<Self> {
        for (name, value) in [("p_hit", p_hit), ("p_miss", p_miss)] {
            if !value.is_finite() || value < 0.0 {
                return Err(LocalizationError::invalid_parameter(
                    name,
                    format!("must be finite and non-negative, got {}", value),
                ));
            }
        }
        if p_hit + p_miss == 0.0 {
            return Err(LocalizationError::invalid_parameter(
                "p_hit",
                "p_hit and p_miss cannot both be zero",
            ));
        }
        if !blurring.is_finite() {
            return Err(LocalizationError::invalid_parameter(
                "blur",
                format!("must be finite, got {}", blurring),
            ));
        }

        Ok(Localizer {
            p_hit,
            p_miss,
            blurring,
        })
    }

    pub fn p_hit(&self) -> f64 {
        self.p_hit
    }

    pub fn p_miss(&self) -> f64 {
        self.p_miss
    }

    pub fn blurring(&self) -> f64 {
        self.blurring
    }

    /// Measurement update with this localizer's sensor model
    pub fn sense(
        &self,
        color: &str,
        world: &ColorGrid,
        beliefs: &BeliefGrid,
    ) -> Result<BeliefGrid> {
        sense(color, world, beliefs, self.p_hit, self.p_miss)
    }

    /// Prediction step with this localizer's blur
    pub fn predict(&self, dy: isize, dx: isize, beliefs: &BeliefGrid) -> Result<BeliefGrid> {
        move_beliefs(dy, dx, beliefs, self.blurring)
    }
}
