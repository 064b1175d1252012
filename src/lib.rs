//! Histogram filter localization for robots on toroidal grid worlds.
//!
//! The robot carries a belief grid over every cell of a colored world.
//! [`perception::sense`] folds a color observation into the belief,
//! [`perception::move_beliefs`] shifts and blurs it after a move, and
//! [`simulation::Simulation`] drives both against a noisy simulated sensor.
//!
//! ```rust
//! use grid_localization_core::{ColorGrid, Simulation};
//!
//! # fn main() -> grid_localization_core::Result<()> {
//! let world = ColorGrid::from_labels(&[vec!["r", "g", "g"], vec!["g", "g", "r"]])?;
//! let mut sim = Simulation::new(world, 0.05, 200.0, None, 7)?;
//! sim.run(10)?;
//! println!("{:?}", sim.localization());
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod config;
pub mod error;
pub mod grid;
pub mod perception;
pub mod simulation;

pub use crate::common::types::{GridShape, Pose, ScatterPoint};
pub use crate::config::{ConfigError, SimulationConfig};
pub use crate::error::{LocalizationError, Result};
pub use crate::grid::{BeliefGrid, ColorGrid, Grid};
pub use crate::perception::Localization;
pub use crate::simulation::{BeliefFrame, Simulation};
