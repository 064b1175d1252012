//! Grid-world localization simulation
//!
//! A [`Simulation`] owns the world map, the robot's true pose and its belief
//! grid. Each step senses (information gain) and then moves (information
//! loss). The true pose moves by the exact offset while the belief is blurred.

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::types::{Pose, ScatterPoint};
use crate::error::{LocalizationError, Result};
use crate::grid::{BeliefGrid, ColorGrid};
use crate::perception::localization::{
    initialize_beliefs, is_robot_localized, Localization, Localizer,
};
use crate::perception::sensors::{ColorSensor, Sensor};

/// Miss weight of the simulated sensor model
pub const P_MISS: f64 = 1.0;

/// Scatter weight given to a belief of 1.0
pub const SCATTER_SCALE: f64 = 5000.0;

/// Visualization data for one look at the beliefs
#[derive(Debug, Clone, PartialEq)]
pub struct BeliefFrame {
    /// One point per cell, `x = col`, `y` flipped so row 0 is on top
    pub beliefs: Vec<ScatterPoint>,
    pub true_pose: ScatterPoint,
    /// Points from the previous frame, when requested
    pub previous_beliefs: Option<Vec<ScatterPoint>>,
    pub previous_pose: Option<ScatterPoint>,
}

/// Localization simulation on a toroidal color world
#[derive(Debug)]
pub struct Simulation<R: Rng = StdRng> {
    world: ColorGrid,
    beliefs: BeliefGrid,
    localizer: Localizer,
    sensor: ColorSensor,
    true_pose: Pose,
    prev_pose: Pose,
    last_frame: Vec<ScatterPoint>,
    rng: R,
}

impl Simulation<StdRng> {
    /// Create a new simulation with a seeded random source
    pub fn new(
        world: ColorGrid,
        blur: f64,
        p_hit: f64,
        start_pos: Option<Pose>,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(world, blur, p_hit, start_pos, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulation<R> {
    /// Create a new simulation drawing randomness from `rng`
    pub fn with_rng(
        world: ColorGrid,
        blur: f64,
        p_hit: f64,
        start_pos: Option<Pose>,
        rng: R,
    ) -> Result<Self> {
        let localizer = Localizer::new(p_hit, P_MISS, blur)?;
        if !(0.0..=1.0).contains(&blur) {
            warn!("blur {} is outside [0, 1]; kernel weights will not form a distribution", blur);
        }

        let shape = world.shape();
        let true_pose = start_pos.unwrap_or(Pose::new(shape.height / 2, shape.width / 2));
        if !shape.contains(true_pose) {
            return Err(LocalizationError::PoseOutOfBounds { pose: true_pose, shape });
        }

        let sensor = ColorSensor::from_sensor_model(&world, p_hit, P_MISS);
        debug!(
            "simulation on {} world, {} colors, sense error probability {:.4}",
            shape,
            sensor.palette().len(),
            sensor.incorrect_probability()
        );

        Ok(Simulation {
            beliefs: initialize_beliefs(&world),
            world,
            localizer,
            sensor,
            true_pose,
            prev_pose: true_pose,
            last_frame: Vec::new(),
            rng,
        })
    }

    pub fn world(&self) -> &ColorGrid {
        &self.world
    }

    pub fn beliefs(&self) -> &BeliefGrid {
        &self.beliefs
    }

    pub fn true_pose(&self) -> Pose {
        self.true_pose
    }

    pub fn prev_pose(&self) -> Pose {
        self.prev_pose
    }

    pub fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    pub fn incorrect_sense_probability(&self) -> f64 {
        self.sensor.incorrect_probability()
    }

    /// Distinct colors of the world
    pub fn colors(&self) -> &[String] {
        self.sensor.palette()
    }

    /// Read the (noisy) color under the robot
    pub fn observed_color(&mut self) -> String {
        self.sensor.read(&self.world, self.true_pose, &mut self.rng)
    }

    /// Observe and fold the observation into the beliefs
    ///
    /// Returns the observed color. On error the beliefs are left unchanged.
    pub fn sense(&mut self) -> Result<String> {
        let color = self.observed_color();
        self.beliefs = self.localizer.sense(&color, &self.world, &self.beliefs)?;
        Ok(color)
    }

    /// Move the robot by `(dy, dx)` and predict the beliefs accordingly
    pub fn move_by(&mut self, dy: isize, dx: isize) -> Result<()> {
        let beliefs = self.localizer.predict(dy, dx, &self.beliefs)?;
        let next = self.world.shape().offset(self.true_pose, dy, dx);

        self.prev_pose = self.true_pose;
        self.true_pose = next;
        self.beliefs = beliefs;
        Ok(())
    }

    /// Random step with `dy` and `dx` each drawn from `{-1, 0, 1}`
    pub fn random_move(&mut self) -> (isize, isize) {
        (self.rng.gen_range(-1..=1), self.rng.gen_range(-1..=1))
    }

    /// Run `num_steps` sense-then-move steps
    pub fn run(&mut self, num_steps: usize) -> Result<()> {
        for step in 0..num_steps {
            let color = self.sense()?;
            let (dy, dx) = self.random_move();
            self.move_by(dy, dx)?;
            debug!(
                "step {}: observed {:?}, moved ({}, {}) to {}",
                step, color, dy, dx, self.true_pose
            );
        }
        Ok(())
    }

    /// Check the current beliefs against the true pose
    pub fn localization(&self) -> Localization {
        is_robot_localized(&self.beliefs, self.true_pose)
    }

    /// Plot marker for a pose, in the same frame as the belief points
    pub fn pose_marker(&self, pose: Pose) -> ScatterPoint {
        ScatterPoint {
            x: pose.col as f64,
            y: (self.world.height() - pose.row - 1) as f64,
            weight: 1.0,
        }
    }

    /// Scatter points for the current beliefs
    pub fn belief_points(&self) -> Vec<ScatterPoint> {
        let height = self.world.height();
        self.beliefs
            .iter_cells()
            .map(|(pose, &belief)| ScatterPoint {
                x: pose.col as f64,
                y: (height - pose.row - 1) as f64,
                weight: SCATTER_SCALE * belief,
            })
            .collect()
    }

    /// Capture the beliefs for plotting
    ///
    /// With `past_turn`, the points from the previous call and the previous
    /// pose are included.
    pub fn frame(&mut self, past_turn: bool) -> BeliefFrame {
        let current = self.belief_points();
        let previous = std::mem::replace(&mut self.last_frame, current.clone());

        BeliefFrame {
            beliefs: current,
            true_pose: self.pose_marker(self.true_pose),
            previous_beliefs: past_turn.then_some(previous),
            previous_pose: past_turn.then(|| self.pose_marker(self.prev_pose)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::filters::close_enough;
    use approx::assert_abs_diff_eq;

    fn world() -> ColorGrid {
        ColorGrid::from_labels(&[
            vec!["r", "g", "g", "r"],
            vec!["g", "r", "g", "g"],
            vec!["g", "g", "r", "g"],
        ])
        .unwrap()
    }

    #[test]
    fn defaults_to_center_with_uniform_beliefs() {
        let sim = Simulation::new(world(), 0.1, 20.0, None, 0).unwrap();
        assert_eq!(sim.true_pose(), Pose::new(1, 2));
        assert_eq!(sim.prev_pose(), Pose::new(1, 2));
        assert_abs_diff_eq!(sim.incorrect_sense_probability(), 1.0 / 21.0, epsilon = 1e-12);
        assert_eq!(sim.colors(), ["r", "g"]);
        for (_, &p) in sim.beliefs().iter_cells() {
            assert_abs_diff_eq!(p, 1.0 / 12.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_out_of_bounds_start() {
        let err = Simulation::new(world(), 0.1, 20.0, Some(Pose::new(3, 0)), 0).unwrap_err();
        assert!(matches!(err, LocalizationError::PoseOutOfBounds { .. }));
    }

    #[test]
    fn rejects_negative_hit_weight() {
        assert!(Simulation::new(world(), 0.1, -2.0, None, 0).is_err());
    }

    #[test]
    fn move_wraps_pose_and_tracks_previous() {
        let mut sim = Simulation::new(world(), 0.0, 20.0, Some(Pose::new(0, 0)), 0).unwrap();
        sim.move_by(-1, -1).unwrap();
        assert_eq!(sim.true_pose(), Pose::new(2, 3));
        assert_eq!(sim.prev_pose(), Pose::new(0, 0));
        sim.move_by(1, 2).unwrap();
        assert_eq!(sim.true_pose(), Pose::new(0, 1));
        assert_eq!(sim.prev_pose(), Pose::new(2, 3));
    }

    #[test]
    fn move_accepts_extreme_offsets() {
        let mut sim = Simulation::new(world(), 0.0, 20.0, Some(Pose::new(1, 1)), 0).unwrap();
        // isize::MAX is 1 mod 3, isize::MIN is 0 mod 4
        sim.move_by(isize::MAX, isize::MIN).unwrap();
        assert_eq!(sim.true_pose(), Pose::new(2, 1));
        assert_eq!(sim.prev_pose(), Pose::new(1, 1));
        sim.move_by(isize::MIN, isize::MAX).unwrap();
        assert_eq!(sim.true_pose(), Pose::new(0, 0));
    }

    #[test]
    fn sense_concentrates_on_matching_cells() {
        // p_hit is huge so the sensor is effectively never wrong
        let mut sim = Simulation::new(world(), 0.0, 1e12, Some(Pose::new(0, 0)), 3).unwrap();
        let color = sim.sense().unwrap();
        assert_eq!(color, "r");

        let beliefs = sim.beliefs();
        assert!(beliefs[Pose::new(0, 0)] > beliefs[Pose::new(0, 1)]);
        assert_abs_diff_eq!(beliefs.total(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn random_moves_stay_in_unit_range() {
        let mut sim = Simulation::new(world(), 0.1, 20.0, None, 11).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let (dy, dx) = sim.random_move();
            assert!((-1..=1).contains(&dy));
            assert!((-1..=1).contains(&dx));
            seen.insert((dy, dx));
        }
        assert_eq!(seen.len(), 9);
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = Simulation::new(world(), 0.1, 5.0, None, 42).unwrap();
        let mut b = Simulation::new(world(), 0.1, 5.0, None, 42).unwrap();
        a.run(25).unwrap();
        b.run(25).unwrap();
        assert_eq!(a.true_pose(), b.true_pose());
        assert!(close_enough(a.beliefs(), b.beliefs()));
    }

    #[test]
    fn frame_reports_scaled_points_and_history() {
        let mut sim = Simulation::new(world(), 0.0, 20.0, Some(Pose::new(0, 0)), 0).unwrap();

        let first = sim.frame(false);
        assert_eq!(first.beliefs.len(), 12);
        assert!(first.previous_beliefs.is_none());
        assert!(first.previous_pose.is_none());
        // row 0 is drawn at the top
        assert_eq!(first.true_pose, ScatterPoint { x: 0.0, y: 2.0, weight: 1.0 });
        assert_abs_diff_eq!(first.beliefs[0].weight, SCATTER_SCALE / 12.0, epsilon = 1e-9);

        sim.move_by(1, 1).unwrap();
        let second = sim.frame(true);
        assert_eq!(second.previous_beliefs, Some(first.beliefs));
        assert_eq!(second.previous_pose, Some(ScatterPoint { x: 0.0, y: 2.0, weight: 1.0 }));
        assert_eq!(second.true_pose, ScatterPoint { x: 1.0, y: 1.0, weight: 1.0 });
    }
}
