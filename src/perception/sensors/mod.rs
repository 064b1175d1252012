//! Sensor interfaces for grid localization

use rand::seq::SliceRandom;
use rand::Rng;

use crate::common::types::Pose;
use crate::grid::ColorGrid;

/// A generic sensor interface
pub trait Sensor {
    /// What a single reading produces
    type Reading;

    /// Get the sensor name
    fn name(&self) -> &str;

    /// Take a reading of `world` from `pose`
    fn read<R: Rng + ?Sized>(&self, world: &ColorGrid, pose: Pose, rng: &mut R) -> Self::Reading;
}

/// Downward-facing color sensor that sometimes reports the wrong color
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSensor {
    palette: Vec<String>,
    incorrect_probability: f64,
}

impl ColorSensor {
    /// Create a new color sensor for the colors of `world`
    pub fn new(world: &ColorGrid, incorrect_probability: f64) -> Self {
        ColorSensor {
            palette: world.palette(),
            incorrect_probability,
        }
    }

    /// Sensor whose error rate follows from a hit/miss weighting
    pub fn from_sensor_model(world: &ColorGrid, p_hit: f64, p_miss: f64) -> Self {
        Self::new(world, p_miss / (p_hit + p_miss))
    }

    pub fn incorrect_probability(&self) -> f64 {
        self.incorrect_probability
    }

    pub fn palette(&self) -> &[String] {
        &self.palette
    }
}

impl Sensor for ColorSensor {
    type Reading = String;

    fn name(&self) -> &str {
        "color_sensor"
    }

    fn read<R: Rng + ?Sized>(&self, world: &ColorGrid, pose: Pose, rng: &mut R) -> String {
        let true_color = &world[pose];

        if rng.gen::<f64>() < self.incorrect_probability {
            let others: Vec<&String> = self
                .palette
                .iter()
                .filter(|color| *color != true_color)
                .collect();
            // A single-color world has nothing else to report
            if let Some(color) = others.choose(rng) {
                return (*color).clone();
            }
        }

        true_color.clone()
    }
}
