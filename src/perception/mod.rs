//! Perception module for grid localization
pub mod filters;
pub mod localization;
pub mod sensors;

pub use self::filters::{blur, close_enough, normalize, BlurKernel, Filter};
pub use self::localization::{
    initialize_beliefs, is_robot_localized, move_beliefs, sense, Localization, Localizer,
};
pub use self::sensors::{ColorSensor, Sensor};
