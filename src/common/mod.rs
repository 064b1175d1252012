//! Common utilities and types for grid localization

/// Common types used across the codebase
pub mod types {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    /// A cell index on the grid, `(row, col)`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Pose {
        pub row: usize,
        pub col: usize,
    }

    impl Pose {
        /// Create a new pose
        pub fn new(row: usize, col: usize) -> Self {
            Pose { row, col }
        }
    }

    impl From<(usize, usize)> for Pose {
        fn from((row, col): (usize, usize)) -> Self {
            Pose { row, col }
        }
    }

    impl fmt::Display for Pose {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "({}, {})", self.row, self.col)
        }
    }

    /// Dimensions of a grid
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GridShape {
        pub height: usize,
        pub width: usize,
    }

    impl GridShape {
        /// Number of cells
        pub fn area(&self) -> usize {
            self.height * self.width
        }

        /// Check that a pose lies inside the grid
        pub fn contains(&self, pose: Pose) -> bool {
            pose.row < self.height && pose.col < self.width
        }

        /// Wrap a signed index pair onto the torus
        pub fn wrap(&self, row: isize, col: isize) -> Pose {
            Pose {
                row: row.rem_euclid(self.height as isize) as usize,
                col: col.rem_euclid(self.width as isize) as usize,
            }
        }

        /// Shift a pose by a signed offset, wrapping onto the torus
        ///
        /// The offset is reduced modulo the grid size before it is added, so
        /// any `isize` is accepted.
        pub fn offset(&self, pose: Pose, dy: isize, dx: isize) -> Pose {
            let dy = dy.rem_euclid(self.height as isize) as usize;
            let dx = dx.rem_euclid(self.width as isize) as usize;
            Pose {
                row: (pose.row + dy) % self.height,
                col: (pose.col + dx) % self.width,
            }
        }
    }

    impl fmt::Display for GridShape {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}x{}", self.height, self.width)
        }
    }

    /// A single point of a belief scatter plot
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct ScatterPoint {
        pub x: f64,
        pub y: f64,
        pub weight: f64,
    }
}

#[cfg(test)]
mod tests {
    use super::types::*;

    #[test]
    fn wrap_handles_negative_offsets() {
        let shape = GridShape { height: 3, width: 4 };
        assert_eq!(shape.wrap(-1, -1), Pose::new(2, 3));
        assert_eq!(shape.wrap(3, 4), Pose::new(0, 0));
        assert_eq!(shape.wrap(-7, 9), Pose::new(2, 1));
    }

    #[test]
    fn offset_accepts_extreme_shifts() {
        let shape = GridShape { height: 3, width: 4 };
        assert_eq!(shape.offset(Pose::new(1, 1), 1, -2), Pose::new(2, 3));
        // isize::MAX = 2^63 - 1, which is 1 mod 3 and 3 mod 4
        assert_eq!(shape.offset(Pose::new(1, 1), isize::MAX, isize::MAX), Pose::new(2, 0));
        // isize::MIN = -2^63, which is 1 mod 3 and 0 mod 4
        assert_eq!(shape.offset(Pose::new(1, 1), isize::MIN, isize::MIN), Pose::new(2, 1));
    }

    #[test]
    fn contains_rejects_out_of_range() {
        let shape = GridShape { height: 2, width: 2 };
        assert!(shape.contains(Pose::new(1, 1)));
        assert!(!shape.contains(Pose::new(2, 0)));
        assert!(!shape.contains(Pose::new(0, 2)));
    }
}
