//! Toroidal grids for localization
//!
//! This module provides the grid container shared by the world map and the
//! belief distribution. Cells are addressed `(row, col)` and every scan runs
//! in row-major order. Indices past an edge wrap to the opposite edge.

use std::ops::Index;

use nalgebra::{DMatrix, Scalar};

use crate::common::types::{GridShape, Pose};
use crate::error::{LocalizationError, Result};

/// A rectangular, non-empty grid with toroidal addressing
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T: Scalar> {
    cells: DMatrix<T>,
}

/// World map of categorical color labels
pub type ColorGrid = Grid<String>;

/// Discrete probability distribution over robot positions
pub type BeliefGrid = Grid<f64>;

impl<T: Scalar> Grid<T> {
    /// Build a grid from nested rows
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(LocalizationError::EmptyGrid);
        }

        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != width {
                return Err(LocalizationError::RaggedRow {
                    row,
                    expected: width,
                    found: cells.len(),
                });
            }
        }

        Ok(Grid {
            cells: DMatrix::from_row_iterator(height, width, rows.into_iter().flatten()),
        })
    }

    /// Wrap an existing matrix
    pub fn from_matrix(cells: DMatrix<T>) -> Result<Self> {
        if cells.is_empty() {
            return Err(LocalizationError::EmptyGrid);
        }
        Ok(Grid { cells })
    }

    // Shapes passed here always come from an existing grid, so they are non-empty.
    pub(crate) fn from_fn(shape: GridShape, mut f: impl FnMut(Pose) -> T) -> Self {
        Grid {
            cells: DMatrix::from_fn(shape.height, shape.width, |row, col| f(Pose::new(row, col))),
        }
    }

    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    pub fn shape(&self) -> GridShape {
        GridShape {
            height: self.height(),
            width: self.width(),
        }
    }

    /// Get a cell, or `None` when the pose is outside the grid
    pub fn get(&self, pose: Pose) -> Option<&T> {
        self.cells.get((pose.row, pose.col))
    }

    /// Get a cell with toroidal wraparound
    pub fn wrapped(&self, row: isize, col: isize) -> &T {
        &self[self.shape().wrap(row, col)]
    }

    /// Iterate over all cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (Pose, &T)> + '_ {
        let width = self.width();
        (0..self.height()).flat_map(move |row| {
            (0..width).map(move |col| (Pose::new(row, col), &self.cells[(row, col)]))
        })
    }

    /// Copy the grid back out as nested rows
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.cells
            .row_iter()
            .map(|row| row.iter().cloned().collect())
            .collect()
    }

    /// Fail with `ShapeMismatch` unless `other` has the same dimensions
    pub fn ensure_same_shape<U: Scalar>(&self, other: &Grid<U>) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(LocalizationError::ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        Ok(())
    }

    pub fn as_matrix(&self) -> &DMatrix<T> {
        &self.cells
    }
}

impl<T: Scalar> Index<Pose> for Grid<T> {
    type Output = T;

    fn index(&self, pose: Pose) -> &T {
        &self.cells[(pose.row, pose.col)]
    }
}

impl Grid<f64> {
    /// Sum of every cell
    pub fn total(&self) -> f64 {
        self.cells.sum()
    }
}

impl Grid<String> {
    /// Build a color grid from anything string-like
    pub fn from_labels<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self> {
        Grid::from_rows(
            rows.iter()
                .map(|row| row.iter().map(|label| label.as_ref().to_string()).collect())
                .collect(),
        )
    }

    /// Distinct colors in order of first appearance
    pub fn palette(&self) -> Vec<String> {
        let mut colors: Vec<String> = Vec::new();
        for (_, color) in self.iter_cells() {
            if !colors.contains(color) {
                colors.push(color.clone());
            }
        }
        colors
    }
}
