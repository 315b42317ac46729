use serde::Serialize;

use crate::alloc::Allocator;
use crate::error::OctaveResult;
use crate::modular::{self, Residue};

/// A dense `rows x cols` grid of residues with a cached element sum.
///
/// Elements are stored row-major in a single buffer owned by the matrix.
/// `sum` always equals the mod-`MODULUS` sum of `elements`; every constructor
/// establishes it and nothing mutates the grid afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    elements: Vec<Residue>,
    sum: Residue,
}

impl Matrix {
    /// Build a matrix from raw input values, reducing each one.
    ///
    /// `values` must yield at least `rows * cols` items; extra items are
    /// ignored and missing ones are left at zero.
    pub fn load<I>(rows: usize, cols: usize, values: I, alloc: Allocator) -> OctaveResult<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut elements = alloc.grid(rows, cols)?;
        for (slot, value) in elements.iter_mut().zip(values) {
            *slot = modular::reduce(value);
        }
        Ok(Self::from_parts(rows, cols, elements))
    }

    /// Build a matrix from nested rows, for literals in tests and callers
    /// that already hold the data. Does not go through the [`Allocator`];
    /// protocol input uses [`Matrix::load`].
    ///
    /// # Panics
    /// Panics if the rows do not all have the same length.
    pub fn from_rows<R: AsRef<[i64]>>(rows: &[R]) -> Self {
        let cols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut elements = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            let row = row.as_ref();
            assert_eq!(row.len(), cols, "ragged rows");
            elements.extend(row.iter().map(|&v| modular::reduce(v)));
        }
        Self::from_parts(rows.len(), cols, elements)
    }

    /// Wrap a finished grid, recomputing the sum from scratch.
    pub(crate) fn from_parts(rows: usize, cols: usize, elements: Vec<Residue>) -> Self {
        debug_assert_eq!(elements.len(), rows * cols);
        let sum = modular::sum_of(elements.iter().copied());
        Self {
            rows,
            cols,
            elements,
            sum,
        }
    }

    /// Wrap a grid whose sum is already known (e.g. a permutation of another
    /// matrix's elements).
    pub(crate) fn from_parts_with_sum(
        rows: usize,
        cols: usize,
        elements: Vec<Residue>,
        sum: Residue,
    ) -> Self {
        debug_assert_eq!(elements.len(), rows * cols);
        debug_assert_eq!(sum, modular::sum_of(elements.iter().copied()));
        Self {
            rows,
            cols,
            elements,
            sum,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The cached element sum, mod `MODULUS`.
    pub fn sum(&self) -> Residue {
        self.sum
    }

    /// Row-major view of every element.
    pub fn elements(&self) -> &[Residue] {
        &self.elements
    }

    /// # Panics
    /// Panics if `(row, col)` is out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Residue {
        assert!(row < self.rows && col < self.cols, "({row}, {col}) out of bounds");
        self.elements[row * self.cols + col]
    }

    /// # Panics
    /// Panics if `row` is out of bounds.
    pub fn row(&self, row: usize) -> &[Residue] {
        let start = row * self.cols;
        &self.elements[start..start + self.cols]
    }

    pub fn row_iter(&self) -> impl Iterator<Item = &[Residue]> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Whether the matrix is `2^k x 2^k` for some `k >= 0`.
    pub fn is_square_power_of_two(&self) -> bool {
        self.is_square() && self.rows.is_power_of_two()
    }
}
