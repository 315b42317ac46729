use crate::error::OctaveResult;
use crate::matrix::Matrix;

/// An ordered, index-addressed collection of matrices.
///
/// Positions are dense: `[0, count)` always holds live matrices. Replacing
/// keeps every index stable; removing shifts every later index down by one.
pub trait MatrixStore {
    // Growth
    fn append(&mut self, matrix: Matrix) -> OctaveResult<usize>;

    // Access
    fn count(&self) -> usize;
    fn is_valid_index(&self, index: i64) -> bool;
    fn get(&self, index: usize) -> Option<&Matrix>;

    // In-place mutation
    fn replace_at(&mut self, index: usize, matrix: Matrix) -> OctaveResult<Matrix>;
    fn remove_at(&mut self, index: usize) -> OctaveResult<Matrix>;

    // Ordering
    fn sort_by_sum(&mut self) -> OctaveResult<()>;

    // Lifecycle: releases every live matrix, returns how many there were
    fn teardown(self) -> usize
    where
        Self: Sized;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}
