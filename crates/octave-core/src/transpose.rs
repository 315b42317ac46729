use crate::alloc::Allocator;
use crate::error::OctaveResult;
use crate::matrix::Matrix;

/// Swap rows and columns. The element sum carries over unchanged.
pub fn transpose(source: &Matrix, alloc: Allocator) -> OctaveResult<Matrix> {
    let (rows, cols) = (source.cols(), source.rows());
    let mut out = alloc.buffer(rows.saturating_mul(cols))?;
    for i in 0..rows {
        out.extend((0..cols).map(|j| source.get(j, i)));
    }
    Ok(Matrix::from_parts_with_sum(rows, cols, out, source.sum()))
}
