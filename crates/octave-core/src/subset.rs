use crate::alloc::Allocator;
use crate::error::{OctaveError, OctaveResult};
use crate::matrix::Matrix;

/// Gather `source[rows[i]][cols[j]]` into a new `rows.len() x cols.len()`
/// matrix.
///
/// Indices may repeat and appear in any order. Any index outside the source
/// bounds fails with [`OctaveError::InvalidIndex`] before anything is
/// allocated.
pub fn resize(source: &Matrix, rows: &[usize], cols: &[usize], alloc: Allocator) -> OctaveResult<Matrix> {
    check_bounds(rows, source.rows())?;
    check_bounds(cols, source.cols())?;

    let mut out = alloc.buffer(rows.len().saturating_mul(cols.len()))?;
    for &r in rows {
        let src = source.row(r);
        out.extend(cols.iter().map(|&c| src[c]));
    }
    Ok(Matrix::from_parts(rows.len(), cols.len(), out))
}

fn check_bounds(indices: &[usize], limit: usize) -> OctaveResult<()> {
    match indices.iter().find(|&&i| i >= limit) {
        Some(&bad) => Err(OctaveError::InvalidIndex(bad as i64)),
        None => Ok(()),
    }
}
