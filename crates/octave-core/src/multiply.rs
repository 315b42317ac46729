//! Matrix products over the residue ring.
//!
//! Two strategies produce the same result:
//! - [`multiply_naive`]: the textbook triple loop, any compatible shapes.
//! - [`multiply_strassen`]: seven recursive products per level instead of
//!   eight, for `2^k x 2^k` operands only.

use crate::alloc::Allocator;
use crate::error::{OctaveError, OctaveResult};
use crate::matrix::Matrix;
use crate::modular::{self, Residue, MODULUS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Naive,
    Strassen,
}

pub fn multiply(strategy: Strategy, a: &Matrix, b: &Matrix, alloc: Allocator) -> OctaveResult<Matrix> {
    match strategy {
        Strategy::Naive => multiply_naive(a, b, alloc),
        Strategy::Strassen => multiply_strassen(a, b, alloc),
    }
}

fn check_inner(a: &Matrix, b: &Matrix) -> OctaveResult<()> {
    if a.cols() != b.rows() {
        return Err(OctaveError::DimensionMismatch {
            lhs_rows: a.rows(),
            lhs_cols: a.cols(),
            rhs_rows: b.rows(),
            rhs_cols: b.cols(),
        });
    }
    Ok(())
}

/// `C[i][j] = Σ_k A[i][k] * B[k][j]`, reduced after every term.
pub fn multiply_naive(a: &Matrix, b: &Matrix, alloc: Allocator) -> OctaveResult<Matrix> {
    check_inner(a, b)?;

    let (rows, cols) = (a.rows(), b.cols());
    let rhs = b.elements();
    let mut out = alloc.grid(rows, cols)?;

    for i in 0..rows {
        let lhs = a.row(i);
        for j in 0..cols {
            let mut acc: i64 = 0;
            for (k, &x) in lhs.iter().enumerate() {
                // i64 holds (M-1)^2 + (M-1) without overflow
                acc = (acc + x as i64 * rhs[k * cols + j] as i64) % MODULUS;
            }
            out[i * cols + j] = modular::reduce(acc);
        }
    }

    // Sum is recomputed from the finished grid.
    Ok(Matrix::from_parts(rows, cols, out))
}

/// Strassen product of two `2^k x 2^k` matrices.
///
/// Operands with incompatible inner dimensions fail with
/// [`OctaveError::DimensionMismatch`]; compatible operands that are not square
/// powers of two fail with [`OctaveError::NotSquarePowerOfTwo`].
pub fn multiply_strassen(a: &Matrix, b: &Matrix, alloc: Allocator) -> OctaveResult<Matrix> {
    check_inner(a, b)?;
    for m in [a, b] {
        if !m.is_square_power_of_two() {
            return Err(OctaveError::NotSquarePowerOfTwo {
                rows: m.rows(),
                cols: m.cols(),
            });
        }
    }

    let side = a.rows();
    let out = strassen(a.elements(), b.elements(), side, alloc)?;
    Ok(Matrix::from_parts(side, side, out))
}

/// One level of the recursion over row-major `side x side` grids.
///
/// Every quadrant, operand and partial product is an owned buffer local to
/// this call and is dropped before it returns.
fn strassen(a: &[Residue], b: &[Residue], side: usize, alloc: Allocator) -> OctaveResult<Vec<Residue>> {
    if side == 1 {
        let mut out = alloc.grid(1, 1)?;
        out[0] = modular::mul(a[0], b[0]);
        return Ok(out);
    }

    let half = side / 2;
    let [a11, a12, a21, a22] = quadrants(a, side, alloc)?;
    let [b11, b12, b21, b22] = quadrants(b, side, alloc)?;

    let add = modular::add;
    let sub = modular::sub;

    let p1 = strassen(
        &zip(&a11, &a22, add, alloc)?,
        &zip(&b11, &b22, add, alloc)?,
        half,
        alloc,
    )?;
    let p2 = strassen(&zip(&a21, &a22, add, alloc)?, &b11, half, alloc)?;
    let p3 = strassen(&a11, &zip(&b12, &b22, sub, alloc)?, half, alloc)?;
    let p4 = strassen(&a22, &zip(&b21, &b11, sub, alloc)?, half, alloc)?;
    let p5 = strassen(&zip(&a11, &a12, add, alloc)?, &b22, half, alloc)?;
    let p6 = strassen(
        &zip(&a21, &a11, sub, alloc)?,
        &zip(&b11, &b12, add, alloc)?,
        half,
        alloc,
    )?;
    let p7 = strassen(
        &zip(&a12, &a22, sub, alloc)?,
        &zip(&b21, &b22, add, alloc)?,
        half,
        alloc,
    )?;

    let mut out = alloc.grid(side, side)?;
    for i in 0..half {
        for j in 0..half {
            let q = i * half + j;
            let [p1, p2, p3, p4, p5, p6, p7] =
                [&p1, &p2, &p3, &p4, &p5, &p6, &p7].map(|p| p[q] as i64);

            out[i * side + j] = modular::reduce(p1 + p4 - p5 + p7);
            out[i * side + j + half] = modular::reduce(p3 + p5);
            out[(i + half) * side + j] = modular::reduce(p2 + p4);
            out[(i + half) * side + j + half] = modular::reduce(p1 - p2 + p3 + p6);
        }
    }
    Ok(out)
}

/// Split a `side x side` grid into its `[11, 12, 21, 22]` quadrants.
fn quadrants(m: &[Residue], side: usize, alloc: Allocator) -> OctaveResult<[Vec<Residue>; 4]> {
    let half = side / 2;
    let block = |row0: usize, col0: usize| -> OctaveResult<Vec<Residue>> {
        let mut q = alloc.buffer(half * half)?;
        for r in row0..row0 + half {
            let start = r * side + col0;
            q.extend_from_slice(&m[start..start + half]);
        }
        Ok(q)
    };
    Ok([block(0, 0)?, block(0, half)?, block(half, 0)?, block(half, half)?])
}

fn zip(
    x: &[Residue],
    y: &[Residue],
    op: fn(Residue, Residue) -> Residue,
    alloc: Allocator,
) -> OctaveResult<Vec<Residue>> {
    let mut out = alloc.buffer(x.len())?;
    out.extend(x.iter().zip(y).map(|(&l, &r)| op(l, r)));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc() -> Allocator {
        Allocator::default()
    }

    /// Deterministic pseudo-random square matrix.
    fn square(side: usize, seed: i64) -> Matrix {
        let rows: Vec<Vec<i64>> = (0..side)
            .map(|i| {
                (0..side)
                    .map(|j| (seed * 7919 + (i * side + j) as i64 * 104_729) % 20_011 - 10_005)
                    .collect()
            })
            .collect();
        Matrix::from_rows(&rows[..])
    }

    #[test]
    fn test_naive_example() {
        let a = Matrix::from_rows(&[[1, 2], [3, 4]]);
        let b = Matrix::from_rows(&[[5, 6], [7, 8]]);
        let c = multiply_naive(&a, &b, alloc()).unwrap();
        assert_eq!(c, Matrix::from_rows(&[[19, 22], [43, 50]]));
        assert_eq!(c.sum(), 134);
    }

    #[test]
    fn test_strassen_example() {
        let a = Matrix::from_rows(&[[1, 2], [3, 4]]);
        let b = Matrix::from_rows(&[[5, 6], [7, 8]]);
        let c = multiply_strassen(&a, &b, alloc()).unwrap();
        assert_eq!(c, Matrix::from_rows(&[[19, 22], [43, 50]]));
    }

    #[test]
    fn test_strassen_scalar_base_case() {
        let a = Matrix::from_rows(&[[10006]]);
        let b = Matrix::from_rows(&[[2]]);
        let c = multiply_strassen(&a, &b, alloc()).unwrap();
        assert_eq!(c.elements(), &[10005]);
    }

    #[test]
    fn test_strassen_matches_naive() {
        for side in [1, 2, 4, 8, 16] {
            let a = square(side, 3);
            let b = square(side, 11);
            let naive = multiply_naive(&a, &b, alloc()).unwrap();
            let fast = multiply_strassen(&a, &b, alloc()).unwrap();
            assert_eq!(naive, fast, "side {side}");
        }
    }

    #[test]
    fn test_naive_rectangular() {
        let a = Matrix::from_rows(&[[1, 2, 3], [4, 5, 6]]);
        let b = Matrix::from_rows(&[[7, 8], [9, 10], [11, 12]]);
        let c = multiply_naive(&a, &b, alloc()).unwrap();
        assert_eq!(c, Matrix::from_rows(&[[58, 64], [139, 154]]));
    }

    #[test]
    fn test_naive_reduces_large_values() {
        let max = MODULUS - 1;
        let a = Matrix::from_rows(&[[max, max]]);
        let b = Matrix::from_rows(&[[max], [max]]);
        let c = multiply_naive(&a, &b, alloc()).unwrap();
        // 2 * (M-1)^2 ≡ 2
        assert_eq!(c.elements(), &[2]);
    }

    #[test]
    fn test_product_sum_matches_grid() {
        let a = square(8, 5);
        let b = square(8, 9);
        for strategy in [Strategy::Naive, Strategy::Strassen] {
            let c = multiply(strategy, &a, &b, alloc()).unwrap();
            assert_eq!(c.sum(), modular::sum_of(c.elements().iter().copied()));
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = Matrix::from_rows(&[[1, 2, 3]]);
        let b = Matrix::from_rows(&[[1, 2, 3]]);
        for strategy in [Strategy::Naive, Strategy::Strassen] {
            let err = multiply(strategy, &a, &b, alloc()).unwrap_err();
            assert!(matches!(err, OctaveError::DimensionMismatch { lhs_cols: 3, rhs_rows: 1, .. }));
        }
    }

    #[test]
    fn test_strassen_rejects_non_power_of_two() {
        let a = square(3, 1);
        let b = square(3, 2);
        let err = multiply_strassen(&a, &b, alloc()).unwrap_err();
        assert_eq!(err, OctaveError::NotSquarePowerOfTwo { rows: 3, cols: 3 });
        // the naive strategy still handles it
        assert!(multiply_naive(&a, &b, alloc()).is_ok());
    }
}
