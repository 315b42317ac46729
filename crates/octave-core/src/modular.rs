//! Arithmetic in the residue ring `Z / MODULUS`.
//!
//! Every stored element and every intermediate result the engines keep lives
//! in `[0, MODULUS)`. Products are formed in `i64` so that two residues never
//! overflow before reduction.

/// The ring size every element is reduced by.
pub const MODULUS: i64 = 10007;

/// A canonical element of the ring, always in `[0, MODULUS)`.
pub type Residue = u32;

/// Reduce any integer to its canonical representative.
///
/// `%` truncates toward zero, so a negative operand produces a negative
/// remainder; adding `MODULUS` and reducing again fixes the sign.
#[inline]
pub fn reduce(value: i64) -> Residue {
    (((value % MODULUS) + MODULUS) % MODULUS) as Residue
}

#[inline]
pub fn add(a: Residue, b: Residue) -> Residue {
    reduce(a as i64 + b as i64)
}

#[inline]
pub fn sub(a: Residue, b: Residue) -> Residue {
    reduce(a as i64 - b as i64)
}

#[inline]
pub fn mul(a: Residue, b: Residue) -> Residue {
    reduce(a as i64 * b as i64)
}

/// Sum a sequence of residues, reducing after every term.
pub fn sum_of<I>(values: I) -> Residue
where
    I: IntoIterator<Item = Residue>,
{
    values.into_iter().fold(0, add)
}
