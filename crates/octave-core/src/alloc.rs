//! Bounded-retry allocation.
//!
//! Every buffer the engines and the store hold is reserved through an
//! [`Allocator`]. A failed reservation is retried immediately up to
//! `retries` more times before it surfaces as
//! [`OctaveError::AllocationFailure`], which callers propagate to the session
//! and treat as fatal.

use std::mem::size_of;

use crate::error::{OctaveError, OctaveResult};
use crate::modular::Residue;

pub const DEFAULT_RETRIES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocator {
    retries: u32,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES)
    }
}

impl Allocator {
    pub fn new(retries: u32) -> Self {
        Self { retries }
    }

    /// Reserve room for exactly `additional` more elements in `buf`.
    pub fn reserve<T>(&self, buf: &mut Vec<T>, additional: usize) -> OctaveResult<()> {
        let mut attempt = 0;
        loop {
            match buf.try_reserve_exact(additional) {
                Ok(()) => return Ok(()),
                Err(_) if attempt < self.retries => attempt += 1,
                Err(_) => {
                    return Err(OctaveError::AllocationFailure {
                        bytes: additional.saturating_mul(size_of::<T>()),
                    })
                }
            }
        }
    }

    /// An empty vector with room for `capacity` elements.
    pub fn buffer<T>(&self, capacity: usize) -> OctaveResult<Vec<T>> {
        let mut buf = Vec::new();
        self.reserve(&mut buf, capacity)?;
        Ok(buf)
    }

    /// A zero-filled element grid of `rows * cols` residues.
    pub fn grid(&self, rows: usize, cols: usize) -> OctaveResult<Vec<Residue>> {
        let len = rows
            .checked_mul(cols)
            .ok_or(OctaveError::AllocationFailure { bytes: usize::MAX })?;
        let mut grid = self.buffer(len)?;
        grid.resize(len, 0);
        Ok(grid)
    }
}
