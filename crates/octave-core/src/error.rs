use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OctaveError {
    #[error("no matrix with index {0}")]
    InvalidIndex(i64),

    #[error("cannot multiply {lhs_rows}x{lhs_cols} by {rhs_rows}x{rhs_cols}")]
    DimensionMismatch {
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    #[error("strassen requires square power-of-two operands, got {rows}x{cols}")]
    NotSquarePowerOfTwo { rows: usize, cols: usize },

    #[error("unrecognized command: {0:?}")]
    UnrecognizedCommand(char),

    #[error("out of memory: tried to allocate {bytes} bytes")]
    AllocationFailure { bytes: usize },

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl OctaveError {
    /// Fatal errors end the session; everything else is reported and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AllocationFailure { .. } | Self::Protocol(_))
    }
}

pub type OctaveResult<T> = Result<T, OctaveError>;
