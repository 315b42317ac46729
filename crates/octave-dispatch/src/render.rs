//! Output for the dims/print commands and for recoverable errors.

use std::fmt;
use std::io::Write;

use serde::Serialize;

use octave_core::{Matrix, OctaveError};

pub const INVALID_INDEX: &str = "No matrix with the given index\n";
pub const INVALID_MULTIPLY: &str = "Cannot perform matrix multiplication\n";
pub const INVALID_COMMAND: &str = "Unrecognized command\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Plain protocol text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("invalid output format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct Dims {
    rows: usize,
    cols: usize,
}

#[derive(Serialize)]
struct Notice {
    error: &'static str,
    message: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    format: Format,
}

impl Renderer {
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    pub fn dims<W: Write>(&self, out: &mut W, matrix: &Matrix) -> anyhow::Result<()> {
        match self.format {
            Format::Text => writeln!(out, "{} {}", matrix.rows(), matrix.cols())?,
            Format::Json => json_line(
                out,
                &Dims {
                    rows: matrix.rows(),
                    cols: matrix.cols(),
                },
            )?,
        }
        Ok(())
    }

    pub fn matrix<W: Write>(&self, out: &mut W, matrix: &Matrix) -> anyhow::Result<()> {
        match self.format {
            Format::Text => {
                for row in matrix.row_iter() {
                    for value in row {
                        write!(out, "{value} ")?;
                    }
                    writeln!(out)?;
                }
            }
            Format::Json => json_line(out, matrix)?,
        }
        Ok(())
    }

    pub fn notice<W: Write>(&self, out: &mut W, err: &OctaveError) -> anyhow::Result<()> {
        let (kind, text) = match err {
            OctaveError::InvalidIndex(_) => ("invalid_index", INVALID_INDEX),
            OctaveError::DimensionMismatch { .. } | OctaveError::NotSquarePowerOfTwo { .. } => {
                ("dimension_mismatch", INVALID_MULTIPLY)
            }
            OctaveError::UnrecognizedCommand(_) => ("unrecognized_command", INVALID_COMMAND),
            OctaveError::AllocationFailure { .. } | OctaveError::Protocol(_) => {
                anyhow::bail!("fatal error cannot be rendered as a notice: {err}")
            }
        };
        match self.format {
            Format::Text => out.write_all(text.as_bytes())?,
            Format::Json => json_line(
                out,
                &Notice {
                    error: kind,
                    message: err.to_string(),
                },
            )?,
        }
        Ok(())
    }
}

fn json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
