use std::io::BufRead;

use octave_core::{Allocator, OctaveError, OctaveResult, Strategy};

use crate::scanner::Scanner;

// ---------------------------------------------------------------------------
// Command model
// ---------------------------------------------------------------------------

/// One fully-read protocol command.
///
/// Indices are kept exactly as read (possibly negative); the session
/// validates them against the store after every argument has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `L rows cols v...`
    Load {
        rows: usize,
        cols: usize,
        values: Vec<i64>,
    },
    /// `D index`
    Dims { index: i64 },
    /// `P index`
    Print { index: i64 },
    /// `C index n r... m c...`
    Subset {
        index: i64,
        rows: Vec<i64>,
        cols: Vec<i64>,
    },
    /// `M lhs rhs` / `S lhs rhs`
    Multiply {
        strategy: Strategy,
        lhs: i64,
        rhs: i64,
    },
    /// `O`
    Sort,
    /// `T index`
    Transpose { index: i64 },
    /// `F index`
    Remove { index: i64 },
    /// `Q`
    Quit,
    Unrecognized(char),
}

impl Command {
    /// Read the arguments that follow `code`.
    pub fn read<R: BufRead>(
        code: char,
        scanner: &mut Scanner<R>,
        alloc: Allocator,
    ) -> OctaveResult<Self> {
        let command = match code {
            'L' => {
                let rows = read_count(scanner, "row count")?;
                let cols = read_count(scanner, "column count")?;
                let len = rows
                    .checked_mul(cols)
                    .ok_or(OctaveError::AllocationFailure { bytes: usize::MAX })?;
                let values = read_values(scanner, len, alloc)?;
                Self::Load { rows, cols, values }
            }
            'D' => Self::Dims {
                index: scanner.next_int()?,
            },
            'P' => Self::Print {
                index: scanner.next_int()?,
            },
            'C' => {
                let index = scanner.next_int()?;
                let row_count = read_count(scanner, "row count")?;
                let rows = read_values(scanner, row_count, alloc)?;
                let col_count = read_count(scanner, "column count")?;
                let cols = read_values(scanner, col_count, alloc)?;
                Self::Subset { index, rows, cols }
            }
            'M' | 'S' => Self::Multiply {
                strategy: if code == 'M' {
                    Strategy::Naive
                } else {
                    Strategy::Strassen
                },
                lhs: scanner.next_int()?,
                rhs: scanner.next_int()?,
            },
            'O' => Self::Sort,
            'T' => Self::Transpose {
                index: scanner.next_int()?,
            },
            'F' => Self::Remove {
                index: scanner.next_int()?,
            },
            'Q' => Self::Quit,
            other => Self::Unrecognized(other),
        };
        Ok(command)
    }

    /// Short name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::Dims { .. } => "dims",
            Self::Print { .. } => "print",
            Self::Subset { .. } => "subset",
            Self::Multiply {
                strategy: Strategy::Naive,
                ..
            } => "multiply-naive",
            Self::Multiply {
                strategy: Strategy::Strassen,
                ..
            } => "multiply-strassen",
            Self::Sort => "sort",
            Self::Transpose { .. } => "transpose",
            Self::Remove { .. } => "remove",
            Self::Quit => "quit",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

fn read_count<R: BufRead>(scanner: &mut Scanner<R>, what: &str) -> OctaveResult<usize> {
    let value = scanner.next_int()?;
    usize::try_from(value).map_err(|_| {
        OctaveError::Protocol(format!(
            "line {}: {what} must be non-negative, got {value}",
            scanner.line_no()
        ))
    })
}

fn read_values<R: BufRead>(
    scanner: &mut Scanner<R>,
    len: usize,
    alloc: Allocator,
) -> OctaveResult<Vec<i64>> {
    let mut values = alloc.buffer(len)?;
    for _ in 0..len {
        values.push(scanner.next_int()?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> OctaveResult<Command> {
        let mut scanner = Scanner::new(input.as_bytes());
        let code = scanner.next_code()?.expect("input has a code");
        Command::read(code, &mut scanner, Allocator::default())
    }

    #[test]
    fn test_parse_load() {
        let cmd = parse("L 2 3\n1 2 3\n4 5 -6\n").unwrap();
        assert_eq!(
            cmd,
            Command::Load {
                rows: 2,
                cols: 3,
                values: vec![1, 2, 3, 4, 5, -6],
            }
        );
        assert_eq!(cmd.name(), "load");
    }

    #[test]
    fn test_parse_subset() {
        let cmd = parse("C 1\n2 0 0\n3 2 1 0").unwrap();
        assert_eq!(
            cmd,
            Command::Subset {
                index: 1,
                rows: vec![0, 0],
                cols: vec![2, 1, 0],
            }
        );
    }

    #[test]
    fn test_parse_multiply_strategies() {
        assert_eq!(
            parse("M 0 1").unwrap(),
            Command::Multiply {
                strategy: Strategy::Naive,
                lhs: 0,
                rhs: 1
            }
        );
        let strassen = parse("S 3 -2").unwrap();
        assert_eq!(strassen.name(), "multiply-strassen");
        assert!(matches!(strassen, Command::Multiply { lhs: 3, rhs: -2, .. }));
    }

    #[test]
    fn test_parse_argless() {
        assert_eq!(parse("O").unwrap(), Command::Sort);
        assert_eq!(parse("Q").unwrap(), Command::Quit);
        assert_eq!(parse("x").unwrap(), Command::Unrecognized('x'));
    }

    #[test]
    fn test_negative_count_is_protocol_error() {
        let err = parse("L -1 2").unwrap_err();
        assert!(matches!(err, OctaveError::Protocol(ref m) if m.contains("row count")));
    }

    #[test]
    fn test_truncated_load() {
        let err = parse("L 2 2 1 2 3").unwrap_err();
        assert!(matches!(err, OctaveError::Protocol(_)));
    }
}
