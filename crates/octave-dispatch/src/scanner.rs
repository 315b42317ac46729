use std::io::BufRead;

use octave_core::{OctaveError, OctaveResult};

/// Pulls operation codes and integers out of a text stream, one line at a
/// time.
///
/// Whitespace (including newlines) separates everything. An operation code
/// is exactly one character, so `L2 2` reads as `L` followed by `2`.
pub struct Scanner<R> {
    reader: R,
    line: String,
    pos: usize,
    line_no: usize,
}

impl<R: BufRead> Scanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            pos: 0,
            line_no: 0,
        }
    }

    /// 1-based number of the line currently being read.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// The next non-whitespace character, or `None` once input is exhausted.
    pub fn next_code(&mut self) -> OctaveResult<Option<char>> {
        if !self.skip_whitespace()? {
            return Ok(None);
        }
        let code = self.line[self.pos..].chars().next();
        if let Some(c) = code {
            self.pos += c.len_utf8();
        }
        Ok(code)
    }

    /// The next whitespace-delimited signed integer.
    pub fn next_int(&mut self) -> OctaveResult<i64> {
        if !self.skip_whitespace()? {
            return Err(OctaveError::Protocol(format!(
                "unexpected end of input after line {}",
                self.line_no
            )));
        }
        let rest = &self.line[self.pos..];
        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let token = &rest[..len];
        let value = token.parse::<i64>().map_err(|_| {
            OctaveError::Protocol(format!(
                "line {}: expected an integer, found {token:?}",
                self.line_no
            ))
        })?;
        self.pos += len;
        Ok(value)
    }

    /// Advance to the next non-whitespace character, reading more lines as
    /// needed. Returns `false` at end of input.
    fn skip_whitespace(&mut self) -> OctaveResult<bool> {
        loop {
            if let Some(offset) = self.line[self.pos..].find(|c: char| !c.is_whitespace()) {
                self.pos += offset;
                return Ok(true);
            }
            self.line.clear();
            self.pos = 0;
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| OctaveError::Protocol(format!("read error: {e}")))?;
            if read == 0 {
                return Ok(false);
            }
            self.line_no += 1;
        }
    }
}
