use std::io::{BufRead, Write};

use tracing::{debug, warn};

use octave_core::{
    multiply, resize, transpose, Allocator, Matrix, MatrixStore, OctaveError, OctaveResult,
};
use octave_store::{SlotStore, MIN_CAPACITY};

use crate::protocol::Command;
use crate::render::{Format, Renderer};
use crate::scanner::Scanner;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// A `Q` command was read.
    Quit,
    /// Input ran out first; handled as an implicit quit.
    EndOfInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub initial_capacity: usize,
    pub alloc_retries: u32,
    pub format: Format,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            initial_capacity: MIN_CAPACITY,
            alloc_retries: octave_core::alloc::DEFAULT_RETRIES,
            format: Format::Text,
        }
    }
}

/// The command loop. Owns the one store for the lifetime of the run.
pub struct Session<S> {
    store: S,
    alloc: Allocator,
    renderer: Renderer,
}

impl Session<SlotStore> {
    pub fn open(options: SessionOptions) -> OctaveResult<Self> {
        let alloc = Allocator::new(options.alloc_retries);
        let store = SlotStore::with_capacity(options.initial_capacity, alloc)?;
        Ok(Self::new(store, alloc, options.format))
    }
}

impl<S: MatrixStore> Session<S> {
    pub fn new(store: S, alloc: Allocator, format: Format) -> Self {
        Self {
            store,
            alloc,
            renderer: Renderer::new(format),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read and execute commands until `Q` or end of input, then tear the
    /// store down. Recoverable errors are rendered to `writer`; fatal ones
    /// (allocation failure, malformed input) are returned. The store is torn
    /// down on every exit path.
    pub fn run<R: BufRead, W: Write>(mut self, reader: R, mut writer: W) -> anyhow::Result<Exit> {
        let result = self.drive(reader, &mut writer);
        let flushed = writer.flush();

        let released = self.store.teardown();
        match &result {
            Ok(exit) => debug!(released, ?exit, "session closed"),
            Err(e) => debug!(released, "session aborted: {e:#}"),
        }
        let exit = result?;
        flushed?;
        Ok(exit)
    }

    fn drive<R: BufRead, W: Write>(&mut self, reader: R, writer: &mut W) -> anyhow::Result<Exit> {
        let mut scanner = Scanner::new(reader);

        let exit = loop {
            let Some(code) = scanner.next_code()? else {
                warn!("input ended without a quit command");
                break Exit::EndOfInput;
            };
            let command = Command::read(code, &mut scanner, self.alloc)?;
            debug!(
                command = command.name(),
                line = scanner.line_no(),
                count = self.store.count(),
                "executing"
            );
            if self.execute(command, writer)? == Flow::Quit {
                break Exit::Quit;
            }
        };
        Ok(exit)
    }

    fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> anyhow::Result<Flow> {
        let e = match self.apply(command, out) {
            Ok(flow) => return Ok(flow),
            Err(e) => e,
        };
        if let Some(err) = e.downcast_ref::<OctaveError>().filter(|err| !err.is_fatal()) {
            debug!("{err}");
            self.renderer.notice(out, err)?;
            return Ok(Flow::Continue);
        }
        Err(e)
    }

    fn apply<W: Write>(&mut self, command: Command, out: &mut W) -> anyhow::Result<Flow> {
        match command {
            Command::Load { rows, cols, values } => {
                let matrix = Matrix::load(rows, cols, values, self.alloc)?;
                self.store.append(matrix)?;
            }
            Command::Dims { index } => {
                let matrix = self.lookup(index)?;
                self.renderer.dims(out, matrix)?;
            }
            Command::Print { index } => {
                let matrix = self.lookup(index)?;
                self.renderer.matrix(out, matrix)?;
            }
            Command::Subset { index, rows, cols } => {
                let source = self.lookup(index)?;
                let rows = to_positions(&rows, self.alloc)?;
                let cols = to_positions(&cols, self.alloc)?;
                let projected = resize(source, &rows, &cols, self.alloc)?;
                self.store.replace_at(index as usize, projected)?;
            }
            Command::Multiply { strategy, lhs, rhs } => {
                let product = {
                    let a = self.lookup(lhs)?;
                    let b = self.lookup(rhs)?;
                    multiply(strategy, a, b, self.alloc)?
                };
                self.store.append(product)?;
            }
            Command::Sort => self.store.sort_by_sum()?,
            Command::Transpose { index } => {
                let transposed = transpose(self.lookup(index)?, self.alloc)?;
                self.store.replace_at(index as usize, transposed)?;
            }
            Command::Remove { index } => {
                self.lookup(index)?;
                self.store.remove_at(index as usize)?;
            }
            Command::Quit => return Ok(Flow::Quit),
            Command::Unrecognized(code) => return Err(OctaveError::UnrecognizedCommand(code).into()),
        }
        Ok(Flow::Continue)
    }

    fn lookup(&self, index: i64) -> OctaveResult<&Matrix> {
        if !self.store.is_valid_index(index) {
            return Err(OctaveError::InvalidIndex(index));
        }
        self.store
            .get(index as usize)
            .ok_or(OctaveError::InvalidIndex(index))
    }
}

/// Row/column selectors as positions; a negative one can never be in range.
fn to_positions(raw: &[i64], alloc: Allocator) -> OctaveResult<Vec<usize>> {
    let mut positions = alloc.buffer(raw.len())?;
    for &value in raw {
        let position = usize::try_from(value).map_err(|_| OctaveError::InvalidIndex(value))?;
        positions.push(position);
    }
    Ok(positions)
}
