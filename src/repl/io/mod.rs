//! # I/O Abstraction Layer
//!
//! Trait seams for where command output goes, so the interpreter never
//! touches stdout directly.
//!
//! ## Design Principles
//!
//! - **Pager**: final destination for anything shown to the user
//! - **OutputSink**: per-command destination selected by redirection; opened
//!   once, closed exactly once on every exit path
//!
//! ## Architecture
//!
//! ```text
//! Production:  Executor ──▶ PagedSink ──▶ TerminalPager ──▶ $PAGER / stdout
//!                       ──▶ FileSink  ──▶ File (truncate | append)
//!                       ──▶ PipeSink  ──▶ sh -c CMD ──▶ TerminalPager
//!
//! Testing:     Executor ──▶ PagedSink ──▶ CapturedPager ──▶ Vec<u8>
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use crate::repl::error::CommandError;

pub mod mock;
pub mod terminal;

pub use mock::CapturedPager;
pub use terminal::{FileSink, PipeSink, TerminalPager};

/// Final display of command output
pub trait Pager {
    /// Show one command's complete output
    fn page(&mut self, data: &[u8]) -> io::Result<()>;

    /// Whether output lands on an interactive terminal
    fn is_terminal(&self) -> bool;
}

/// Destination of one command's output
pub trait OutputSink: Write {
    /// Whether the sink ends on a terminal; decides styled HTTP output
    fn is_terminal(&self) -> bool;

    /// The sink as a plain writer, for collaborators that take `dyn Write`
    fn writer(&mut self) -> &mut dyn Write;

    /// Flush and release the sink
    ///
    /// Returns bytes that still have to be shown through the pager.
    fn close(self: Box<Self>) -> Result<Option<Vec<u8>>, CommandError>;
}

/// Where a command sends its output, after filename substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Pager,
    Write(PathBuf),
    Append(PathBuf),
    Pipe(String),
}

/// Buffers output for the pager
pub struct PagedSink {
    buffer: Vec<u8>,
    terminal: bool,
}

impl PagedSink {
    pub fn new(terminal: bool) -> Self {
        Self {
            buffer: Vec::new(),
            terminal,
        }
    }
}

impl Write for PagedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl OutputSink for PagedSink {
    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn writer(&mut self) -> &mut dyn Write {
        self
    }

    fn close(self: Box<Self>) -> Result<Option<Vec<u8>>, CommandError> {
        Ok(Some(self.buffer))
    }
}

/// Open the sink for `target`
pub fn open_sink(
    target: &SinkTarget,
    pager_is_terminal: bool,
) -> Result<Box<dyn OutputSink>, CommandError> {
    tracing::debug!("Opening output sink {:?}", target);
    Ok(match target {
        SinkTarget::Pager => Box::new(PagedSink::new(pager_is_terminal)),
        SinkTarget::Write(path) => Box::new(FileSink::create(path, false)?),
        SinkTarget::Append(path) => Box::new(FileSink::create(path, true)?),
        SinkTarget::Pipe(command) => Box::new(PipeSink::spawn(command)?),
    })
}
