//! # Terminal I/O Implementations
//!
//! Production pager and the file and pipe sinks used by redirection.

use super::{OutputSink, Pager};
use crate::repl::error::CommandError;
use crate::repl::services::shell::shell_command;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Stdio};
use std::thread::JoinHandle;

/// Shows output on stdout, through the configured pager when stdout is a tty
pub struct TerminalPager {
    command: Option<String>,
    terminal: bool,
}

impl TerminalPager {
    /// `command` is the pager program; `None` or empty writes straight to stdout
    pub fn new(command: Option<String>) -> Self {
        Self {
            command: command.filter(|c| !c.trim().is_empty()),
            terminal: atty::is(atty::Stream::Stdout),
        }
    }

    fn spawn_pager(command: &str, data: &[u8]) -> io::Result<()> {
        let mut child = shell_command(command)
            .env("LESS", std::env::var("LESS").unwrap_or_else(|_| "-FRX".to_string()))
            .stdin(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(data) {
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }
        child.wait()?;
        Ok(())
    }
}

impl Pager for TerminalPager {
    fn page(&mut self, data: &[u8]) -> io::Result<()> {
        let end = data
            .iter()
            .rposition(|b| *b != b'\n' && *b != b'\r')
            .map_or(0, |i| i + 1);
        if end == 0 {
            return Ok(());
        }
        let mut text = data[..end].to_vec();
        text.push(b'\n');

        match &self.command {
            Some(command) if self.terminal => {
                tracing::debug!("Paging {} bytes through {}", text.len(), command);
                Self::spawn_pager(command, &text)
            }
            _ => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(&text)?;
                stdout.flush()
            }
        }
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }
}

/// Redirection into a file, truncating or appending
pub struct FileSink {
    writer: BufWriter<File>,
    path: String,
}

impl FileSink {
    pub fn create(path: &Path, append: bool) -> Result<Self, CommandError> {
        let display = path.display().to_string();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(|e| CommandError::io(display.clone(), e))?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: display,
        })
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl OutputSink for FileSink {
    fn is_terminal(&self) -> bool {
        false
    }

    fn writer(&mut self) -> &mut dyn Write {
        self
    }

    fn close(mut self: Box<Self>) -> Result<Option<Vec<u8>>, CommandError> {
        self.writer
            .flush()
            .map_err(|e| CommandError::io(self.path.clone(), e))?;
        Ok(None)
    }
}

/// Redirection into a shell command; its stdout goes on to the pager
pub struct PipeSink {
    command: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<JoinHandle<io::Result<Vec<u8>>>>,
    stderr: Option<JoinHandle<io::Result<Vec<u8>>>>,
}

fn drain(mut reader: impl Read + Send + 'static) -> JoinHandle<io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn joined(handle: Option<JoinHandle<io::Result<Vec<u8>>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .and_then(Result::ok)
        .unwrap_or_default()
}

impl PipeSink {
    pub fn spawn(command: &str) -> Result<Self, CommandError> {
        let mut child = shell_command(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::Subprocess {
                command: command.to_string(),
                code: None,
                output: e.to_string(),
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);
        Ok(Self {
            command: command.to_string(),
            child,
            stdin,
            stdout,
            stderr,
        })
    }
}

impl Write for PipeSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stdin.as_mut() {
            Some(stdin) => match stdin.write(buf) {
                // the consumer may stop reading early, like `head`
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(buf.len()),
                other => other,
            },
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stdin.as_mut() {
            Some(stdin) => match stdin.flush() {
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            },
            None => Ok(()),
        }
    }
}

impl OutputSink for PipeSink {
    fn is_terminal(&self) -> bool {
        false
    }

    fn writer(&mut self) -> &mut dyn Write {
        self
    }

    fn close(mut self: Box<Self>) -> Result<Option<Vec<u8>>, CommandError> {
        drop(self.stdin.take());
        let stdout = joined(self.stdout.take());
        let stderr = joined(self.stderr.take());
        let status = self.child.wait().map_err(|e| CommandError::Subprocess {
            command: self.command.clone(),
            code: None,
            output: e.to_string(),
        })?;
        tracing::debug!("Pipe `{}` finished with {}", self.command, status);

        if !status.success() {
            let mut output = String::from_utf8_lossy(&stderr).into_owned();
            output.push_str(&String::from_utf8_lossy(&stdout));
            return Err(CommandError::Subprocess {
                command: self.command.clone(),
                code: status.code(),
                output,
            });
        }
        Ok(Some(stdout))
    }
}
