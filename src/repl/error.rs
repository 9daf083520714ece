//! # Command Errors
//!
//! Every failure that can happen while a single command line is parsed or
//! evaluated. The executor converts these into one user-visible message per
//! line; they never escape the per-line boundary.

use std::io;
use thiserror::Error;

/// Number of characters shown around a syntax error
pub const SNIPPET_LEN: usize = 10;

#[derive(Error, Debug)]
pub enum CommandError {
    /// The line does not match the command grammar
    #[error("Syntax error near \"{snippet}\"")]
    Syntax { offset: usize, snippet: String },

    /// `rm` targeted a key that is not set
    #[error("Key '{0}' not found")]
    KeyNotFound(String),

    /// A file used by `source`, `exec` or a redirection could not be used
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A backtick substitution or pipe target failed
    #[error("{}", subprocess_message(.command, .code, .output))]
    Subprocess {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// Reserved output format that has no renderer yet
    #[error("{0} is not supported yet")]
    NotImplemented(&'static str),

    /// A key, value or option value carries a line break, usually from a
    /// backtick substitution; saved contexts are read line by line
    #[error("Line breaks are not allowed in '{0}'")]
    LineBreak(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client failed before producing a response
    #[error("{0}")]
    Request(String),

    #[error("Too many nested source/exec calls while reading '{0}'")]
    RecursionLimit(String),
}

fn subprocess_message(command: &str, code: &Option<i32>, output: &str) -> String {
    let output = output.trim_end();
    match code {
        Some(code) if output.is_empty() => format!("`{command}` exited with code {code}"),
        Some(code) => format!("`{command}` exited with code {code}: {output}"),
        None => format!("`{command}` was terminated: {output}"),
    }
}

impl CommandError {
    /// Build a syntax error pointing at `offset` in `line`
    pub fn syntax(line: &str, offset: usize) -> Self {
        let snippet: String = line.chars().skip(offset).take(SNIPPET_LEN).collect();
        CommandError::Syntax { offset, snippet }
    }

    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        CommandError::Io {
            path: path.into(),
            source,
        }
    }
}
