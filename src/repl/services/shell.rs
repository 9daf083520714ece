//! # Shell Service
//!
//! Runs backtick substitutions and builds the subprocess used by pipe
//! redirection.

use std::process::{Command, Stdio};

use crate::repl::commands::ast::{Word, WordPart};
use crate::repl::error::CommandError;

/// `sh -c CODE`, or `cmd /C CODE` on Windows
pub fn shell_command(code: &str) -> Command {
    #[cfg(windows)]
    {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(code);
        command
    }
    #[cfg(not(windows))]
    {
        let mut command = Command::new("sh");
        command.arg("-c").arg(code);
        command
    }
}

/// Run `code` and return its stdout without trailing line breaks
pub fn capture(code: &str) -> Result<String, CommandError> {
    tracing::debug!("Running shell substitution `{}`", code);
    let output = shell_command(code)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| CommandError::Subprocess {
            command: code.to_string(),
            code: None,
            output: e.to_string(),
        })?;

    if !output.status.success() {
        let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stdout));
        return Err(CommandError::Subprocess {
            command: code.to_string(),
            code: output.status.code(),
            output: text,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.trim_end_matches(['\r', '\n']).to_string())
}

/// Text of `word` with every shell fragment replaced by its output
///
/// Fragments run left to right; the first failure aborts the rest.
pub fn expand(word: &Word) -> Result<String, CommandError> {
    let mut out = String::new();
    for part in word.parts() {
        match part {
            WordPart::Text(text) => out.push_str(text),
            WordPart::Shell(code) => out.push_str(&capture(code)?),
        }
    }
    Ok(out)
}
