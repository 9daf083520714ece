//! Testing infrastructure for REPL components
//!
//! In-memory doubles for the executor's collaborators, so command lines can
//! be driven end to end without a terminal or a network.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::repl::services::http::{HttpClient, HttpResponse};

pub use crate::repl::io::CapturedPager;

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Writer whose contents stay readable through any clone
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&locked(&self.bytes)).into_owned()
    }

    pub fn clear(&self) {
        locked(&self.bytes).clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        locked(&self.bytes).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct Recording {
    requests: Vec<Vec<String>>,
    styled: Vec<bool>,
    response: Option<HttpResponse>,
    failure: Option<String>,
}

/// HTTP client that records argument lists and replays a canned response
#[derive(Clone, Default)]
pub struct RecordingHttpClient {
    state: Arc<Mutex<Recording>>,
}

impl RecordingHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with `response`, writing its body to the output
    pub fn with_response(self, response: HttpResponse) -> Self {
        locked(&self.state).response = Some(response);
        self
    }

    /// Fail every request with `message` before any output is written
    pub fn failing(self, message: &str) -> Self {
        locked(&self.state).failure = Some(message.to_string());
        self
    }

    /// Argument lists of every request, oldest first
    pub fn requests(&self) -> Vec<Vec<String>> {
        locked(&self.state).requests.clone()
    }

    /// Whether each request was asked for styled output
    pub fn styled(&self) -> Vec<bool> {
        locked(&self.state).styled.clone()
    }
}

impl HttpClient for RecordingHttpClient {
    fn send(
        &mut self,
        args: &[String],
        out: &mut dyn Write,
        styled: bool,
    ) -> anyhow::Result<Option<HttpResponse>> {
        let mut state = locked(&self.state);
        state.requests.push(args.to_vec());
        state.styled.push(styled);
        if let Some(message) = &state.failure {
            anyhow::bail!("{message}");
        }
        match &state.response {
            Some(response) => {
                out.write_all(&response.body)?;
                Ok(Some(response.clone()))
            }
            None => Ok(None),
        }
    }
}
