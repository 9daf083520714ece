//! Common test utilities for integration tests
//!
//! Builds an [`Executor`] wired to in-memory doubles and keeps handles to
//! them so tests can look at what happened.

#![allow(dead_code)]

use std::path::PathBuf;

use reqline::repl::testing::{CapturedPager, RecordingHttpClient, SharedBuffer};
use reqline::repl::{ContextListener, Executor, RequestContext};
use tempfile::TempDir;

pub struct Harness {
    pub executor: Executor,
    pub pager: CapturedPager,
    pub http: RecordingHttpClient,
    pub errors: SharedBuffer,
    pub ctx: RequestContext,
}

impl Harness {
    pub fn new(url: &str) -> Self {
        Self::with_client(url, RecordingHttpClient::new())
    }

    pub fn with_client(url: &str, http: RecordingHttpClient) -> Self {
        Self::with_parts(url, http, CapturedPager::new())
    }

    pub fn with_parts(url: &str, http: RecordingHttpClient, pager: CapturedPager) -> Self {
        let errors = SharedBuffer::new();
        let executor = Executor::new(Box::new(http.clone()), Box::new(pager.clone()))
            .with_errors(Box::new(errors.clone()));
        Self {
            executor,
            pager,
            http,
            errors,
            ctx: RequestContext::new(url),
        }
    }

    pub fn with_listener(mut self, listener: impl ContextListener + 'static) -> Self {
        self.executor = self.executor.with_listener(Box::new(listener));
        self
    }

    /// Run a line the way the interactive loop does
    pub fn run(&mut self, line: &str) -> bool {
        self.executor.execute(line, &mut self.ctx)
    }
}

/// Write `contents` into a fresh temporary directory
pub fn temp_file(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write temp file");
    (dir, path)
}

/// Context the replay fixtures start from
pub fn api_context() -> RequestContext {
    let mut ctx = RequestContext::new("http://localhost:8000/api");
    ctx.headers
        .insert("Accept".to_string(), "text/csv".to_string());
    ctx.headers
        .insert("Authorization".to_string(), "ApiKey 1234".to_string());
    ctx.querystring_params
        .insert("page".to_string(), vec!["1".to_string()]);
    ctx.querystring_params
        .insert("limit".to_string(), vec!["50".to_string()]);
    ctx.body_params
        .insert("name".to_string(), "John Doe".to_string());
    ctx.options
        .insert("--verify".to_string(), Some("no".to_string()));
    ctx.options.insert("--form".to_string(), None);
    ctx
}

pub const REPLAY_FIXTURE: &str = "\
Language:en Authorization:'ApiKey 5678'
name='Jane Doe'  username=jane   limit==25
rm -o --form
cd v2/user
";
