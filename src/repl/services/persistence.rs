//! # Context Persistence
//!
//! Saves the live context as command-language text after every committed
//! change, one file per session or per host, and folds `Set-Cookie` response
//! headers back into the context.

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{CookiePolicy, CONTEXT_FILE_NAME};
use crate::repl::commands::interpreter::ContextListener;
use crate::repl::commands::options::EXCLUDED_OPTIONS;
use crate::repl::models::RequestContext;
use crate::repl::services::http::HttpResponse;
use crate::repl::utils::to_native_replay_text;

/// `<host>.hp` when contexts are kept per host, `context.hp` otherwise
pub fn context_file_name(url: &str, per_host: bool) -> String {
    if per_host {
        if let Some(host) = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
        {
            return format!("{host}.hp");
        }
    }
    CONTEXT_FILE_NAME.to_string()
}

/// Write `ctx` to `path`, leaving out options that user config owns
pub fn save_context(path: &Path, ctx: &RequestContext) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let text = to_native_replay_text(ctx, EXCLUDED_OPTIONS);
    std::fs::write(path, text).with_context(|| format!("Failed to save {}", path.display()))?;
    tracing::debug!("Saved context to {}", path.display());
    Ok(())
}

/// Context file to restore at startup
///
/// A file named on the command line has to exist; the implicit one may not
/// have been written yet.
pub fn startup_context_path(explicit: Option<&Path>, implicit: PathBuf) -> Result<PathBuf> {
    match explicit {
        Some(path) if !path.exists() => bail!("Context file {} does not exist", path.display()),
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(implicit),
    }
}

/// Merge cookies into the `Cookie` header; returns whether it changed
pub fn merge_cookies(ctx: &mut RequestContext, cookies: &[(String, String)]) -> bool {
    let mut pairs: Vec<(String, String)> = ctx
        .headers
        .get("Cookie")
        .map(|header| {
            header
                .split(';')
                .filter_map(|pair| {
                    let (name, value) = pair.trim().split_once('=')?;
                    Some((name.to_string(), value.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    for (name, value) in cookies {
        match pairs.iter_mut().find(|(n, _)| n == name) {
            Some(existing) => existing.1 = value.clone(),
            None => pairs.push((name.clone(), value.clone())),
        }
    }

    let header = pairs
        .iter()
        .map(|(n, v)| format!("{n}={v}"))
        .collect::<Vec<_>>()
        .join("; ");
    if header.is_empty() || ctx.headers.get("Cookie") == Some(&header) {
        return false;
    }
    ctx.headers.insert("Cookie".to_string(), header);
    true
}

type Confirm = Box<dyn FnMut(&str) -> bool>;

fn confirm_on_terminal(question: &str) -> bool {
    eprint!("{question} (y/n) ");
    if io::stderr().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

/// Keeps the persisted context file in step with the session
pub struct SessionListener {
    data_dir: PathBuf,
    per_host: bool,
    path: PathBuf,
    cookies: CookiePolicy,
    confirm: Confirm,
}

impl SessionListener {
    pub fn new(data_dir: PathBuf, url: &str, per_host: bool, cookies: CookiePolicy) -> Self {
        let path = data_dir.join(context_file_name(url, per_host));
        Self {
            data_dir,
            per_host,
            path,
            cookies,
            confirm: Box::new(confirm_on_terminal),
        }
    }

    /// Replace the y/n prompt used by `set_cookies = ask`
    pub fn with_confirm(mut self, confirm: impl FnMut(&str) -> bool + 'static) -> Self {
        self.confirm = Box::new(confirm);
        self
    }

    /// File the next save goes to
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, ctx: &RequestContext) {
        if let Err(e) = save_context(&self.path, ctx) {
            tracing::warn!("{:#}", e);
        }
    }
}

impl ContextListener for SessionListener {
    fn on_context_changed(&mut self, ctx: &RequestContext) {
        self.save(ctx);
    }

    fn on_response_returned(&mut self, ctx: &mut RequestContext, response: &HttpResponse) {
        let mut cookies = response.set_cookies();
        if cookies.is_empty() {
            return;
        }
        match self.cookies {
            CookiePolicy::Off => return,
            CookiePolicy::Auto => {}
            CookiePolicy::Ask => {
                let confirm = &mut self.confirm;
                cookies.retain(|(name, value)| confirm(&format!("Set cookie {name}={value}?")));
            }
        }
        if merge_cookies(ctx, &cookies) {
            tracing::info!("Stored {} cookie(s) from response", cookies.len());
            self.save(ctx);
        }
    }

    fn on_url_changed(&mut self, _old_url: &str, ctx: &RequestContext) {
        if !self.per_host {
            return;
        }
        let path = self.data_dir.join(context_file_name(&ctx.url, true));
        if path != self.path {
            tracing::info!("Context file is now {}", path.display());
            self.path = path;
        }
    }
}
