//! # Command Interpreter
//!
//! Evaluates one parsed line against the live [`RequestContext`].
//!
//! Mutations are applied to a staging context seeded with the live URL and
//! merged back in one step, so a line either commits completely or not at
//! all. Commands that only read the context build a throwaway final context
//! from the live one plus the line's own mutations.

use colored::Colorize;
use std::io::{self, Write};
use std::path::PathBuf;

use super::ast::{
    Command, ConcatMutation, Immutation, ItemKind, Mutation, Redirection, RequestLine, RmTarget,
    Word,
};
use super::parser;
use crate::config::expand_path;
use crate::repl::error::CommandError;
use crate::repl::io::{open_sink, OutputSink, Pager, SinkTarget};
use crate::repl::models::{NavTree, NodeType, RequestContext};
use crate::repl::services::http::{HttpClient, HttpResponse};
use crate::repl::services::shell::expand;
use crate::repl::utils::{join_url, to_client_args, to_native_replay_text, to_tool_preview_text};

/// Deepest allowed `source`/`exec` nesting
pub const MAX_SOURCE_DEPTH: usize = 16;

pub const HELP_TEXT: &str = "\
Commands:
\tcd <URL>\t\t\tChange URL/path
\tclear\t\t\t\tClear console screen
\tcurl\t\t\t\tPreview curl command
\tenv\t\t\t\tPrint environment
\texec <FILE>\t\t\tClear and load environment from a file
\texit\t\t\t\tExit
\thelp\t\t\t\tList commands, actions, and HTTPie options
\thttpie [<METHOD>]\t\tPreview HTTPie command
\tls [<PATH>]\t\t\tList paths of the API description
\trm *\t\t\t\tReset session
\trm -b <NAME>\t\t\tRemove a body parameter
\trm -h <NAME>\t\t\tRemove a header
\trm -o <NAME>\t\t\tRemove an HTTPie option
\trm -q <NAME>\t\t\tRemove a querystring parameter
\tsource <FILE>\t\t\tLoad environment from a file
Actions:
\tget, post, put, patch, delete, head, options
Request items:
\t<NAME>:<VALUE>\t\t\tHeader
\t<NAME>==<VALUE>\t\t\tQuerystring parameter
\t<NAME>=<VALUE>\t\t\tBody parameter
Redirection:
\t> <FILE>\t\t\tWrite output to a file
\t>> <FILE>\t\t\tAppend output to a file
\t| <COMMAND>\t\t\tPipe output through a shell command
Shell substitution:
\t`<COMMAND>`\t\t\tReplaced by the command's output
Full documentation of HTTPie options:
\thttps://httpie.io/docs/cli
";

/// Notifications about context changes, for persistence and cookie handling
pub trait ContextListener {
    /// A mutation line was committed
    fn on_context_changed(&mut self, _ctx: &RequestContext) {}

    /// An action received a response
    fn on_response_returned(&mut self, _ctx: &mut RequestContext, _response: &HttpResponse) {}

    /// A committed mutation moved the context to another URL
    fn on_url_changed(&mut self, _old_url: &str, _ctx: &RequestContext) {}
}

/// Interprets command lines
pub struct Executor {
    http: Box<dyn HttpClient>,
    pager: Box<dyn Pager>,
    errors: Box<dyn Write>,
    listener: Option<Box<dyn ContextListener>>,
    nav_tree: Option<NavTree>,
    env_excluded_options: Vec<String>,
    depth: usize,
}

impl Executor {
    pub fn new(http: Box<dyn HttpClient>, pager: Box<dyn Pager>) -> Self {
        Self {
            http,
            pager,
            errors: Box::new(io::stderr()),
            listener: None,
            nav_tree: None,
            env_excluded_options: Vec::new(),
            depth: 0,
        }
    }

    /// Where per-line error messages go; stderr by default
    pub fn with_errors(mut self, errors: Box<dyn Write>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_listener(mut self, listener: Box<dyn ContextListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn with_nav_tree(mut self, tree: NavTree) -> Self {
        self.nav_tree = Some(tree);
        self
    }

    /// Options hidden from `env` output
    pub fn with_env_excluded_options(mut self, options: Vec<String>) -> Self {
        self.env_excluded_options = options;
        self
    }

    pub fn nav_tree(&self) -> Option<&NavTree> {
        self.nav_tree.as_ref()
    }

    /// Run one line, reporting any error instead of returning it
    ///
    /// Returns whether the line succeeded.
    pub fn execute(&mut self, line: &str, ctx: &mut RequestContext) -> bool {
        match self.try_execute(line, ctx) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("Command {:?} failed: {}", line, err);
                let message = err.to_string();
                if writeln!(self.errors, "{}", message.red()).is_err() {
                    tracing::error!("Cannot report error: {}", message);
                }
                false
            }
        }
    }

    /// Run one line
    pub fn try_execute(&mut self, line: &str, ctx: &mut RequestContext) -> Result<(), CommandError> {
        match parser::parse(line)? {
            Command::Mutation(mutation) => self.mutate(mutation, ctx),
            Command::Immutation(immutation) => self.immutate(immutation, ctx),
        }
    }

    /// Replay a persisted context file without notifying the listener
    ///
    /// A missing file leaves `ctx` as it is.
    pub fn load(&mut self, path: &std::path::Path, ctx: &mut RequestContext) -> Result<(), CommandError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No context file at {}", path.display());
                return Ok(());
            }
            Err(e) => return Err(CommandError::io(path.display().to_string(), e)),
        };

        tracing::info!("Loading context from {}", path.display());
        let listener = self.listener.take();
        for line in text.lines() {
            self.execute(line, ctx);
        }
        self.listener = listener;
        Ok(())
    }

    // ---- mutations --------------------------------------------------------

    fn mutate(&mut self, mutation: Mutation, ctx: &mut RequestContext) -> Result<(), CommandError> {
        match mutation {
            Mutation::Concat(mutations) => {
                let mut staged = ctx.staging();
                apply_concat(&mutations, &mut staged)?;
                self.commit(&staged, ctx);
            }
            Mutation::Cd(path) => {
                let path = expand(&path)?;
                let mut staged = ctx.staging();
                staged.url = join_url(&ctx.url, &path)?;
                self.commit(&staged, ctx);
            }
            Mutation::Rm(target, key) => {
                let key = expand(&key)?;
                let removed = match target {
                    RmTarget::Header => ctx.headers.remove(&key).is_some(),
                    RmTarget::Querystring => ctx.querystring_params.remove(&key).is_some(),
                    RmTarget::Body => ctx.body_params.remove(&key).is_some(),
                    RmTarget::Option => ctx.options.remove(&key).is_some(),
                };
                if !removed {
                    return Err(CommandError::KeyNotFound(key));
                }
                self.notify_changed(ctx);
            }
            Mutation::RmAll => {
                ctx.clear();
                self.notify_changed(ctx);
            }
        }
        Ok(())
    }

    fn commit(&mut self, staged: &RequestContext, ctx: &mut RequestContext) {
        let old_url = ctx.url.clone();
        ctx.update(staged);
        if ctx.url != old_url {
            tracing::debug!("URL changed from {} to {}", old_url, ctx.url);
            if let Some(listener) = self.listener.as_mut() {
                listener.on_url_changed(&old_url, ctx);
            }
        }
        self.notify_changed(ctx);
    }

    /// Hand `ctx` to the listener as if a line had just been committed
    pub fn notify_changed(&mut self, ctx: &RequestContext) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_context_changed(ctx);
        }
    }

    // ---- immutations ------------------------------------------------------

    fn immutate(
        &mut self,
        immutation: Immutation,
        ctx: &mut RequestContext,
    ) -> Result<(), CommandError> {
        match immutation {
            Immutation::Noop => Ok(()),
            Immutation::Exit => {
                ctx.should_exit = true;
                Ok(())
            }
            Immutation::Help => self.with_output(None, |_, out| write_text(out, HELP_TEXT)),
            Immutation::Clear => {
                if self.pager.is_terminal() {
                    let mut stdout = io::stdout().lock();
                    write!(stdout, "\x1b[2J\x1b[1;1H")
                        .and_then(|_| stdout.flush())
                        .map_err(|e| CommandError::io("stdout", e))?;
                }
                Ok(())
            }
            Immutation::Env(redirection) => {
                let excluded: Vec<&str> =
                    self.env_excluded_options.iter().map(String::as_str).collect();
                let text = to_native_replay_text(ctx, &excluded);
                self.with_output(redirection.as_ref(), |_, out| write_text(out, &text))
            }
            Immutation::Ls(path, redirection) => {
                let path = path.as_ref().map(expand).transpose()?;
                let text = self.list_children(&ctx.url, path.as_deref());
                self.with_output(redirection.as_ref(), |_, out| write_text(out, &text))
            }
            Immutation::Source(path) => self.replay(&path, ctx, false),
            Immutation::Exec(path) => self.replay(&path, ctx, true),
            Immutation::Preview(tool, line) => {
                let (final_ctx, method) = finalize(&line, ctx)?;
                let text = to_tool_preview_text(&final_ctx, tool, method.as_deref())?;
                self.with_output(line.redirection.as_ref(), |_, out| write_text(out, &text))
            }
            Immutation::Action(line) => {
                let (final_ctx, method) = finalize(&line, ctx)?;
                let args = to_client_args(&final_ctx, method.as_deref());
                tracing::debug!("Client arguments {:?}", args);

                let response = self.with_output(line.redirection.as_ref(), |this, out| {
                    let styled = out.is_terminal();
                    this.http
                        .send(&args, out.writer(), styled)
                        .map_err(|e| CommandError::Request(format!("{e:#}")))
                })?;

                if let (Some(response), Some(listener)) = (response, self.listener.as_mut()) {
                    listener.on_response_returned(ctx, &response);
                }
                Ok(())
            }
        }
    }

    fn list_children(&self, url: &str, path: Option<&str>) -> String {
        let Some(tree) = self.nav_tree.as_ref() else {
            return String::new();
        };
        tree.children_at(url, path)
            .into_iter()
            .map(|node| match node.node_type() {
                NodeType::Dir => format!("{}/\n", node.name()),
                NodeType::File => format!("{}\n", node.name()),
            })
            .collect()
    }

    /// Execute every line of a file against `ctx`, clearing it first for `exec`
    fn replay(&mut self, path: &Word, ctx: &mut RequestContext, clear: bool) -> Result<(), CommandError> {
        let path = expand(path)?;
        if self.depth >= MAX_SOURCE_DEPTH {
            return Err(CommandError::RecursionLimit(path));
        }
        let text = std::fs::read_to_string(expand_path(&path))
            .map_err(|e| CommandError::io(path.clone(), e))?;

        if clear {
            ctx.clear();
            self.notify_changed(ctx);
        }

        tracing::info!("Replaying {} ({} lines)", path, text.lines().count());
        self.depth += 1;
        let mut result = Ok(());
        for line in text.lines() {
            match self.try_execute(line, ctx) {
                Ok(()) => {}
                // a runaway include chain stops every level
                Err(err @ CommandError::RecursionLimit(_)) => {
                    result = Err(err);
                    break;
                }
                Err(err) => {
                    let message = err.to_string();
                    if writeln!(self.errors, "{}", message.red()).is_err() {
                        tracing::error!("Cannot report error: {}", message);
                    }
                }
            }
            if ctx.should_exit {
                break;
            }
        }
        self.depth -= 1;
        result
    }

    /// Run `body` with the sink selected by `redirection`
    ///
    /// The sink is closed on every path. Bytes it hands back go to the pager.
    fn with_output<T>(
        &mut self,
        redirection: Option<&Redirection>,
        body: impl FnOnce(&mut Self, &mut dyn OutputSink) -> Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        let target = sink_target(redirection)?;
        let mut sink = open_sink(&target, self.pager.is_terminal())?;

        let result = body(self, sink.as_mut());
        let paged = match sink.close() {
            Ok(Some(bytes)) => self
                .pager
                .page(&bytes)
                .map_err(|e| CommandError::io("pager", e)),
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };

        let value = result?;
        paged?;
        Ok(value)
    }
}

fn write_text(out: &mut dyn OutputSink, text: &str) -> Result<(), CommandError> {
    out.write_all(text.as_bytes())
        .map_err(|e| CommandError::io("output", e))
}

fn sink_target(redirection: Option<&Redirection>) -> Result<SinkTarget, CommandError> {
    Ok(match redirection {
        None => SinkTarget::Pager,
        Some(Redirection::Write(file)) => SinkTarget::Write(file_path(file)?),
        Some(Redirection::Append(file)) => SinkTarget::Append(file_path(file)?),
        Some(Redirection::Pipe(command)) => SinkTarget::Pipe(command.clone()),
    })
}

fn file_path(file: &Word) -> Result<PathBuf, CommandError> {
    Ok(expand_path(&expand(file)?))
}

/// Apply a line's concat mutations to `staged`, substituting shell fragments
/// left to right
fn apply_concat(mutations: &[ConcatMutation], staged: &mut RequestContext) -> Result<(), CommandError> {
    for mutation in mutations {
        match mutation {
            ConcatMutation::Option { name, value } => {
                let value = value.as_ref().map(expand).transpose()?;
                if value.as_deref().is_some_and(has_line_break) {
                    return Err(CommandError::LineBreak(name.clone()));
                }
                staged.options.insert(name.clone(), value);
            }
            ConcatMutation::Item { kind, key, value } => {
                let key = expand(key)?;
                let value = expand(value)?;
                if has_line_break(&key) || has_line_break(&value) {
                    return Err(CommandError::LineBreak(key));
                }
                if key.is_empty() {
                    tracing::warn!("Skipping item with empty key");
                    continue;
                }
                match kind {
                    ItemKind::Header => {
                        staged.headers.insert(key, value);
                    }
                    ItemKind::Querystring => staged.add_querystring_param(key, value),
                    ItemKind::Body => {
                        staged.body_params.insert(key, value);
                    }
                }
            }
        }
    }
    Ok(())
}

fn has_line_break(s: &str) -> bool {
    s.contains(['\n', '\r'])
}

/// Live context plus the line's own URL and mutations, for this line only
fn finalize(
    line: &RequestLine,
    ctx: &RequestContext,
) -> Result<(RequestContext, Option<String>), CommandError> {
    let url = match &line.url {
        Some(word) => Some(join_url(&ctx.url, &expand(word)?)?),
        None => None,
    };

    let mut staged = ctx.staging();
    apply_concat(&line.mutations, &mut staged)?;

    let mut final_ctx = ctx.copy();
    final_ctx.update(&staged);
    if let Some(url) = url {
        final_ctx.url = url;
    }
    Ok((final_ctx, line.method.clone()))
}
