//! # REPL Application Controller
//!
//! Owns the line editor and the live context, and feeds every entered line
//! to the [`Executor`] until `exit` or end of input.

use anyhow::{Context, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, EditMode, Editor};
use std::path::PathBuf;

use crate::config::Config;
use crate::repl::commands::Executor;
use crate::repl::completer::ReqlineHelper;
use crate::repl::models::RequestContext;

const HISTORY_FILE_NAME: &str = "history";

/// The interactive loop
pub struct AppController {
    editor: Editor<ReqlineHelper, DefaultHistory>,
    executor: Executor,
    ctx: RequestContext,
    history_path: Option<PathBuf>,
}

impl AppController {
    pub fn new(executor: Executor, ctx: RequestContext, config: &Config) -> Result<Self> {
        let edit_mode = if config.vi {
            EditMode::Vi
        } else {
            EditMode::Emacs
        };
        let editor_config = rustyline::Config::builder()
            .edit_mode(edit_mode)
            .completion_type(CompletionType::List)
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(editor_config).context("Failed to create line editor")?;
        editor.set_helper(Some(ReqlineHelper::new(&ctx, executor.nav_tree().cloned())));

        Ok(Self {
            editor,
            executor,
            ctx,
            history_path: None,
        })
    }

    /// Keep line history in `dir` between sessions
    pub fn with_history_dir(mut self, dir: PathBuf) -> Self {
        let path = dir.join(HISTORY_FILE_NAME);
        if let Err(e) = self.editor.load_history(&path) {
            tracing::debug!("No history loaded from {}: {}", path.display(), e);
        }
        self.history_path = Some(path);
        self
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    fn prompt(&self) -> String {
        format!("{}> ", self.ctx.url)
    }

    /// Read and execute lines until the context asks to exit
    pub fn run(&mut self) -> Result<()> {
        println!("{}", "Type help for a list of commands; Ctrl-D to quit.".dimmed());

        while !self.ctx.should_exit {
            let prompt = self.prompt();
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    tracing::debug!("Read line: {:?}", line);
                    self.executor.execute(&line, &mut self.ctx);
                    if let Some(helper) = self.editor.helper_mut() {
                        helper.update(&self.ctx);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e).context("Failed to read input"),
            }
        }

        self.shutdown();
        println!("{}", "Goodbye!".green());
        Ok(())
    }

    fn shutdown(&mut self) {
        self.executor.notify_changed(&self.ctx);
        if let Some(path) = self.history_path.as_ref() {
            if let Some(dir) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(dir) {
                    tracing::warn!("Cannot create {}: {}", dir.display(), e);
                }
            }
            if let Err(e) = self.editor.save_history(path) {
                tracing::warn!("Cannot save history to {}: {}", path.display(), e);
            }
        }
    }
}
