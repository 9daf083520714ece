//! # REPL Implementation
//!
//! The command language, the interpreter that applies it to a request
//! context, and the interactive shell around them.
//!
//! ## Layers
//!
//! ```text
//! AppController ──▶ Executor ──▶ parser ──▶ Command
//!   (rustyline)        │
//!                      ├──▶ RequestContext (staged, then committed)
//!                      ├──▶ HttpClient / Pager / OutputSink
//!                      └──▶ ContextListener (persistence, cookies)
//! ```

pub mod commands;
pub mod completer;
pub mod controllers;
pub mod error;
pub mod io;
pub mod models;
pub mod services;
pub mod testing;
pub mod utils;

pub use commands::{ContextListener, Executor};
pub use controllers::AppController;
pub use error::CommandError;
pub use models::RequestContext;
