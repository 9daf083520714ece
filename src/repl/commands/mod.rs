//! # Command Language
//!
//! Parse tree, parser, option vocabulary and the interpreter that applies
//! parsed lines to a request context.

pub mod ast;
pub mod interpreter;
pub mod options;
pub mod parser;

pub use ast::{Command, Immutation, Mutation};
pub use interpreter::{ContextListener, Executor, HELP_TEXT, MAX_SOURCE_DEPTH};
pub use parser::parse;
