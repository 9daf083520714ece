//! # reqline - Interactive HTTP Request Shell
//!
//! Build a request a piece at a time with a small command language, keep it
//! between sessions, and fire it with one word.
//!
//! ```text
//! http://localhost:8000> cd /api/users
//! http://localhost:8000/api/users> page==2 Accept:application/json
//! http://localhost:8000/api/users> get
//! ```

pub mod cmd_args;
pub mod config;
pub mod repl;

pub use repl::*;
