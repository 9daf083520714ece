//! # Utils Module
//!
//! Pure helpers shared by the interpreter, persistence and completion.

pub mod quoting;
pub mod transform;
pub mod url_join;

pub use quoting::{native_quote, native_quote_item, quote_cli_arg, smart_quote};
pub use transform::{to_client_args, to_native_replay_text, to_raw_text, to_tool_preview_text};
pub use url_join::{join_url, normalize_url};
