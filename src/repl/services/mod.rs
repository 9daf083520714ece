//! # Services Layer
//!
//! Side-effecting operations the interpreter delegates to: sending HTTP
//! requests, running shell snippets and persisting the context.

pub mod http;
pub mod persistence;
pub mod request_args;
pub mod shell;

pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use persistence::{context_file_name, save_context, startup_context_path, SessionListener};
pub use shell::{capture, expand, shell_command};
