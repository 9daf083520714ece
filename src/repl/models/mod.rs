//! # Models Module
//!
//! Data the interpreter works on: the request context and the optional
//! navigation tree derived from an API description.

pub mod nav_tree;
pub mod request_context;

pub use nav_tree::{NavTree, Node, NodeType};
pub use request_context::{
    BodyParams, Headers, Options, QuerystringParams, RequestContext, DEFAULT_URL,
};
