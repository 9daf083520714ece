//! # Context Transform
//!
//! Pure renderings of a [`RequestContext`]. Every rendering walks the maps in
//! key order and emits sections in the same sequence: options, method, URL,
//! querystring, body, headers.

use crate::repl::commands::ast::{ItemKind, Tool};
use crate::repl::error::CommandError;
use crate::repl::models::RequestContext;

use super::quoting::{native_quote, native_quote_item, smart_quote};

/// `(kind, key, value)` for every request item, in rendering order
fn items(ctx: &RequestContext) -> Vec<(ItemKind, &str, &str)> {
    let querystring = ctx.querystring_params.iter().flat_map(|(k, values)| {
        values
            .iter()
            .map(move |v| (ItemKind::Querystring, k.as_str(), v.as_str()))
    });
    let body = ctx
        .body_params
        .iter()
        .map(|(k, v)| (ItemKind::Body, k.as_str(), v.as_str()));
    let headers = ctx
        .headers
        .iter()
        .map(|(k, v)| (ItemKind::Header, k.as_str(), v.as_str()));
    querystring.chain(body).chain(headers).collect()
}

/// Flat argument list for the HTTP client
pub fn to_client_args(ctx: &RequestContext, method: Option<&str>) -> Vec<String> {
    let mut args = Vec::new();
    for (name, value) in &ctx.options {
        args.push(name.clone());
        if let Some(value) = value {
            args.push(value.clone());
        }
    }
    if let Some(method) = method {
        args.push(method.to_uppercase());
    }
    args.push(ctx.url.clone());
    args.extend(
        items(ctx)
            .into_iter()
            .map(|(kind, k, v)| format!("{k}{}{v}", kind.separator())),
    );
    args
}

/// Command line for an external tool, items shell-quoted
pub fn to_tool_preview_text(
    ctx: &RequestContext,
    tool: Tool,
    method: Option<&str>,
) -> Result<String, CommandError> {
    match tool {
        Tool::Httpie => Ok(to_httpie_text(ctx, method)),
        Tool::Curl => Err(CommandError::NotImplemented("curl format")),
    }
}

fn to_httpie_text(ctx: &RequestContext, method: Option<&str>) -> String {
    let mut tokens = vec!["http".to_string()];
    tokens.extend(ctx.options.iter().map(|(name, value)| match value {
        Some(value) => format!("{name}={}", smart_quote(value)),
        None => name.clone(),
    }));
    if let Some(method) = method {
        tokens.push(method.to_uppercase());
    }
    tokens.push(ctx.url.clone());
    tokens.extend(
        items(ctx)
            .into_iter()
            .map(|(kind, k, v)| smart_quote(&format!("{k}{}{v}", kind.separator()))),
    );
    tokens.join(" ")
}

/// Raw HTTP message text; reserved, no command renders it yet
pub fn to_raw_text(_ctx: &RequestContext, _method: Option<&str>) -> Result<String, CommandError> {
    Err(CommandError::NotImplemented("raw format"))
}

/// Command-language text that rebuilds `ctx` when replayed line by line
///
/// Options named in `excluded` are left out. All values of one querystring
/// key share a line because a committed line replaces the key's list.
pub fn to_native_replay_text(ctx: &RequestContext, excluded: &[&str]) -> String {
    let mut lines: Vec<String> = ctx
        .options
        .iter()
        .filter(|(name, _)| !excluded.contains(&name.as_str()))
        .map(|(name, value)| match value {
            Some(value) => format!("{name}={}", native_quote(value)),
            None => name.clone(),
        })
        .collect();

    lines.push(format!("cd {}", native_quote(&ctx.url)));

    lines.extend(ctx.querystring_params.iter().map(|(key, values)| {
        values
            .iter()
            .map(|v| native_quote_item(key, ItemKind::Querystring.separator(), v))
            .collect::<Vec<_>>()
            .join(" ")
    }));
    lines.extend(
        ctx.body_params
            .iter()
            .map(|(k, v)| native_quote_item(k, ItemKind::Body.separator(), v)),
    );
    lines.extend(
        ctx.headers
            .iter()
            .map(|(k, v)| native_quote_item(k, ItemKind::Header.separator(), v)),
    );

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
