//! # Completion
//!
//! Suggests commands, methods, option and header names, header values,
//! existing keys for `rm` and navigation-tree paths for `cd`/`ls`. Candidates
//! are ranked fuzzily against the word under the cursor.

use colored::Colorize;
use regex::{Captures, Regex, RegexBuilder};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::repl::commands::options::{all_options, HTTP_METHODS};
use crate::repl::models::{NavTree, NodeType, RequestContext};

/// A candidate and the text shown next to it
pub type Suggestion = (String, String);

const ROOT_COMMANDS: &[(&str, &str)] = &[
    ("cd", "Change URL/path"),
    ("clear", "Clear the screen"),
    ("curl", "Preview curl command"),
    ("env", "Print current environment"),
    ("exec", "Clear and load environment from a file"),
    ("exit", "Exit the shell"),
    ("help", "List commands, actions, and client options"),
    ("httpie", "Preview HTTPie command"),
    ("ls", "List available endpoints"),
    ("rm *", "Remove all options and parameters"),
    ("rm -b", "Remove body parameter"),
    ("rm -h", "Remove header"),
    ("rm -o", "Remove client option"),
    ("rm -q", "Remove querystring parameter"),
    ("source", "Load environment from a file"),
];

const HEADER_NAMES: &[&str] = &[
    "Accept",
    "Accept-Encoding",
    "Authorization",
    "Cache-Control",
    "Content-Length",
    "Content-Type",
    "Cookie",
    "From",
    "Host",
    "Origin",
    "Referer",
    "User-Agent",
];

const CONTENT_TYPES: &[&str] = &[
    "application/json",
    "application/x-www-form-urlencoded",
    "multipart/form-data",
    "text/html",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    TreePaths,
    HeaderValues,
    ConcatMutations,
    Preview,
    BodyKeys,
    HeaderKeys,
    OptionKeys,
    QuerystringKeys,
    Root,
}

fn rules() -> &'static [(Regex, Rule)] {
    static RULES: OnceLock<Vec<(Regex, Rule)>> = OnceLock::new();
    RULES.get_or_init(|| {
        let methods = HTTP_METHODS.join("|");
        [
            (r"^\s*(cd|ls)\s+(\S*)$".to_string(), Rule::TreePaths),
            (
                r#"((?:[^\s'"\\=:]|\\.)+):((?:[^\s'"\\]|\\.)*)$"#.to_string(),
                Rule::HeaderValues,
            ),
            (format!(r"^\s*(?i:{methods})\s+"), Rule::ConcatMutations),
            (r"^\s*(httpie|curl)\s+".to_string(), Rule::Preview),
            (r"^\s*rm\s+-b\s+".to_string(), Rule::BodyKeys),
            (r"^\s*rm\s+-h\s+".to_string(), Rule::HeaderKeys),
            (r"^\s*rm\s+-o\s+".to_string(), Rule::OptionKeys),
            (r"^\s*rm\s+-q\s+".to_string(), Rule::QuerystringKeys),
            (String::new(), Rule::Root),
        ]
        .into_iter()
        .filter_map(|(pattern, rule)| Regex::new(&pattern).ok().map(|re| (re, rule)))
        .collect()
    })
}

/// Rank `items` by how tightly they contain the characters of `text` in order
///
/// Shorter match spans rank first, then earlier starts, then the item itself.
pub fn fuzzy_filter<'a>(text: &str, items: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let pattern = text
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect::<Vec<_>>()
        .join(".*?");
    let Ok(regex) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
        return Vec::new();
    };

    let mut ranked: Vec<(usize, usize, &str)> = items
        .into_iter()
        .filter_map(|item| regex.find(item).map(|m| (m.len(), m.start(), item)))
        .collect();
    ranked.sort();
    ranked.into_iter().map(|(_, _, item)| item).collect()
}

fn describe(desc: &str, value: Option<&str>) -> String {
    match value {
        None => desc.to_string(),
        Some(value) if value.chars().count() > 16 => {
            let short: String = value.chars().take(13).collect();
            format!("{desc} (={short}...)")
        }
        Some(value) => format!("{desc} (={value})"),
    }
}

fn body_keys(ctx: &RequestContext) -> Vec<Suggestion> {
    ctx.body_params
        .iter()
        .map(|(k, v)| (k.clone(), describe("Body parameter", Some(v))))
        .collect()
}

fn querystring_keys(ctx: &RequestContext) -> Vec<Suggestion> {
    ctx.querystring_params
        .iter()
        .map(|(k, v)| (k.clone(), describe("Querystring parameter", Some(&v.join(",")))))
        .collect()
}

fn header_names(ctx: &RequestContext, existing_only: bool) -> Vec<Suggestion> {
    let mut names: Vec<String> = ctx.headers.keys().cloned().collect();
    if !existing_only {
        names.extend(HEADER_NAMES.iter().map(|h| h.to_string()));
        names.sort();
        names.dedup();
    }
    names
        .into_iter()
        .map(|name| {
            let desc = describe("Header", ctx.headers.get(&name).map(String::as_str));
            (name, desc)
        })
        .collect()
}

fn option_names(ctx: &RequestContext, existing_only: bool) -> Vec<Suggestion> {
    let described = all_options();
    let description = |name: &str| {
        described
            .iter()
            .find(|(n, _)| *n == name)
            .map_or("", |(_, d)| *d)
    };
    let state = |name: &str| match ctx.options.get(name) {
        Some(None) => format!("{} (on)", description(name)),
        Some(Some(v)) => describe(description(name), Some(v)),
        None => description(name).to_string(),
    };

    if existing_only {
        ctx.options.keys().map(|n| (n.clone(), state(n.as_str()))).collect()
    } else {
        described
            .iter()
            .map(|(n, _)| (n.to_string(), state(*n)))
            .collect()
    }
}

fn actions() -> Vec<Suggestion> {
    HTTP_METHODS
        .iter()
        .map(|m| (m.to_string(), format!("{} request", m.to_uppercase())))
        .collect()
}

fn concat_mutations(ctx: &RequestContext) -> Vec<Suggestion> {
    let mut all = body_keys(ctx);
    all.extend(querystring_keys(ctx));
    all.extend(header_names(ctx, false));
    all.extend(option_names(ctx, false));
    all
}

fn header_values(caps: &Captures) -> Vec<Suggestion> {
    let name = caps.get(1).map_or("", |m| m.as_str());
    if name.eq_ignore_ascii_case("accept") || name.eq_ignore_ascii_case("content-type") {
        CONTENT_TYPES
            .iter()
            .map(|v| (v.to_string(), name.to_string()))
            .collect()
    } else {
        Vec::new()
    }
}

fn tree_paths(word: &str, ctx: &RequestContext, tree: Option<&NavTree>) -> Vec<Suggestion> {
    let Some(tree) = tree else {
        return Vec::new();
    };
    let dir = word.rfind('/').map_or("", |i| &word[..=i]);
    let path = (!dir.is_empty()).then_some(dir);
    tree.children_at(&ctx.url, path)
        .into_iter()
        .map(|node| match node.node_type() {
            NodeType::Dir => (format!("{dir}{}/", node.name()), "Endpoint".to_string()),
            NodeType::File => (format!("{dir}{}", node.name()), "Endpoint".to_string()),
        })
        .collect()
}

fn last_word(text: &str) -> &str {
    text.rsplit(char::is_whitespace).next().unwrap_or("")
}

/// Completions for the text before the cursor, plus the word they replace
pub fn complete_word<'t>(
    text: &'t str,
    ctx: &RequestContext,
    tree: Option<&NavTree>,
) -> (&'t str, Vec<Suggestion>) {
    let Some((caps, rule)) = rules()
        .iter()
        .find_map(|(re, rule)| re.captures(text).map(|caps| (caps, *rule)))
    else {
        return (last_word(text), Vec::new());
    };

    let word = match rule {
        Rule::HeaderValues | Rule::TreePaths => caps.get(2).map_or("", |m| m.as_str()),
        _ => last_word(text),
    };
    let candidates = match rule {
        Rule::HeaderValues => header_values(&caps),
        Rule::ConcatMutations => concat_mutations(ctx),
        Rule::Preview => {
            let mut all = actions();
            all.extend(concat_mutations(ctx));
            all
        }
        Rule::BodyKeys => body_keys(ctx),
        Rule::HeaderKeys => header_names(ctx, true),
        Rule::OptionKeys => option_names(ctx, true),
        Rule::QuerystringKeys => querystring_keys(ctx),
        Rule::TreePaths => tree_paths(word, ctx, tree),
        Rule::Root => {
            let mut all: Vec<Suggestion> = ROOT_COMMANDS
                .iter()
                .map(|(c, d)| (c.to_string(), d.to_string()))
                .collect();
            all.extend(actions());
            all.extend(concat_mutations(ctx));
            all
        }
    };
    tracing::debug!("Completion rule {:?} for {:?}", rule, word);

    let mut unique: Vec<Suggestion> = Vec::new();
    for candidate in candidates {
        if !unique.iter().any(|(c, _)| *c == candidate.0) {
            unique.push(candidate);
        }
    }
    let ranked = fuzzy_filter(word, unique.iter().map(|(c, _)| c.as_str()));
    let suggestions = ranked
        .into_iter()
        .filter_map(|c| unique.iter().find(|(u, _)| u == c).cloned())
        .collect();
    (word, suggestions)
}

/// `(candidate, description)` pairs for the text before the cursor
pub fn complete(text: &str, ctx: &RequestContext, tree: Option<&NavTree>) -> Vec<Suggestion> {
    complete_word(text, ctx, tree).1
}

/// Line-editor helper backed by a snapshot of the live context
pub struct ReqlineHelper {
    ctx: RequestContext,
    tree: Option<NavTree>,
}

impl ReqlineHelper {
    pub fn new(ctx: &RequestContext, tree: Option<NavTree>) -> Self {
        Self {
            ctx: ctx.clone(),
            tree,
        }
    }

    /// Refresh the snapshot after a line has been executed
    pub fn update(&mut self, ctx: &RequestContext) {
        self.ctx = ctx.clone();
    }
}

impl Completer for ReqlineHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let before = &line[..pos];
        let (word, suggestions) = complete_word(before, &self.ctx, self.tree.as_ref());
        let pairs = suggestions
            .into_iter()
            .map(|(candidate, desc)| Pair {
                display: format!("{candidate:<24} {desc}"),
                replacement: candidate,
            })
            .collect();
        Ok((pos - word.len(), pairs))
    }
}

impl Hinter for ReqlineHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() || line.trim().is_empty() {
            return None;
        }
        let (word, suggestions) = complete_word(line, &self.ctx, self.tree.as_ref());
        if word.is_empty() {
            return None;
        }
        suggestions
            .into_iter()
            .map(|(candidate, _)| candidate)
            .find(|c| c.starts_with(word) && c.len() > word.len())
            .map(|c| c[word.len()..].to_string())
    }
}

impl Highlighter for ReqlineHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }
}

impl Validator for ReqlineHelper {}

impl Helper for ReqlineHelper {}
