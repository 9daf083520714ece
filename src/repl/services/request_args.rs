//! # Client Argument Parsing
//!
//! Turns the flat argument list produced by the context transform back into
//! a structured request, following the conventions of httpie-style command
//! lines: options first, an optional METHOD, the URL, then `key==value`,
//! `key=value` and `key:value` items.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::repl::commands::options::{is_flag_option, is_value_option, HTTP_METHODS};

/// Which parts of the exchange to print, from `--print` letters `HBhb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrintParts {
    pub request_headers: bool,
    pub request_body: bool,
    pub response_headers: bool,
    pub response_body: bool,
}

impl PrintParts {
    pub fn from_letters(letters: &str) -> Result<Self> {
        let mut parts = Self::default();
        for c in letters.chars() {
            match c {
                'H' => parts.request_headers = true,
                'B' => parts.request_body = true,
                'h' => parts.response_headers = true,
                'b' => parts.response_body = true,
                other => bail!("invalid --print letter '{other}', expected some of HBhb"),
            }
        }
        Ok(parts)
    }

    fn response(headers: bool, body: bool) -> Self {
        Self {
            response_headers: headers,
            response_body: body,
            ..Self::default()
        }
    }
}

/// `--pretty` processing level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pretty {
    All,
    Colors,
    Format,
    None,
}

impl Pretty {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "all" => Ok(Pretty::All),
            "colors" => Ok(Pretty::Colors),
            "format" => Ok(Pretty::Format),
            "none" => Ok(Pretty::None),
            other => bail!("invalid --pretty value '{other}'"),
        }
    }

    pub fn colors(self) -> bool {
        matches!(self, Pretty::All | Pretty::Colors)
    }

    pub fn format(self) -> bool {
        matches!(self, Pretty::All | Pretty::Format)
    }
}

/// Options recognised by the client
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub form: bool,
    pub auth: Option<(String, Option<String>)>,
    pub verify: Option<bool>,
    pub timeout: Option<Duration>,
    pub proxy: Option<String>,
    pub follow: bool,
    pub print: Option<PrintParts>,
    pub verbose: bool,
    pub output: Option<PathBuf>,
    pub download: bool,
    pub check_status: bool,
    pub pretty: Option<Pretty>,
    pub help: bool,
    pub version: bool,
    pub ignored: Vec<String>,
}

impl ClientOptions {
    /// Parts to print, given whether output ends on a terminal
    pub fn print_parts(&self, styled: bool) -> PrintParts {
        if let Some(print) = self.print {
            return print;
        }
        if self.verbose {
            return PrintParts {
                request_headers: true,
                request_body: true,
                response_headers: true,
                response_body: true,
            };
        }
        PrintParts::response(styled, true)
    }

    pub fn pretty(&self, styled: bool) -> Pretty {
        self.pretty
            .unwrap_or(if styled { Pretty::All } else { Pretty::None })
    }

    fn apply_flag(&mut self, name: &str) {
        match name {
            "--form" | "-f" => self.form = true,
            "--json" | "-j" => self.form = false,
            "--follow" => self.follow = true,
            "--headers" | "-h" => self.print = Some(PrintParts::response(true, false)),
            "--body" | "-b" => self.print = Some(PrintParts::response(false, true)),
            "--verbose" | "-v" => self.verbose = true,
            "--download" | "-d" => self.download = true,
            "--check-status" => self.check_status = true,
            "--help" => self.help = true,
            "--version" => self.version = true,
            other => self.ignored.push(other.to_string()),
        }
    }

    fn apply_value(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "--auth" | "-a" => {
                self.auth = Some(match value.split_once(':') {
                    Some((user, password)) => (user.to_string(), Some(password.to_string())),
                    None => (value.to_string(), None),
                });
            }
            "--auth-type" => match value {
                "basic" => {}
                "digest" => bail!("digest authentication is not supported yet"),
                other => bail!("unknown --auth-type '{other}'"),
            },
            "--verify" => {
                self.verify = Some(!matches!(value.to_lowercase().as_str(), "no" | "false"));
            }
            "--timeout" => {
                let seconds: f64 = value
                    .parse()
                    .with_context(|| format!("invalid --timeout '{value}'"))?;
                self.timeout = Some(Duration::from_secs_f64(seconds));
            }
            "--proxy" => {
                // httpie form is PROTOCOL:URL; keep the URL
                let url = match value.split_once(':') {
                    Some((_, rest)) if !rest.starts_with("//") => rest,
                    _ => value,
                };
                self.proxy = Some(url.to_string());
            }
            "--print" | "-p" => self.print = Some(PrintParts::from_letters(value)?),
            "--output" | "-o" => self.output = Some(PathBuf::from(value)),
            "--pretty" => self.pretty = Some(Pretty::parse(value)?),
            other => self.ignored.push(other.to_string()),
        }
        Ok(())
    }
}

/// Structured form of a client argument list
#[derive(Debug, Clone, Default)]
pub struct ClientRequest {
    pub method: Option<String>,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub options: ClientOptions,
}

impl ClientRequest {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut request = Self::default();
        let mut rest = args.iter().peekable();

        while let Some(arg) = rest.next_if(|a| is_flag_option(a) || is_value_option(a)) {
            if is_flag_option(arg) {
                request.options.apply_flag(arg);
            } else {
                let value = rest
                    .next()
                    .ok_or_else(|| anyhow!("option {arg} needs a value"))?;
                request.options.apply_value(arg, value)?;
            }
        }

        if let Some(method) =
            rest.next_if(|a| HTTP_METHODS.contains(&a.to_lowercase().as_str()))
        {
            request.method = Some(method.to_uppercase());
        }

        request.url = rest.next().cloned().ok_or_else(|| anyhow!("missing URL"))?;

        for item in rest {
            let (key, separator, value) =
                split_item(item).ok_or_else(|| anyhow!("invalid request item '{item}'"))?;
            let pair = (key.to_string(), value.to_string());
            match separator {
                "==" => request.query.push(pair),
                "=" => request.body.push(pair),
                _ => request.headers.push(pair),
            }
        }

        if !request.options.ignored.is_empty() {
            tracing::warn!("Ignoring unsupported options {:?}", request.options.ignored);
        }
        Ok(request)
    }

    /// Explicit method, or POST when there is a body and GET otherwise
    pub fn effective_method(&self) -> String {
        self.method.clone().unwrap_or_else(|| {
            if self.body.is_empty() {
                "GET".to_string()
            } else {
                "POST".to_string()
            }
        })
    }
}

/// Split at the earliest separator; `==` wins over `=` at the same place
fn split_item(item: &str) -> Option<(&str, &'static str, &str)> {
    let index = item.find([':', '='])?;
    let separator = if item[index..].starts_with("==") {
        "=="
    } else if item[index..].starts_with('=') {
        "="
    } else {
        ":"
    };
    Some((&item[..index], separator, &item[index + separator.len()..]))
}
