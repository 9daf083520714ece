//! # HTTP Service
//!
//! Sends the request described by a flat client argument list and writes the
//! exchange to the command's output.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use reqwest::blocking::{Client, Request};
use reqwest::redirect::Policy;
use reqwest::{Method, Proxy};
use std::io::Write;
use std::path::PathBuf;

use super::request_args::{ClientRequest, PrintParts, Pretty};

/// Response handed back to listeners
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Values of every header named `name`, case-insensitively
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `name=value` pairs from every `Set-Cookie` header, attributes dropped
    pub fn set_cookies(&self) -> Vec<(String, String)> {
        self.header_values("set-cookie")
            .filter_map(|value| {
                let pair = value.split(';').next()?.trim();
                let (name, value) = pair.split_once('=')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_json(&self) -> bool {
        self.header_values("content-type")
            .any(|v| v.contains("json"))
    }
}

/// Sends requests described by client arguments
pub trait HttpClient {
    /// Send the request and write the exchange to `out`
    ///
    /// `styled` is true when `out` ends on a terminal. Returns the response
    /// when one was received.
    fn send(&mut self, args: &[String], out: &mut dyn Write, styled: bool)
        -> Result<Option<HttpResponse>>;
}

/// Blocking reqwest implementation
#[derive(Debug, Default)]
pub struct ReqwestClient;

impl ReqwestClient {
    pub fn new() -> Self {
        Self
    }

    fn build_client(request: &ClientRequest) -> Result<Client> {
        let options = &request.options;
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(options.verify == Some(false))
            .redirect(if options.follow {
                Policy::limited(30)
            } else {
                Policy::none()
            });
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(proxy) = &options.proxy {
            builder = builder.proxy(Proxy::all(proxy).context("invalid --proxy URL")?);
        }
        builder.build().context("failed to build HTTP client")
    }

    fn build_request(client: &Client, request: &ClientRequest) -> Result<Request> {
        let method = Method::from_bytes(request.effective_method().as_bytes())
            .context("invalid HTTP method")?;
        let mut builder = client.request(method, &request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some((user, password)) = &request.options.auth {
            builder = builder.basic_auth(user, password.as_ref());
        }
        if !request.body.is_empty() {
            builder = if request.options.form {
                builder.form(&request.body)
            } else {
                let object: serde_json::Map<String, serde_json::Value> = request
                    .body
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                builder.json(&object)
            };
        }
        builder
            .build()
            .with_context(|| format!("invalid request to {}", request.url))
    }

    fn write_request(out: &mut dyn Write, req: &Request, parts: PrintParts) -> Result<()> {
        if parts.request_headers {
            let path = match req.url().query() {
                Some(query) => format!("{}?{}", req.url().path(), query),
                None => req.url().path().to_string(),
            };
            writeln!(out, "{} {} HTTP/1.1", req.method(), path)?;
            if let Some(host) = req.url().host_str() {
                writeln!(out, "Host: {host}")?;
            }
            for (name, value) in req.headers() {
                writeln!(out, "{}: {}", name, value.to_str().unwrap_or("<binary>"))?;
            }
            writeln!(out)?;
        }
        if parts.request_body {
            if let Some(body) = req.body().and_then(|b| b.as_bytes()) {
                out.write_all(body)?;
                writeln!(out)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }

    fn write_response(
        out: &mut dyn Write,
        response: &HttpResponse,
        parts: PrintParts,
        pretty: Pretty,
        body_file: Option<&PathBuf>,
    ) -> Result<()> {
        if parts.response_headers {
            let status = format!("{} {} {}", response.version, response.status, response.reason);
            if pretty.colors() {
                let status = if response.is_success() {
                    status.green().bold()
                } else {
                    status.red().bold()
                };
                writeln!(out, "{status}")?;
            } else {
                writeln!(out, "{status}")?;
            }
            for (name, value) in &response.headers {
                if pretty.colors() {
                    writeln!(out, "{}: {}", name.cyan(), value)?;
                } else {
                    writeln!(out, "{name}: {value}")?;
                }
            }
            if parts.response_body {
                writeln!(out)?;
            }
        }

        if !parts.response_body {
            return Ok(());
        }
        if let Some(path) = body_file {
            std::fs::write(path, &response.body)
                .with_context(|| format!("cannot write {}", path.display()))?;
            writeln!(out, "Saved {} bytes to {}", response.body.len(), path.display())?;
            return Ok(());
        }

        if pretty.format() && response.is_json() {
            if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&response.body) {
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
                return Ok(());
            }
        }
        out.write_all(&response.body)?;
        Ok(())
    }
}

/// File a `--download` saves to when no `--output` is given
fn download_path(url: &str) -> PathBuf {
    let name = url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "index.html".to_string());
    PathBuf::from(name)
}

const CLIENT_HELP: &str = "\
Request items:
  key==value   querystring parameter
  key=value    body field (JSON object, or form with --form)
  key:value    header

Supported options:
  --json, --form, --auth USER[:PASS], --auth-type basic, --verify yes|no,
  --timeout SECONDS, --proxy URL, --follow, --headers, --body, --verbose,
  --print HBhb, --output FILE, --download, --check-status,
  --pretty all|colors|format|none, --help, --version
";

impl HttpClient for ReqwestClient {
    fn send(
        &mut self,
        args: &[String],
        out: &mut dyn Write,
        styled: bool,
    ) -> Result<Option<HttpResponse>> {
        let request = ClientRequest::parse(args)?;
        if request.options.help {
            out.write_all(CLIENT_HELP.as_bytes())?;
            return Ok(None);
        }
        if request.options.version {
            writeln!(out, "{}", env!("CARGO_PKG_VERSION"))?;
            return Ok(None);
        }

        let client = Self::build_client(&request)?;
        let req = Self::build_request(&client, &request)?;
        let parts = request.options.print_parts(styled);
        let pretty = request.options.pretty(styled);
        Self::write_request(out, &req, parts)?;

        tracing::info!("Sending {} {}", req.method(), req.url());
        let response = client
            .execute(req)
            .with_context(|| format!("request to {} failed", request.url))?;

        let status = response.status();
        let result = HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            version: format!("{:?}", response.version()),
            headers: response
                .headers()
                .iter()
                .map(|(k, v)| {
                    (
                        k.to_string(),
                        String::from_utf8_lossy(v.as_bytes()).into_owned(),
                    )
                })
                .collect(),
            body: response
                .bytes()
                .context("failed to read response body")?
                .to_vec(),
        };
        tracing::debug!("Received {} with {} bytes", result.status, result.body.len());

        let body_file = match (&request.options.output, request.options.download) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => Some(download_path(&request.url)),
            (None, false) => None,
        };
        Self::write_response(out, &result, parts, pretty, body_file.as_ref())?;

        if request.options.check_status && !result.is_success() {
            bail!("HTTP status {} {}", result.status, result.reason);
        }
        Ok(Some(result))
    }
}
