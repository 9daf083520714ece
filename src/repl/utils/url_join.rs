//! # URL Navigation
//!
//! Directory-style URL joining for `cd` and request URL tokens, plus
//! normalisation of URLs given on the command line.

use url::Url;

use crate::repl::error::CommandError;

/// Resolve `path` against `base` the way `cd` does
///
/// The base is always treated as a directory, so `cd users` from
/// `http://host/api` lands on `http://host/api/users`. Whether the result
/// ends in `/` follows the path token, not the resolved URL.
pub fn join_url(base: &str, path: &str) -> Result<String, CommandError> {
    let invalid = |url: &str, reason: String| CommandError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let mut base_url = Url::parse(base).map_err(|e| invalid(base, e.to_string()))?;
    if !base_url.path().ends_with('/') {
        let dir = format!("{}/", base_url.path());
        base_url.set_path(&dir);
    }

    let joined = base_url
        .join(path)
        .map_err(|e| invalid(path, e.to_string()))?;
    let mut result = joined.to_string();
    if result.ends_with('/') && !path.ends_with('/') {
        result.pop();
    }
    Ok(result)
}

/// Give a scheme-less command-line URL an `http` scheme
pub fn normalize_url(url: &str) -> String {
    if url.contains("://") && !url.starts_with("://") {
        return url.to_string();
    }
    let host = url.trim_start_matches(':').trim_start_matches('/');
    format!("http://{host}")
}
