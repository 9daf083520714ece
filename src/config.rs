//! Configuration constants and utilities for reqline
//!
//! User settings come from an INI file with a `[general]` section. A missing
//! file means defaults; data files live under the XDG data directory.

use anyhow::{bail, Context, Result};
use ini::Ini;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default config file path for reqline
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/reqline/config";

/// Environment variable name for overriding the config path
pub const CONFIG_PATH_ENV_VAR: &str = "REQLINE_CONFIG_PATH";

/// Environment variable holding the tracing filter
pub const LOG_LEVEL_ENV_VAR: &str = "REQLINE_LOG_LEVEL";

/// Persisted context file name when contexts are not kept per host
pub const CONTEXT_FILE_NAME: &str = "context.hp";

const GENERAL_SECTION: &str = "general";

/// Get the config file path, checking environment variable first, then falling back to default
pub fn get_config_path() -> String {
    std::env::var_os(CONFIG_PATH_ENV_VAR)
        .and_then(|val| val.into_string().ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Expand a leading `~`
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// `$XDG_DATA_HOME/reqline`, or `~/.local/share/reqline`
pub fn data_dir() -> PathBuf {
    let base = std::env::var_os("XDG_DATA_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| expand_path("~/.local/share"));
    base.join("reqline")
}

/// What to do with `Set-Cookie` response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CookiePolicy {
    #[default]
    Auto,
    Ask,
    Off,
}

impl FromStr for CookiePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(CookiePolicy::Auto),
            "ask" => Ok(CookiePolicy::Ask),
            "off" => Ok(CookiePolicy::Off),
            other => bail!("set_cookies must be auto, ask or off, not '{other}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Color scheme name for input highlighting. Read and kept for the config
    /// file's sake; the line editor does not highlight commands yet.
    pub command_style: String,
    /// Passed to the client as `--style` when set
    pub output_style: Option<String>,
    /// Pager program; `None` writes straight to stdout
    pub pager: Option<String>,
    pub set_cookies: CookiePolicy,
    pub vi: bool,
    pub context_per_host: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_style: "solarized".to_string(),
            output_style: None,
            pager: Some("less".to_string()),
            set_cookies: CookiePolicy::Auto,
            vi: false,
            context_per_host: false,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        other => bail!("{key} must be a boolean, not '{other}'"),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl Config {
    /// Load from the configured path
    pub fn load() -> Result<Self> {
        Self::load_from(&expand_path(&get_config_path()))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_ini(&ini)
    }

    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let mut config = Self::default();
        let Some(general) = ini.section(Some(GENERAL_SECTION)) else {
            return Ok(config);
        };

        if let Some(value) = general.get("command_style").and_then(non_empty) {
            config.command_style = value;
        }
        if let Some(value) = general.get("output_style") {
            config.output_style = non_empty(value);
        }
        if let Some(value) = general.get("pager") {
            config.pager = non_empty(value);
        }
        if let Some(value) = general.get("set_cookies") {
            config.set_cookies = value.parse()?;
        }
        if let Some(value) = general.get("vi") {
            config.vi = parse_bool("vi", value)?;
        }
        if let Some(value) = general.get("context_per_host") {
            config.context_per_host = parse_bool("context_per_host", value)?;
        }
        Ok(config)
    }
}
