//! # Client Option Vocabulary
//!
//! The closed sets of flags and value options the command language accepts,
//! plus HTTP method names. Descriptions feed completion.

/// Options that take no argument
pub const FLAG_OPTIONS: &[(&str, &str)] = &[
    ("--body", "Print only response body"),
    ("--check-status", "Check HTTP status code"),
    ("--continue", "Resume an interrupted download"),
    ("--debug", "Print debug information"),
    ("--download", "Download as a file"),
    ("--follow", "Allow full redirects"),
    ("--form", "Send as form fields"),
    ("--headers", "Print only response headers"),
    ("--help", "Show client help message"),
    ("--ignore-stdin", "Do not read stdin"),
    ("--json", "Send as a JSON object (default)"),
    ("--stream", "Stream the output"),
    ("--traceback", "Print exception traceback"),
    ("--verbose", "Print the whole request and response"),
    ("--version", "Show version"),
    ("-b", "Shorthand for --body"),
    ("-c", "Shorthand for --continue"),
    ("-d", "Shorthand for --download"),
    ("-f", "Shorthand for --form"),
    ("-h", "Shorthand for --headers"),
    ("-j", "Shorthand for --json"),
    ("-S", "Shorthand for --stream"),
    ("-v", "Shorthand for --verbose"),
];

/// Options followed by one argument
pub const VALUE_OPTIONS: &[(&str, &str)] = &[
    ("--auth", "Do authentication"),
    ("--auth-type", "Authentication mechanism to be used"),
    ("--cert", "Specify client SSL certificate"),
    ("--cert-key", "The private key to use with SSL"),
    ("--output", "Save output to a file"),
    ("--pretty", "Control output processing"),
    ("--print", "Specify what output should contain"),
    ("--proxy", "Specify proxy URL"),
    ("--session", "Create, or reuse and update a session"),
    ("--session-read-only", "Create or read a session"),
    ("--style", "Output coloring style"),
    ("--timeout", "Connection timeout in seconds"),
    ("--verify", "Set to \"no\" to skip SSL certificate checking"),
    ("-a", "Shorthand for --auth"),
    ("-o", "Shorthand for --output"),
    ("-p", "Shorthand for --print"),
    ("-s", "Shorthand for --style"),
];

pub const PRETTY_CHOICES: &[&str] = &["all", "colors", "format", "none"];

pub const AUTH_TYPE_CHOICES: &[&str] = &["basic", "digest"];

pub const VERIFY_CHOICES: &[&str] = &["no", "yes"];

/// Lowercase HTTP methods the action grammar accepts
pub const HTTP_METHODS: &[&str] = &["get", "head", "post", "put", "patch", "delete", "options"];

/// Options never written to a persisted context, so user config defaults win
pub const EXCLUDED_OPTIONS: &[&str] = &["--style"];

pub fn is_flag_option(name: &str) -> bool {
    FLAG_OPTIONS.iter().any(|(n, _)| *n == name)
}

pub fn is_value_option(name: &str) -> bool {
    VALUE_OPTIONS.iter().any(|(n, _)| *n == name)
}

/// Allowed values of an option with a closed choice set
pub fn option_value_choices(name: &str) -> Option<&'static [&'static str]> {
    match name {
        "--auth-type" => Some(AUTH_TYPE_CHOICES),
        "--pretty" => Some(PRETTY_CHOICES),
        "--verify" => Some(VERIFY_CHOICES),
        _ => None,
    }
}

/// Every option name with its description, sorted by name
pub fn all_options() -> Vec<(&'static str, &'static str)> {
    let mut all: Vec<_> = FLAG_OPTIONS.iter().chain(VALUE_OPTIONS).copied().collect();
    all.sort_by(|a, b| a.0.cmp(b.0));
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabularies_should_not_overlap() {
        for (name, _) in FLAG_OPTIONS {
            assert!(!is_value_option(name), "{name} is in both vocabularies");
        }
    }

    #[test]
    fn all_options_should_be_sorted() {
        let names: Vec<&str> = all_options().into_iter().map(|(n, _)| n).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), FLAG_OPTIONS.len() + VALUE_OPTIONS.len());
    }

    #[test]
    fn every_option_should_start_with_a_dash() {
        assert!(all_options().iter().all(|(n, _)| n.starts_with('-')));
    }
}
