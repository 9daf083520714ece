//! # Quoting
//!
//! Two quoting dialects. Preview text is meant to be pasted into a POSIX
//! shell; native text is read back by the command parser and has to survive
//! its escape rules exactly.

/// Wrap `s` in single quotes when it contains whitespace
///
/// Embedded single quotes use the shell's `'\''` idiom so the result stays
/// pasteable.
pub fn smart_quote(s: &str) -> String {
    if s.chars().any(char::is_whitespace) {
        format!("'{}'", s.replace('\'', r"'\''"))
    } else {
        s.to_string()
    }
}

fn push_escaped(out: &mut String, s: &str, special: impl Fn(char) -> bool) {
    for c in s.chars() {
        if special(c) {
            out.push('\\');
        }
        out.push(c);
    }
}

fn is_quoted_special(c: char) -> bool {
    matches!(c, '\\' | '\'' | '`')
}

fn is_bare_special(c: char) -> bool {
    matches!(c, '\\' | '\'' | '"' | '`' | '>' | '|')
}

/// Render a path, filename or option value for the command parser
pub fn native_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    if value.chars().any(char::is_whitespace) {
        out.push('\'');
        push_escaped(&mut out, value, is_quoted_special);
        out.push('\'');
    } else {
        push_escaped(&mut out, value, is_bare_special);
    }
    out
}

/// Render one `KEY<sep>VALUE` item for the command parser
///
/// Separator characters inside the key are always escaped so the parser
/// splits on the real separator. A leading `-` is escaped too, otherwise the
/// item would read back as a client option.
pub fn native_quote_item(key: &str, separator: &str, value: &str) -> String {
    let quoted = key.chars().chain(value.chars()).any(char::is_whitespace);
    let special: fn(char) -> bool = if quoted {
        is_quoted_special
    } else {
        is_bare_special
    };
    let key_special = |c: char| c == '=' || c == ':' || special(c);

    let mut out = String::with_capacity(key.len() + value.len() + 4);
    if quoted {
        out.push('\'');
    }
    if key.starts_with('-') {
        out.push('\\');
    }
    push_escaped(&mut out, key, key_special);
    out.push_str(separator);
    push_escaped(&mut out, value, special);
    if quoted {
        out.push('\'');
    }
    out
}

/// Quote a command-line argument so it parses as one token
///
/// Arguments that are already a complete `KEY<sep>VALUE` item are quoted as
/// an item; anything else as a single value.
pub fn quote_cli_arg(arg: &str) -> String {
    if arg.starts_with('-') {
        return match arg.split_once('=') {
            Some((name, value)) => format!("{name}={}", native_quote(value)),
            None => arg.to_string(),
        };
    }
    for separator in ["==", "=", ":"] {
        if let Some((key, value)) = split_item(arg, separator) {
            return native_quote_item(key, separator, value);
        }
    }
    native_quote(arg)
}

/// Split at the earliest of `:`, `==` or `=`, returning the parts only when
/// that earliest separator is `separator`
fn split_item<'a>(arg: &'a str, separator: &str) -> Option<(&'a str, &'a str)> {
    let index = arg.find(|c| c == ':' || c == '=')?;
    let found = if arg[index..].starts_with("==") {
        "=="
    } else {
        &arg[index..index + 1]
    };
    if found != separator || index == 0 {
        return None;
    }
    Some((&arg[..index], &arg[index + found.len()..]))
}
