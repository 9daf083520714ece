//! # Command Parser
//!
//! Recursive-descent parser for the command language. Each rule returns
//! `None` on failure and the caller backtracks; the furthest position any
//! rule reached is reported when the whole line fails.
//!
//! ```text
//! command          := mutation | immutation
//! mutation         := concat_mutation+ | cd | rm
//! immutation       := preview | action | help | exit | clear | env | ls
//!                   | source | exec | <blank>
//! concat_mutation  := option_mutation | item_mutation
//! item_mutation    := KEY (":" | "==" | "=") VALUE      (three quoting styles)
//! preview          := ("httpie" | "curl") method? urlpath? concat_mutation* redirection?
//! action           := method urlpath? concat_mutation* redirection?
//! redirection      := ">" FILE | ">>" FILE | "|" SHELLCOMMAND
//! ```

use super::ast::{
    Command, ConcatMutation, Immutation, ItemKind, Mutation, Redirection, RequestLine, RmTarget,
    Tool, Word,
};
use super::options::{is_flag_option, is_value_option, HTTP_METHODS};
use crate::repl::error::CommandError;

/// Characters that end an unquoted key
fn is_key_stop(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\'' | '"' | '=' | ':' | '>' | '|')
}

/// Characters that end an unquoted value, path or filename
fn is_value_stop(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\'' | '"' | '>' | '|')
}

/// Parse one line of input into a command
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let mut parser = Parser::new(line);
    match parser.command() {
        Some(command) => {
            tracing::debug!("Parsed {:?}", command);
            Ok(command)
        }
        None => {
            tracing::debug!("Parse failed at offset {} of {:?}", parser.furthest, line);
            Err(CommandError::syntax(line, parser.furthest))
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    furthest: usize,
}

impl Parser {
    fn new(line: &str) -> Self {
        Self {
            chars: line.chars().collect(),
            pos: 0,
            furthest: 0,
        }
    }

    // ---- primitives -------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn fail<T>(&mut self) -> Option<T> {
        self.furthest = self.furthest.max(self.pos);
        None
    }

    /// Run `rule`, restoring the position when it fails
    fn attempt<T>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let start = self.pos;
        let result = rule(self);
        if result.is_none() {
            self.pos = start;
        }
        result
    }

    /// Whether `rule` would match here; never consumes input
    fn lookahead<T>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> bool {
        let start = self.pos;
        let matched = rule(self).is_some();
        self.pos = start;
        matched
    }

    fn skip_ws(&mut self) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn require_ws(&mut self) -> Option<()> {
        if self.skip_ws() == 0 {
            return self.fail();
        }
        Some(())
    }

    fn end(&mut self) -> Option<()> {
        self.skip_ws();
        if self.at_eof() {
            Some(())
        } else {
            self.fail()
        }
    }

    fn literal(&mut self, text: &str) -> Option<()> {
        for (i, expected) in text.chars().enumerate() {
            if self.peek_at(i) != Some(expected) {
                return self.fail();
            }
        }
        self.pos += text.chars().count();
        Some(())
    }

    /// A keyword must be followed by whitespace, the end of line, or a
    /// redirection operator
    fn at_boundary(&self) -> bool {
        match self.peek() {
            None => true,
            Some(c) => c.is_whitespace() || c == '>' || c == '|',
        }
    }

    fn keyword(&mut self, word: &str) -> Option<()> {
        self.attempt(|p| {
            p.literal(word)?;
            if p.at_boundary() {
                Some(())
            } else {
                p.fail()
            }
        })
    }

    /// Case-insensitive match against any of `words`; returns the lowercase word
    fn keyword_ci(&mut self, words: &[&str]) -> Option<String> {
        for word in words {
            let len = word.chars().count();
            if self.pos + len > self.chars.len() {
                continue;
            }
            let candidate: String = self.chars[self.pos..self.pos + len].iter().collect();
            if candidate.to_lowercase() == *word {
                let start = self.pos;
                self.pos += len;
                if self.at_boundary() {
                    return Some(word.to_string());
                }
                self.pos = start;
            }
        }
        self.fail()
    }

    // ---- words ------------------------------------------------------------

    /// Backslash escape: `\X` decodes to `X`
    fn escape(&mut self, word: &mut Word) -> Option<()> {
        match self.peek_at(1) {
            Some(c) => {
                word.push_char(c);
                self.pos += 2;
                Some(())
            }
            None => {
                self.pos += 1;
                self.fail()
            }
        }
    }

    /// Backtick shell fragment, taken verbatim
    fn shell_fragment(&mut self, word: &mut Word) -> Option<()> {
        let start = self.pos;
        self.pos += 1;
        let mut code = String::new();
        loop {
            match self.peek() {
                Some('`') => {
                    self.pos += 1;
                    word.push_shell(code);
                    return Some(());
                }
                Some(c) => {
                    code.push(c);
                    self.pos += 1;
                }
                None => {
                    self.pos = start;
                    return self.fail();
                }
            }
        }
    }

    /// Unquoted run of characters up to a `stop` character; may be empty
    fn unquoted(&mut self, stop: fn(char) -> bool) -> Option<Word> {
        let mut word = Word::new();
        while let Some(c) = self.peek() {
            match c {
                '\\' => self.escape(&mut word)?,
                '`' => self.shell_fragment(&mut word)?,
                c if stop(c) => break,
                c => {
                    word.push_char(c);
                    self.pos += 1;
                }
            }
        }
        Some(word)
    }

    /// Body of a quoted run, after the opening quote, up to `close` or any
    /// character accepted by `also_stop`. The terminator is not consumed.
    fn quoted_body(&mut self, close: char, also_stop: fn(char) -> bool) -> Option<Word> {
        let mut word = Word::new();
        loop {
            match self.peek() {
                // unterminated; the caller points the error at the opening quote
                None => return None,
                Some('\\') => self.escape(&mut word)?,
                Some('`') => self.shell_fragment(&mut word)?,
                Some(c) if c == close || also_stop(c) => return Some(word),
                Some(c) => {
                    word.push_char(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn unterminated<T>(&mut self, open: usize) -> Option<T> {
        self.pos = open;
        self.fail()
    }

    fn peek_quote(&self) -> Option<char> {
        self.peek().filter(|c| *c == '\'' || *c == '"')
    }

    /// `'...'` or `"..."`
    fn quoted(&mut self) -> Option<Word> {
        let Some(quote) = self.peek_quote() else {
            return self.fail();
        };
        self.attempt(|p| {
            let open = p.pos;
            p.pos += 1;
            let Some(word) = p.quoted_body(quote, |_| false) else {
                return p.unterminated(open);
            };
            p.literal(&quote.to_string())?;
            Some(word)
        })
    }

    /// Quoted or unquoted value-like word; may be empty when unquoted
    fn value_word(&mut self) -> Option<Word> {
        if self.peek_quote().is_some() {
            self.quoted()
        } else {
            self.unquoted(is_value_stop)
        }
    }

    /// Non-empty path, filename or `rm` key
    fn path_word(&mut self) -> Option<Word> {
        if self.peek_quote().is_some() {
            return self.quoted();
        }
        self.attempt(|p| {
            let word = p.unquoted(is_value_stop)?;
            if word.is_empty() {
                return p.fail();
            }
            Some(word)
        })
    }

    // ---- mutations --------------------------------------------------------

    fn operator(&mut self) -> Option<ItemKind> {
        match (self.peek(), self.peek_at(1)) {
            (Some('='), Some('=')) => {
                self.pos += 2;
                Some(ItemKind::Querystring)
            }
            (Some('='), _) => {
                self.pos += 1;
                Some(ItemKind::Body)
            }
            (Some(':'), _) => {
                self.pos += 1;
                Some(ItemKind::Header)
            }
            _ => self.fail(),
        }
    }

    /// `'KEY:VALUE'`: key, operator and value inside one quote pair
    fn fully_quoted_item(&mut self, quote: char) -> Option<ConcatMutation> {
        self.attempt(|p| {
            let open = p.pos;
            p.pos += 1;
            let Some(key) = p.quoted_body(quote, |c| c == '=' || c == ':') else {
                return p.unterminated(open);
            };
            if key.is_empty() {
                return p.fail();
            }
            let kind = p.operator()?;
            let Some(value) = p.quoted_body(quote, |_| false) else {
                return p.unterminated(open);
            };
            p.literal(&quote.to_string())?;
            Some(ConcatMutation::Item { kind, key, value })
        })
    }

    /// `KEY:VALUE` or `KEY:'VALUE'`
    fn bare_key_item(&mut self) -> Option<ConcatMutation> {
        self.attempt(|p| {
            let key = p.unquoted(is_key_stop)?;
            if key.is_empty() {
                return p.fail();
            }
            let kind = p.operator()?;
            let value = p.value_word()?;
            Some(ConcatMutation::Item { kind, key, value })
        })
    }

    fn item_mutation(&mut self) -> Option<ConcatMutation> {
        match self.peek_quote() {
            Some(quote) => self.fully_quoted_item(quote),
            None => self.bare_key_item(),
        }
    }

    fn option_name(&mut self) -> Option<String> {
        if self.peek() != Some('-') {
            return self.fail();
        }
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '=' | '>' | '|' | '\'' | '"') {
                break;
            }
            name.push(c);
            self.pos += 1;
        }
        Some(name)
    }

    fn option_mutation(&mut self) -> Option<ConcatMutation> {
        self.attempt(|p| {
            let name = p.option_name()?;
            if is_flag_option(&name) {
                if !p.at_boundary() {
                    return p.fail();
                }
                return Some(ConcatMutation::Option { name, value: None });
            }
            if !is_value_option(&name) {
                return p.fail();
            }

            let value = if p.peek() == Some('=') {
                p.pos += 1;
                p.value_word()?
            } else {
                p.require_ws()?;
                p.path_word()?
            };
            Some(ConcatMutation::Option {
                name,
                value: Some(value),
            })
        })
    }

    fn concat_mutation(&mut self) -> Option<ConcatMutation> {
        self.attempt(|p| p.option_mutation())
            .or_else(|| self.attempt(|p| p.item_mutation()))
    }

    fn concat_mutations(&mut self) -> Vec<ConcatMutation> {
        let mut mutations = Vec::new();
        while let Some(m) = self.attempt(|p| {
            p.skip_ws();
            p.concat_mutation()
        }) {
            mutations.push(m);
        }
        mutations
    }

    fn cd(&mut self) -> Option<Mutation> {
        self.attempt(|p| {
            p.skip_ws();
            p.keyword("cd")?;
            p.require_ws()?;
            Some(Mutation::Cd(p.path_word()?))
        })
    }

    fn rm(&mut self) -> Option<Mutation> {
        self.attempt(|p| {
            p.skip_ws();
            p.keyword("rm")?;
            p.require_ws()?;
            if p.peek() == Some('*') {
                p.pos += 1;
                return if p.at_boundary() {
                    Some(Mutation::RmAll)
                } else {
                    p.fail()
                };
            }
            p.literal("-")?;
            let Some(target) = p.peek().and_then(RmTarget::from_flag) else {
                return p.fail();
            };
            p.pos += 1;
            p.require_ws()?;
            Some(Mutation::Rm(target, p.path_word()?))
        })
    }

    fn mutation(&mut self) -> Option<Mutation> {
        let mutations = self.concat_mutations();
        if !mutations.is_empty() {
            return Some(Mutation::Concat(mutations));
        }
        self.cd().or_else(|| self.rm())
    }

    // ---- immutations ------------------------------------------------------

    fn redirection(&mut self) -> Option<Redirection> {
        self.attempt(|p| {
            p.skip_ws();
            match (p.peek(), p.peek_at(1)) {
                (Some('>'), Some('>')) => {
                    p.pos += 2;
                    p.skip_ws();
                    Some(Redirection::Append(p.path_word()?))
                }
                (Some('>'), _) => {
                    p.pos += 1;
                    p.skip_ws();
                    Some(Redirection::Write(p.path_word()?))
                }
                (Some('|'), _) => {
                    p.pos += 1;
                    let rest: String = p.chars[p.pos..].iter().collect();
                    let command = rest.trim();
                    if command.is_empty() {
                        return p.fail();
                    }
                    p.pos = p.chars.len();
                    Some(Redirection::Pipe(command.to_string()))
                }
                _ => p.fail(),
            }
        })
    }

    fn url_path(&mut self) -> Option<Word> {
        self.attempt(|p| {
            p.skip_ws();
            let rest: String = p.chars[p.pos..].iter().take(8).collect::<String>().to_lowercase();
            let is_absolute = rest.starts_with("http://") || rest.starts_with("https://");
            if !is_absolute && p.lookahead(|q| q.concat_mutation()) {
                return p.fail();
            }
            p.path_word()
        })
    }

    /// Everything after the tool name or method
    fn request_line(&mut self, method: Option<String>, allow_method: bool) -> RequestLine {
        let method = if allow_method {
            self.attempt(|p| {
                p.require_ws()?;
                p.keyword_ci(HTTP_METHODS)
            })
        } else {
            method
        };
        let url = self.url_path();
        let mutations = self.concat_mutations();
        let redirection = self.redirection();
        RequestLine {
            method,
            url,
            mutations,
            redirection,
        }
    }

    fn preview(&mut self) -> Option<Immutation> {
        self.attempt(|p| {
            let tool = ["httpie", "curl"]
                .into_iter()
                .find_map(|name| p.keyword(name).and_then(|_| Tool::from_name(name)))?;
            Some(Immutation::Preview(tool, p.request_line(None, true)))
        })
    }

    fn action(&mut self) -> Option<Immutation> {
        self.attempt(|p| {
            let method = p.keyword_ci(HTTP_METHODS)?;
            Some(Immutation::Action(p.request_line(Some(method), false)))
        })
    }

    fn file_command(&mut self, name: &str) -> Option<Word> {
        self.attempt(|p| {
            p.keyword(name)?;
            p.require_ws()?;
            p.path_word()
        })
    }

    fn ls(&mut self) -> Option<Immutation> {
        self.attempt(|p| {
            p.keyword("ls")?;
            let path = p.attempt(|q| {
                q.require_ws()?;
                q.path_word()
            });
            Some(Immutation::Ls(path, p.redirection()))
        })
    }

    fn immutation(&mut self) -> Option<Immutation> {
        self.skip_ws();
        if self.at_eof() {
            return Some(Immutation::Noop);
        }

        if let Some(i) = self.preview().or_else(|| self.action()) {
            return Some(i);
        }
        if self.keyword("help").is_some() {
            return Some(Immutation::Help);
        }
        if self.keyword("exit").is_some() {
            return Some(Immutation::Exit);
        }
        if self.keyword("clear").is_some() {
            return Some(Immutation::Clear);
        }
        if self.keyword("env").is_some() {
            return Some(Immutation::Env(self.redirection()));
        }
        if let Some(ls) = self.ls() {
            return Some(ls);
        }
        if let Some(path) = self.file_command("source") {
            return Some(Immutation::Source(path));
        }
        if let Some(path) = self.file_command("exec") {
            return Some(Immutation::Exec(path));
        }
        self.fail()
    }

    fn command(&mut self) -> Option<Command> {
        if let Some(m) = self.attempt(|p| {
            let m = p.mutation()?;
            p.end()?;
            Some(m)
        }) {
            return Some(Command::Mutation(m));
        }

        self.attempt(|p| {
            let i = p.immutation()?;
            p.end()?;
            Some(Command::Immutation(i))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repl::commands::ast::WordPart;

    fn item(kind: ItemKind, key: &str, value: &str) -> ConcatMutation {
        ConcatMutation::Item {
            kind,
            key: Word::literal(key),
            value: Word::literal(value),
        }
    }

    fn concat(line: &str) -> Vec<ConcatMutation> {
        match parse(line) {
            Ok(Command::Mutation(Mutation::Concat(mutations))) => mutations,
            other => panic!("expected concat mutation for {line:?}, got {other:?}"),
        }
    }

    fn immutation(line: &str) -> Immutation {
        match parse(line) {
            Ok(Command::Immutation(i)) => i,
            other => panic!("expected immutation for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn parser_should_accept_every_quoting_style() {
        let expected = vec![item(ItemKind::Header, "Accept", "text/html")];
        assert_eq!(concat("Accept:text/html"), expected);
        assert_eq!(concat("'Accept:text/html'"), expected);
        assert_eq!(concat("\"Accept:text/html\""), expected);
        assert_eq!(concat("Accept:'text/html'"), expected);
        assert_eq!(concat("Accept:\"text/html\""), expected);
    }

    #[test]
    fn parser_should_distinguish_operators() {
        assert_eq!(
            concat("name==john name=alice X-Token:abc"),
            vec![
                item(ItemKind::Querystring, "name", "john"),
                item(ItemKind::Body, "name", "alice"),
                item(ItemKind::Header, "X-Token", "abc"),
            ]
        );
    }

    #[test]
    fn parser_should_decode_escapes() {
        assert_eq!(
            concat(r"'X-Name:John\'s Doe'"),
            vec![item(ItemKind::Header, "X-Name", "John's Doe")]
        );
        assert_eq!(
            concat(r"full\ name=John\ Doe"),
            vec![item(ItemKind::Body, "full name", "John Doe")]
        );
    }

    #[test]
    fn parser_should_allow_empty_unquoted_value() {
        assert_eq!(concat("name="), vec![item(ItemKind::Body, "name", "")]);
    }

    #[test]
    fn parser_should_parse_options() {
        assert_eq!(
            concat("--auth user:pass --form"),
            vec![
                ConcatMutation::Option {
                    name: "--auth".to_string(),
                    value: Some(Word::literal("user:pass")),
                },
                ConcatMutation::Option {
                    name: "--form".to_string(),
                    value: None,
                },
            ]
        );
        assert_eq!(
            concat("--style=default -j --stream"),
            vec![
                ConcatMutation::Option {
                    name: "--style".to_string(),
                    value: Some(Word::literal("default")),
                },
                ConcatMutation::Option {
                    name: "-j".to_string(),
                    value: None,
                },
                ConcatMutation::Option {
                    name: "--stream".to_string(),
                    value: None,
                },
            ]
        );
        assert_eq!(
            concat("-a 'john:1234 5678'"),
            vec![ConcatMutation::Option {
                name: "-a".to_string(),
                value: Some(Word::literal("john:1234 5678")),
            }]
        );
    }

    #[test]
    fn parser_should_treat_unknown_dash_key_as_item() {
        assert_eq!(concat("-x=1"), vec![item(ItemKind::Body, "-x", "1")]);
    }

    #[test]
    fn parser_should_reject_flag_with_value() {
        assert!(parse("--form=yes").is_err());
    }

    #[test]
    fn parser_should_capture_shell_substitution() {
        let mutations = concat("token:`cat token.txt`");
        let ConcatMutation::Item { value, .. } = &mutations[0] else {
            panic!("expected item");
        };
        assert_eq!(value.parts(), &[WordPart::Shell("cat token.txt".to_string())]);
    }

    #[test]
    fn parser_should_parse_cd_and_rm() {
        assert_eq!(
            parse("cd /api/users").ok(),
            Some(Command::Mutation(Mutation::Cd(Word::literal("/api/users"))))
        );
        assert_eq!(
            parse("rm -h Content-Type").ok(),
            Some(Command::Mutation(Mutation::Rm(
                RmTarget::Header,
                Word::literal("Content-Type")
            )))
        );
        assert_eq!(
            parse(r"rm -b family\ name").ok(),
            Some(Command::Mutation(Mutation::Rm(
                RmTarget::Body,
                Word::literal("family name")
            )))
        );
        assert_eq!(parse("rm *").ok(), Some(Command::Mutation(Mutation::RmAll)));
        assert!(parse("cd").is_err());
        assert!(parse("rm -x key").is_err());
    }

    #[test]
    fn parser_should_parse_actions_case_insensitively() {
        for line in ["get", "GET", "Get"] {
            assert_eq!(
                immutation(line),
                Immutation::Action(RequestLine {
                    method: Some("get".to_string()),
                    ..RequestLine::default()
                })
            );
        }
    }

    #[test]
    fn parser_should_parse_action_with_url_and_items() {
        assert_eq!(
            immutation("post /users name=alice > out.json"),
            Immutation::Action(RequestLine {
                method: Some("post".to_string()),
                url: Some(Word::literal("/users")),
                mutations: vec![item(ItemKind::Body, "name", "alice")],
                redirection: Some(Redirection::Write(Word::literal("out.json"))),
            })
        );
        assert_eq!(
            immutation("get https://example.com/api page==2"),
            Immutation::Action(RequestLine {
                method: Some("get".to_string()),
                url: Some(Word::literal("https://example.com/api")),
                mutations: vec![item(ItemKind::Querystring, "page", "2")],
                redirection: None,
            })
        );
    }

    #[test]
    fn parser_should_not_mistake_item_for_url() {
        assert_eq!(
            immutation("post page==1"),
            Immutation::Action(RequestLine {
                method: Some("post".to_string()),
                url: None,
                mutations: vec![item(ItemKind::Querystring, "page", "1")],
                redirection: None,
            })
        );
    }

    #[test]
    fn parser_should_parse_previews() {
        assert_eq!(
            immutation("httpie post"),
            Immutation::Preview(
                Tool::Httpie,
                RequestLine {
                    method: Some("post".to_string()),
                    ..RequestLine::default()
                }
            )
        );
        assert_eq!(
            immutation("httpie>>out.txt"),
            Immutation::Preview(
                Tool::Httpie,
                RequestLine {
                    redirection: Some(Redirection::Append(Word::literal("out.txt"))),
                    ..RequestLine::default()
                }
            )
        );
        assert_eq!(
            immutation("curl"),
            Immutation::Preview(Tool::Curl, RequestLine::default())
        );
    }

    #[test]
    fn parser_should_parse_redirection_filenames() {
        assert_eq!(
            immutation("env > 'my file.txt'"),
            Immutation::Env(Some(Redirection::Write(Word::literal("my file.txt"))))
        );
        assert_eq!(
            immutation(r"env >> my\ file.txt"),
            Immutation::Env(Some(Redirection::Append(Word::literal("my file.txt"))))
        );
        assert_eq!(
            immutation("env | grep page"),
            Immutation::Env(Some(Redirection::Pipe("grep page".to_string())))
        );
        assert!(parse("env |").is_err());
        assert!(parse("env >").is_err());
    }

    #[test]
    fn parser_should_parse_keywords() {
        assert_eq!(immutation("help"), Immutation::Help);
        assert_eq!(immutation("  exit  "), Immutation::Exit);
        assert_eq!(immutation("clear"), Immutation::Clear);
        assert_eq!(immutation(""), Immutation::Noop);
        assert_eq!(immutation("   "), Immutation::Noop);
        assert_eq!(
            immutation("source 'saved context.hp'"),
            Immutation::Source(Word::literal("saved context.hp"))
        );
        assert_eq!(
            immutation("exec ctx.hp"),
            Immutation::Exec(Word::literal("ctx.hp"))
        );
        assert_eq!(
            immutation("ls /users"),
            Immutation::Ls(Some(Word::literal("/users")), None)
        );
        assert_eq!(immutation("ls"), Immutation::Ls(None, None));
    }

    #[test]
    fn parser_should_reject_keyword_prefixes() {
        assert!(parse("helpme").is_err());
        assert!(parse("getx").is_err());
    }

    #[test]
    fn parser_should_report_snippet_of_failure() {
        let err = parse("name=alice 'broken").unwrap_err();
        match err {
            CommandError::Syntax { snippet, .. } => assert!(snippet.starts_with("'broken")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
