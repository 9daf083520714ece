//! # Command Parse Tree
//!
//! Closed set of node types produced by the parser. The interpreter matches
//! on these exhaustively.

use std::fmt;

/// One piece of a word: literal text or a backtick shell fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    Text(String),
    Shell(String),
}

/// A key, value, path or filename whose text may include shell substitutions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Word {
    parts: Vec<WordPart>,
}

impl Word {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal(text: impl Into<String>) -> Self {
        let mut word = Self::new();
        word.push_str(&text.into());
        word
    }

    pub fn parts(&self) -> &[WordPart] {
        &self.parts
    }

    pub fn push_char(&mut self, c: char) {
        match self.parts.last_mut() {
            Some(WordPart::Text(text)) => text.push(c),
            _ => self.parts.push(WordPart::Text(c.to_string())),
        }
    }

    pub fn push_str(&mut self, s: &str) {
        for c in s.chars() {
            self.push_char(c);
        }
    }

    pub fn push_shell(&mut self, code: String) {
        self.parts.push(WordPart::Shell(code));
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn has_shell(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, WordPart::Shell(_)))
    }

    /// Literal text, when the word contains no shell substitution
    pub fn as_literal(&self) -> Option<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                WordPart::Text(text) => out.push_str(text),
                WordPart::Shell(_) => return None,
            }
        }
        Some(out)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                WordPart::Text(text) => write!(f, "{text}")?,
                WordPart::Shell(code) => write!(f, "`{code}`")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Httpie,
    Curl,
}

impl Tool {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "httpie" => Some(Tool::Httpie),
            "curl" => Some(Tool::Curl),
            _ => None,
        }
    }
}

/// Key/value mutation kinds, named by their operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// `KEY:VALUE`
    Header,
    /// `KEY==VALUE`
    Querystring,
    /// `KEY=VALUE`
    Body,
}

impl ItemKind {
    pub fn separator(self) -> &'static str {
        match self {
            ItemKind::Header => ":",
            ItemKind::Querystring => "==",
            ItemKind::Body => "=",
        }
    }
}

/// A mutation that may share a line with others
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConcatMutation {
    Option { name: String, value: Option<Word> },
    Item { kind: ItemKind, key: Word, value: Word },
}

/// Which map `rm` deletes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RmTarget {
    Header,
    Querystring,
    Body,
    Option,
}

impl RmTarget {
    pub fn from_flag(flag: char) -> Option<Self> {
        match flag {
            'h' => Some(RmTarget::Header),
            'q' => Some(RmTarget::Querystring),
            'b' => Some(RmTarget::Body),
            'o' => Some(RmTarget::Option),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Concat(Vec<ConcatMutation>),
    Cd(Word),
    Rm(RmTarget, Word),
    RmAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirection {
    Write(Word),
    Append(Word),
    /// Raw command text handed to the shell
    Pipe(String),
}

/// The optional request-shaping tail shared by preview and action lines
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestLine {
    pub method: Option<String>,
    pub url: Option<Word>,
    pub mutations: Vec<ConcatMutation>,
    pub redirection: Option<Redirection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Immutation {
    Noop,
    Preview(Tool, RequestLine),
    Action(RequestLine),
    Help,
    Exit,
    Clear,
    Env(Option<Redirection>),
    Ls(Option<Word>, Option<Redirection>),
    Source(Word),
    Exec(Word),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mutation(Mutation),
    Immutation(Immutation),
}
