//! First pass of layout parsing: SAS setup text to tokens.
//!
//! The tokenizer knows little about statements. It skips whitespace,
//! `/* ... */` comments and `*`/`%*` comment statements, unescapes quoted
//! strings and records the line on which each token starts.

use crate::constants::CHARACTER_MARKER;
use crate::error::{ConvertError, Result};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    /// Digits kept as text so overflow is reported with the token's line
    Number(String),
    Str(String),
    Dash,
    Dollar,
    Dot,
    Equals,
    Semicolon,
    Other(char),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "'{}'", name),
            TokenKind::Number(digits) => write!(f, "'{}'", digits),
            TokenKind::Str(text) => write!(f, "string \"{}\"", text),
            TokenKind::Dash => f.write_str("'-'"),
            TokenKind::Dollar => f.write_str("'$'"),
            TokenKind::Dot => f.write_str("'.'"),
            TokenKind::Equals => f.write_str("'='"),
            TokenKind::Semicolon => f.write_str("';'"),
            TokenKind::Other(c) => write!(f, "'{}'", c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based line of the token's first character
    pub line: usize,
}

impl Token {
    /// Identifier text, if this token is an identifier
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

/// Split layout text into tokens
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    Lexer::new(text).run()
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    tokens: Vec<Token>,
    /// No token has been emitted since the last `;`
    at_statement_start: bool,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            tokens: Vec::new(),
            at_statement_start: true,
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        while let Some(c) = self.chars.next() {
            let line = self.line;
            let kind = match c {
                '\n' => {
                    self.line += 1;
                    continue;
                }
                c if c.is_whitespace() => continue,
                '/' if self.chars.peek() == Some(&'*') => {
                    self.chars.next();
                    self.skip_block_comment(line)?;
                    continue;
                }
                '*' if self.at_statement_start => {
                    self.skip_comment_statement();
                    continue;
                }
                '%' if self.at_statement_start && self.chars.peek() == Some(&'*') => {
                    self.chars.next();
                    self.skip_comment_statement();
                    continue;
                }
                '"' | '\'' => TokenKind::Str(self.read_string(c, line)?),
                c if c.is_alphabetic() || c == '_' => TokenKind::Ident(
                    self.take_while(c, |next| next.is_alphanumeric() || next == '_'),
                ),
                c if c.is_ascii_digit() => {
                    TokenKind::Number(self.take_while(c, |next| next.is_ascii_digit()))
                }
                '-' => TokenKind::Dash,
                c if c == CHARACTER_MARKER => TokenKind::Dollar,
                '.' => TokenKind::Dot,
                '=' => TokenKind::Equals,
                ';' => TokenKind::Semicolon,
                other => TokenKind::Other(other),
            };
            self.at_statement_start = kind == TokenKind::Semicolon;
            self.tokens.push(Token { kind, line });
        }
        Ok(self.tokens)
    }

    fn take_while(&mut self, first: char, accept: impl Fn(char) -> bool) -> String {
        let mut text = String::from(first);
        while let Some(&next) = self.chars.peek() {
            if !accept(next) {
                break;
            }
            text.push(next);
            self.chars.next();
        }
        text
    }

    /// Read up to the closing quote; a doubled quote stands for one quote character
    fn read_string(&mut self, quote: char, start_line: usize) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some(c) if c == quote => {
                    if self.chars.peek() == Some(&quote) {
                        self.chars.next();
                        text.push(quote);
                    } else {
                        return Ok(text);
                    }
                }
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    text.push(c);
                }
                None => {
                    return Err(ConvertError::schema_parse(
                        start_line,
                        "unterminated string literal",
                    ));
                }
            }
        }
    }

    /// Comment statements run to the next `;`; quotes inside them are plain text
    fn skip_comment_statement(&mut self) {
        for c in self.chars.by_ref() {
            match c {
                '\n' => self.line += 1,
                ';' => return,
                _ => {}
            }
        }
    }

    fn skip_block_comment(&mut self, start_line: usize) -> Result<()> {
        while let Some(c) = self.chars.next() {
            match c {
                '\n' => self.line += 1,
                '*' if self.chars.peek() == Some(&'/') => {
                    self.chars.next();
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(ConvertError::schema_parse(
            start_line,
            "unterminated block comment",
        ))
    }
}
