//! KIF-equivalent lexer.
//!
//! Grammar is much smaller than a general DSL: parens, `?`-prefixed
//! variables, quoted strings, numbers, and bare atoms; `;` starts a
//! line comment. Structure (a `Peekable<CharIndices>`-driven scanner
//! producing spanned tokens, in-band error tokens) follows
//! `caliber-dsl`'s lexer.

use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    Atom(String),
    Str(String),
    Num(f64),
    Var(String),
    Eof,
    /// Lexing failed at this token; carries a human-readable reason.
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some('(') => {
                self.advance();
                TokenKind::LParen
            }
            Some(')') => {
                self.advance();
                TokenKind::RParen
            }
            Some('"') => self.scan_string(),
            Some('?') => self.scan_var(),
            Some(c) if c == '-' && self.peek_second_is_digit() => self.scan_number(),
            Some(c) if c.is_ascii_digit() => self.scan_number(),
            Some(c) if is_atom_start(c) => self.scan_atom(),
            Some(c) => {
                self.advance();
                TokenKind::Error(format!("unexpected character '{}'", c))
            }
        };

        Token {
            kind,
            span: Span {
                start: start_pos,
                end: self.pos,
                line: start_line,
                column: start_col,
            },
        }
    }

    fn scan_atom(&mut self) -> TokenKind {
        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if is_atom_char(c) {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Atom(s)
    }

    fn scan_var(&mut self) -> TokenKind {
        self.advance(); // consume '?'
        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if is_atom_char(c) {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if s.is_empty() {
            TokenKind::Error("variable name missing after '?'".to_string())
        } else {
            TokenKind::Var(s)
        }
    }

    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.peek_char() {
                None => return TokenKind::Error("unterminated string literal".to_string()),
                Some('"') => {
                    self.advance();
                    return TokenKind::Str(s);
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('"') => {
                            s.push('"');
                            self.advance();
                        }
                        Some('\\') => {
                            s.push('\\');
                            self.advance();
                        }
                        Some('n') => {
                            s.push('\n');
                            self.advance();
                        }
                        Some('t') => {
                            s.push('\t');
                            self.advance();
                        }
                        Some(other) => {
                            s.push(other);
                            self.advance();
                        }
                        None => return TokenKind::Error("unterminated string literal".to_string()),
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;
        let mut buf = String::new();
        if self.peek_char() == Some('-') {
            buf.push('-');
            self.advance();
        }
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '.' {
                buf.push(c);
                self.advance();
            } else {
                break;
            }
        }
        match buf.parse::<f64>() {
            Ok(n) => TokenKind::Num(n),
            Err(_) => TokenKind::Error(format!("malformed number at byte {}", start)),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some(';') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_second_is_digit(&self) -> bool {
        let mut iter = self.chars.clone();
        iter.next();
        matches!(iter.peek(), Some((_, c)) if c.is_ascii_digit())
    }

    fn advance(&mut self) {
        if let Some((i, c)) = self.chars.next() {
            self.pos = i + c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

fn is_atom_start(c: char) -> bool {
    c.is_alphanumeric() || "+-*/<>=!_.".contains(c)
}

fn is_atom_char(c: char) -> bool {
    c.is_alphanumeric() || "+-*/<>=!_.".contains(c)
}
