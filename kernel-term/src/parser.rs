//! Recursive-descent parser from KIF tokens to `Term`.
//!
//! Structure follows `caliber-dsl`'s `Parser` (token vec + cursor, `current`/
//! `advance`/`expect`/`error` helpers, `Result<_, ParseError>` throughout).

use crate::lexer::{Lexer, Token, TokenKind};
use kernel_core::Term;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse error at line {}, column {}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parses exactly one top-level term, erroring on trailing tokens.
    pub fn parse_one(&mut self) -> Result<Term, ParseError> {
        let term = self.parse_term()?;
        if !self.is_at_end() {
            return Err(self.error("unexpected trailing input after term"));
        }
        Ok(term)
    }

    /// Parses every top-level term in the source (a KIF file is a
    /// whitespace-separated sequence of terms, not a single enclosing form).
    pub fn parse_all(&mut self) -> Result<Vec<Term>, ParseError> {
        let mut terms = Vec::new();
        while !self.is_at_end() {
            terms.push(self.parse_term()?);
        }
        Ok(terms)
    }

    fn parse_term(&mut self) -> Result<Term, ParseError> {
        match &self.current().kind {
            TokenKind::LParen => self.parse_list(),
            TokenKind::Atom(s) => {
                let s = s.clone();
                self.advance();
                Ok(Term::Atom(s))
            }
            TokenKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(Term::Str(s))
            }
            TokenKind::Num(n) => {
                let n = *n;
                self.advance();
                Ok(Term::Num(n))
            }
            TokenKind::Var(s) => {
                let s = s.clone();
                self.advance();
                Ok(Term::Var(s))
            }
            TokenKind::Error(msg) => Err(self.error(msg)),
            TokenKind::RParen => Err(self.error("unexpected ')'")),
            TokenKind::Eof => Err(self.error("unexpected end of input while parsing a term")),
        }
    }

    fn parse_list(&mut self) -> Result<Term, ParseError> {
        self.expect_lparen()?;
        let mut items = Vec::new();
        while !self.check_rparen() {
            if self.is_at_end() {
                return Err(self.error("unterminated list: missing ')'"));
            }
            items.push(self.parse_term()?);
        }
        self.advance(); // consume ')'
        Ok(Term::Lst(items))
    }

    fn expect_lparen(&mut self) -> Result<(), ParseError> {
        if matches!(self.current().kind, TokenKind::LParen) {
            self.advance();
            Ok(())
        } else {
            Err(self.error("expected '('"))
        }
    }

    fn check_rparen(&self) -> bool {
        matches!(self.current().kind, TokenKind::RParen)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn error(&self, msg: &str) -> ParseError {
        let span = self.current().span;
        ParseError {
            message: msg.to_string(),
            line: span.line,
            column: span.column,
        }
    }
}

/// Parses a single KIF term from text; the common entry point used
/// throughout the rest of the kernel.
pub fn parse_term(source: &str) -> Result<Term, ParseError> {
    let tokens = Lexer::new(source).tokenize();
    Parser::new(tokens).parse_one()
}

/// Parses every top-level term in a KIF document (used for bulk loading a
/// persisted knowledge base snapshot).
pub fn parse_all(source: &str) -> Result<Vec<Term>, ParseError> {
    let tokens = Lexer::new(source).tokenize();
    Parser::new(tokens).parse_all()
}
