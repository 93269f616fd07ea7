//! kernel-term - Parsing, Printing, Unification, Substitution
//!
//! Everything spec.md §4.1 names: the KIF-equivalent lexer/parser/printer,
//! Robinson unification, one-sided matching, substitution (shallow and
//! fully-resolving), rewrite, skolemization, and trivial-assertion
//! detection. Depends on `kernel-core` for the `Term` type itself.

mod lexer;
mod matching;
mod parser;
mod printer;
mod rewrite;
mod skolem;
mod subst;
mod trivial;
mod unify;

pub use lexer::{Lexer, Span, Token, TokenKind};
pub use matching::match_term;
pub use parser::{parse_all, parse_term, ParseError, Parser};
pub use printer::{print_document, print_term};
pub use rewrite::rewrite;
pub use skolem::{skolemize, SkolemGenerator};
pub use subst::{extend, fully, shallow, Bindings, SUBSTITUTION_DEPTH_CAP};
pub use trivial::is_trivial;
pub use unify::unify;
