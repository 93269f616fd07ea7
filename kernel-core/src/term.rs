//! The term language: the universal data carrier for the kernel.
//!
//! A `Term` is exactly one of `Atom`, `Str`, `Num`, `Var`, or `Lst`. Terms are
//! immutable and structurally comparable; `Var` names are scoped per rule and
//! carry no global meaning. Parsing, printing, unification, substitution,
//! rewriting, and skolemization live in `kernel-term`, which depends on this
//! type; this crate only owns the sum type and its cheap structural
//! accessors, since `Assertion`/`Rule` need `Term` without needing to link
//! the parser.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A term: an atom, string, number, variable, or ordered list of subterms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Term {
    /// An interned symbolic name, e.g. `parent`.
    Atom(String),
    /// An opaque string literal.
    Str(String),
    /// A numeric literal.
    Num(f64),
    /// A variable, printed with a leading `?`. The name excludes the `?`.
    Var(String),
    /// An ordered, finite sequence of subterms. If the first element is an
    /// `Atom`, it is the list's operator.
    Lst(Vec<Term>),
}

impl Term {
    pub fn atom(name: impl Into<String>) -> Self {
        Term::Atom(name.into())
    }

    pub fn str(s: impl Into<String>) -> Self {
        Term::Str(s.into())
    }

    pub fn num(n: f64) -> Self {
        Term::Num(n)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    pub fn lst(items: impl Into<Vec<Term>>) -> Self {
        Term::Lst(items.into())
    }

    /// Convenience constructor for `(operator arg1 arg2 ...)`.
    pub fn op(operator: impl Into<String>, args: impl IntoIterator<Item = Term>) -> Self {
        let mut items = vec![Term::Atom(operator.into())];
        items.extend(args);
        Term::Lst(items)
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Term::Atom(_))
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn is_lst(&self) -> bool {
        matches!(self, Term::Lst(_))
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Term::Atom(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&str> {
        match self {
            Term::Var(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_lst(&self) -> Option<&[Term]> {
        match self {
            Term::Lst(items) => Some(items),
            _ => None,
        }
    }

    /// The operator atom of a list term: the first element, if it is an
    /// `Atom`. Ground terms (`Atom`/`Str`/`Num`/`Var`) have no operator.
    pub fn operator(&self) -> Option<&str> {
        match self {
            Term::Lst(items) => items.first().and_then(Term::as_atom),
            _ => None,
        }
    }

    /// Arguments following the operator, if this is an operator-led list.
    pub fn args(&self) -> &[Term] {
        match self {
            Term::Lst(items) if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }

    /// `true` if this term is `(not X)` for some `X`.
    pub fn is_negation(&self) -> bool {
        self.operator() == Some("not") && self.args().len() == 1
    }

    /// For `(not X)`, returns `X`; otherwise returns `self` unchanged. This
    /// is the "effective term" used for negated-vs-negated matching
    /// (spec.md §3: "A negated assertion's effective term is the body of
    /// `(not X)`").
    pub fn negation_body(&self) -> &Term {
        if self.is_negation() {
            &self.args()[0]
        } else {
            self
        }
    }

    /// `true` if this term is `(exists (?x ...) body)`.
    pub fn is_exists(&self) -> bool {
        self.operator() == Some("exists") && self.args().len() == 2
    }

    /// `true` if this term is `(forall (?x ...) body)`.
    pub fn is_forall(&self) -> bool {
        self.operator() == Some("forall") && self.args().len() == 2
    }

    /// `true` if this term is `(= a b)`.
    pub fn is_equality(&self) -> bool {
        self.operator() == Some("=") && self.args().len() == 2
    }

    /// Collects every free variable name occurring in this term, in
    /// first-occurrence order, deduplicated.
    pub fn free_variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Term::Var(name) => {
                if !out.iter().any(|n| n == name) {
                    out.push(name.clone());
                }
            }
            Term::Lst(items) => {
                for item in items {
                    item.collect_variables(out);
                }
            }
            _ => {}
        }
    }

    /// `true` if this term contains no variables anywhere in its structure.
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Var(_) => false,
            Term::Lst(items) => items.iter().all(Term::is_ground),
            _ => true,
        }
    }

    /// `true` if the atom at this term's operator position, or this term
    /// itself if it is an atom, looks like a skolem identifier (`sk` prefix).
    /// Used to classify assertions as `SKOLEMIZED` per spec.md §4.3.
    pub fn contains_skolem(&self) -> bool {
        match self {
            Term::Atom(name) => name.starts_with("sk"),
            Term::Lst(items) => items.iter().any(Term::contains_skolem),
            _ => false,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(name) => write!(f, "{}", name),
            Term::Str(s) => write!(f, "\"{}\"", escape_str(s)),
            Term::Num(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Term::Var(name) => write!(f, "?{}", name),
            Term::Lst(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn escape_str(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
