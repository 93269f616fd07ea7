//! Variable bindings and substitution, per spec.md §4.1.
//!
//! `Bindings` is threaded as an immutable value: every extension clones the
//! map and inserts, never mutates a binding in place, matching the
//! "immutable extension of σ" wording used throughout the unifier.

use kernel_core::{Term, TermError};
use std::collections::HashMap;

pub type Bindings = HashMap<String, Term>;

/// Depth cap for fully-resolving a chain of variable bindings. Spec
/// mandates `>= 50`; 64 leaves headroom without being needlessly large.
pub const SUBSTITUTION_DEPTH_CAP: usize = 64;

/// Returns a new `Bindings` with `var -> value` added, leaving `bindings`
/// untouched.
pub fn extend(bindings: &Bindings, var: impl Into<String>, value: Term) -> Bindings {
    let mut next = bindings.clone();
    next.insert(var.into(), value);
    next
}

/// Shallow substitution: replaces a bound variable with its one bound
/// value and does not chase further bindings inside that value.
pub fn shallow(term: &Term, bindings: &Bindings) -> Term {
    match term {
        Term::Var(name) => bindings.get(name).cloned().unwrap_or_else(|| term.clone()),
        Term::Lst(items) => Term::Lst(items.iter().map(|t| shallow(t, bindings)).collect()),
        other => other.clone(),
    }
}

/// Fully resolving substitution: recursively chases variable chains until
/// reaching a value with no further binding, erroring if the chain exceeds
/// [`SUBSTITUTION_DEPTH_CAP`].
pub fn fully(term: &Term, bindings: &Bindings) -> Result<Term, TermError> {
    fully_at_depth(term, bindings, 0)
}

fn fully_at_depth(term: &Term, bindings: &Bindings, depth: usize) -> Result<Term, TermError> {
    if depth > SUBSTITUTION_DEPTH_CAP {
        let var = match term {
            Term::Var(name) => name.clone(),
            _ => "?".to_string(),
        };
        return Err(TermError::SubstitutionDepthExceeded {
            var,
            cap: SUBSTITUTION_DEPTH_CAP,
        });
    }
    match term {
        Term::Var(name) => match bindings.get(name) {
            Some(bound) => fully_at_depth(bound, bindings, depth + 1),
            None => Ok(term.clone()),
        },
        Term::Lst(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(fully_at_depth(item, bindings, depth)?);
            }
            Ok(Term::Lst(out))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shallow_leaves_nested_bindings_unresolved() {
        let mut b = Bindings::new();
        b.insert("x".to_string(), Term::var("y"));
        b.insert("y".to_string(), Term::atom("done"));
        assert_eq!(shallow(&Term::var("x"), &b), Term::var("y"));
    }

    #[test]
    fn fully_chases_chains() {
        let mut b = Bindings::new();
        b.insert("x".to_string(), Term::var("y"));
        b.insert("y".to_string(), Term::atom("done"));
        assert_eq!(fully(&Term::var("x"), &b).unwrap(), Term::atom("done"));
    }

    #[test]
    fn fully_errors_on_cyclic_chain() {
        let mut b = Bindings::new();
        b.insert("x".to_string(), Term::var("y"));
        b.insert("y".to_string(), Term::var("x"));
        assert!(fully(&Term::var("x"), &b).is_err());
    }

    #[test]
    fn extend_does_not_mutate_original() {
        let base = Bindings::new();
        let extended = extend(&base, "x", Term::atom("a"));
        assert!(base.is_empty());
        assert_eq!(extended.get("x"), Some(&Term::atom("a")));
    }
}
