//! Single-rule term rewriting, per spec.md §4.1.

use crate::matching::match_term;
use crate::subst::{self, Bindings};
use kernel_core::Term;

/// Attempts `match(lhs, target)`; on success substitutes `rhs` with the
/// resulting bindings. On failure, recurses into `target`'s subterms.
/// Returns `None` if nothing in `target` rewrites.
pub fn rewrite(target: &Term, lhs: &Term, rhs: &Term) -> Option<Term> {
    if let Some(sigma) = match_term(lhs, target, &Bindings::new()) {
        return subst::fully(rhs, &sigma).ok();
    }

    if let Term::Lst(items) = target {
        let mut changed = false;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match rewrite(item, lhs, rhs) {
                Some(rewritten) => {
                    out.push(rewritten);
                    changed = true;
                }
                None => out.push(item.clone()),
            }
        }
        if changed {
            return Some(Term::Lst(out));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_at_top_level() {
        let lhs = Term::op("likes", [Term::var("x"), Term::atom("pizza")]);
        let rhs = Term::op("enjoys", [Term::var("x"), Term::atom("pizza")]);
        let target = Term::op("likes", [Term::atom("alice"), Term::atom("pizza")]);
        let rewritten = rewrite(&target, &lhs, &rhs).unwrap();
        assert_eq!(rewritten, Term::op("enjoys", [Term::atom("alice"), Term::atom("pizza")]));
    }

    #[test]
    fn rewrites_nested_subterm() {
        let lhs = Term::atom("old");
        let rhs = Term::atom("new");
        let target = Term::op("wrap", [Term::op("inner", [Term::atom("old")])]);
        let rewritten = rewrite(&target, &lhs, &rhs).unwrap();
        assert_eq!(rewritten, Term::op("wrap", [Term::op("inner", [Term::atom("new")])]));
    }

    #[test]
    fn returns_none_when_nothing_matches() {
        let lhs = Term::atom("absent");
        let rhs = Term::atom("new");
        let target = Term::op("p", [Term::atom("a")]);
        assert_eq!(rewrite(&target, &lhs, &rhs), None);
    }
}
