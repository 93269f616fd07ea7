//! Trivial-assertion detection, per spec.md §4.1.
//!
//! A term is trivial if its effective term (unwrapping at most one leading
//! `not`, same as `Term::negation_body`) applies a recognized reflexive
//! predicate to two structurally identical arguments — both `(instance a
//! a)` and `(not (instance a a))` are filtered as vacuous noise, since
//! either way the assertion carries no information a reasoner didn't
//! already have from the predicate's reflexivity.

use kernel_core::Term;

const REFLEXIVE_PREDICATES: &[&str] = &["instance", "subclass", "equal"];

pub fn is_trivial(term: &Term) -> bool {
    let body = term.negation_body();
    let Some(op) = body.operator() else {
        return false;
    };
    if !REFLEXIVE_PREDICATES.contains(&op) {
        return false;
    }
    let args = body.args();
    args.len() == 2 && args[0] == args[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_reflexive_instance() {
        assert!(is_trivial(&Term::op("instance", [Term::atom("a"), Term::atom("a")])));
    }

    #[test]
    fn detects_negated_reflexive() {
        let t = Term::op("not", [Term::op("subclass", [Term::atom("a"), Term::atom("a")])]);
        assert!(is_trivial(&t));
    }

    #[test]
    fn non_reflexive_predicate_is_not_trivial() {
        assert!(!is_trivial(&Term::op("instance", [Term::atom("a"), Term::atom("b")])));
    }

    #[test]
    fn unrecognized_predicate_is_not_trivial() {
        assert!(!is_trivial(&Term::op("likes", [Term::atom("a"), Term::atom("a")])));
    }
}
