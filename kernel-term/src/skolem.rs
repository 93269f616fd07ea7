//! Skolemization, per spec.md §4.1.

use crate::subst::{self, Bindings};
use kernel_core::Term;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generates unique skolem names across an engine's lifetime. `Default`
/// starts the counter at zero; clone a handle (it's cheap, backed by an
/// `Arc`-free atomic) wherever skolemization is invoked from multiple call
/// sites sharing one namespace.
pub struct SkolemGenerator {
    counter: AtomicU64,
}

impl Default for SkolemGenerator {
    fn default() -> Self {
        Self { counter: AtomicU64::new(0) }
    }
}

impl SkolemGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_name(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("sk{n}")
    }
}

/// Replaces every `(exists (?x ...) body)` in `term` with `body` under the
/// skolem substitution: a fresh skolem constant if no free variable of
/// `body` escapes the binder's own scope, otherwise a skolem function
/// applied to the escaping free variables in sorted (deterministic) order.
pub fn skolemize(term: &Term, gen: &SkolemGenerator) -> Term {
    if term.is_exists() {
        let args = term.args();
        let binder = &args[0];
        let body = &args[1];

        let bound_vars: Vec<String> = binder
            .as_lst()
            .map(|items| items.iter().filter_map(Term::as_var).map(String::from).collect())
            .unwrap_or_default();

        let mut escaping: Vec<String> =
            body.free_variables().into_iter().filter(|v| !bound_vars.contains(v)).collect();
        escaping.sort();

        let mut bindings = Bindings::new();
        for v in &bound_vars {
            let name = gen.next_name();
            let sk = if escaping.is_empty() {
                Term::atom(name)
            } else {
                Term::op(name, escaping.iter().map(|e| Term::var(e.clone())))
            };
            bindings.insert(v.clone(), sk);
        }

        let substituted = subst::shallow(body, &bindings);
        skolemize(&substituted, gen)
    } else {
        match term {
            Term::Lst(items) => Term::Lst(items.iter().map(|i| skolemize(i, gen)).collect()),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skolemizes_to_constant_when_no_free_vars_escape() {
        let gen = SkolemGenerator::new();
        let term = Term::op(
            "exists",
            [
                Term::lst(vec![Term::var("x")]),
                Term::op("likes", [Term::var("x"), Term::atom("bob")]),
            ],
        );
        let result = skolemize(&term, &gen);
        assert_eq!(result, Term::op("likes", [Term::atom("sk0"), Term::atom("bob")]));
    }

    #[test]
    fn skolemizes_to_function_when_free_vars_escape() {
        let gen = SkolemGenerator::new();
        let term = Term::op(
            "exists",
            [
                Term::lst(vec![Term::var("y")]),
                Term::op("likes", [Term::var("x"), Term::var("y")]),
            ],
        );
        let result = skolemize(&term, &gen);
        assert_eq!(
            result,
            Term::op("likes", [Term::var("x"), Term::op("sk0", [Term::var("x")])])
        );
    }

    #[test]
    fn names_are_unique_per_call() {
        let gen = SkolemGenerator::new();
        let a = gen.next_name();
        let b = gen.next_name();
        assert_ne!(a, b);
    }
}
