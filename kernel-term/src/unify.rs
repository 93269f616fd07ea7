//! Robinson unification with occurs check, per spec.md §4.1.

use crate::subst::{self, Bindings};
use kernel_core::Term;

/// Unifies `x` and `y` under `sigma`, returning an extended binding map on
/// success or `None` on failure (structural mismatch, arity mismatch, or
/// occurs-check violation).
pub fn unify(x: &Term, y: &Term, sigma: &Bindings) -> Option<Bindings> {
    match (x, y) {
        (Term::Var(vx), Term::Var(vy)) if vx == vy => Some(sigma.clone()),
        (Term::Var(v), _) => bind_var(v, y, sigma),
        (_, Term::Var(v)) => bind_var(v, x, sigma),
        (Term::Atom(a), Term::Atom(b)) => (a == b).then(|| sigma.clone()),
        (Term::Str(a), Term::Str(b)) => (a == b).then(|| sigma.clone()),
        (Term::Num(a), Term::Num(b)) => (a == b).then(|| sigma.clone()),
        (Term::Lst(xs), Term::Lst(ys)) => unify_lists(xs, ys, sigma),
        _ => None,
    }
}

fn unify_lists(xs: &[Term], ys: &[Term], sigma: &Bindings) -> Option<Bindings> {
    if xs.len() != ys.len() {
        return None;
    }
    let mut current = sigma.clone();
    for (a, b) in xs.iter().zip(ys.iter()) {
        current = unify(a, b, &current)?;
    }
    Some(current)
}

/// Binds `var` to `value` under `sigma`: if `var` is already bound, unifies
/// its existing image with `value`; otherwise resolves `value` fully, runs
/// the occurs check against the resolved form, and extends `sigma`.
fn bind_var(var: &str, value: &Term, sigma: &Bindings) -> Option<Bindings> {
    if let Some(existing) = sigma.get(var) {
        let existing = existing.clone();
        return unify(&existing, value, sigma);
    }

    let resolved = subst::fully(value, sigma).ok()?;
    if occurs(var, &resolved) {
        return None;
    }
    Some(subst::extend(sigma, var, resolved))
}

fn occurs(var: &str, term: &Term) -> bool {
    term.free_variables().iter().any(|v| v == var)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unifies_identical_atoms() {
        let sigma = Bindings::new();
        assert!(unify(&Term::atom("a"), &Term::atom("a"), &sigma).is_some());
        assert!(unify(&Term::atom("a"), &Term::atom("b"), &sigma).is_none());
    }

    #[test]
    fn binds_variable_to_term() {
        let sigma = Bindings::new();
        let result = unify(&Term::var("x"), &Term::atom("alice"), &sigma).unwrap();
        assert_eq!(result.get("x"), Some(&Term::atom("alice")));
    }

    #[test]
    fn fails_occurs_check() {
        let sigma = Bindings::new();
        let cyclic = Term::op("f", [Term::var("x")]);
        assert!(unify(&Term::var("x"), &cyclic, &sigma).is_none());
    }

    #[test]
    fn unifies_lists_elementwise_at_equal_arity() {
        let sigma = Bindings::new();
        let a = Term::op("p", [Term::var("x"), Term::atom("b")]);
        let b = Term::op("p", [Term::atom("a"), Term::atom("b")]);
        let result = unify(&a, &b, &sigma).unwrap();
        assert_eq!(result.get("x"), Some(&Term::atom("a")));
    }

    #[test]
    fn fails_on_arity_mismatch() {
        let sigma = Bindings::new();
        let a = Term::op("p", [Term::atom("a")]);
        let b = Term::op("p", [Term::atom("a"), Term::atom("b")]);
        assert!(unify(&a, &b, &sigma).is_none());
    }

    #[test]
    fn reuses_existing_binding_image() {
        let mut sigma = Bindings::new();
        sigma.insert("x".to_string(), Term::atom("a"));
        assert!(unify(&Term::var("x"), &Term::atom("a"), &sigma).is_some());
        assert!(unify(&Term::var("x"), &Term::atom("b"), &sigma).is_none());
    }
}
