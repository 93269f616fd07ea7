//! One-sided pattern matching, per spec.md §4.1.
//!
//! Only variables occurring in `pattern` are bound; `term` is treated as
//! ground with respect to binding, even if it syntactically contains
//! variables. Used for rule-antecedent matching and rewrite.

use crate::subst::Bindings;
use kernel_core::Term;

pub fn match_term(pattern: &Term, term: &Term, sigma: &Bindings) -> Option<Bindings> {
    match pattern {
        Term::Var(v) => match sigma.get(v) {
            Some(bound) => (bound == term).then(|| sigma.clone()),
            None => {
                let mut next = sigma.clone();
                next.insert(v.clone(), term.clone());
                Some(next)
            }
        },
        Term::Atom(a) => match term {
            Term::Atom(b) if a == b => Some(sigma.clone()),
            _ => None,
        },
        Term::Str(a) => match term {
            Term::Str(b) if a == b => Some(sigma.clone()),
            _ => None,
        },
        Term::Num(a) => match term {
            Term::Num(b) if a == b => Some(sigma.clone()),
            _ => None,
        },
        Term::Lst(ps) => match term {
            Term::Lst(ts) if ps.len() == ts.len() => {
                let mut current = sigma.clone();
                for (p, t) in ps.iter().zip(ts.iter()) {
                    current = match_term(p, t, &current)?;
                }
                Some(current)
            }
            _ => None,
        },
    }
}
