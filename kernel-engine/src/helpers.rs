//! Engine-internal term helpers, per spec.md §4.3: `Simplify` and
//! `Rename rule variables`. Neither is a primitive tool — both operate
//! purely on terms, not the KB, so they live beside the engine rather
//! than in `kernel-tools`.

use kernel_core::{Rule, Term};

const SIMPLIFY_DEPTH_CAP: usize = 32;

/// One-pass rewrite of double-negation (`(not (not X))` → `X`) and
/// distribution shapes (`(not (and A B))` → `(or (not A) (not B))`,
/// `(not (or A B))` → `(and (not A) (not B))`), iterated to a fixpoint or
/// [`SIMPLIFY_DEPTH_CAP`], whichever comes first.
pub fn simplify(term: &Term) -> Term {
    let mut current = term.clone();
    for _ in 0..SIMPLIFY_DEPTH_CAP {
        let next = simplify_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
    current
}

fn simplify_pass(term: &Term) -> Term {
    match term {
        Term::Lst(items) if term.is_negation() => {
            let inner = &items[1];
            match inner {
                // (not (not X)) -> X
                _ if inner.is_negation() => simplify_pass(&inner.args()[0]),
                Term::Lst(inner_items) if inner.operator() == Some("and") && inner_items.len() == 3 => {
                    Term::op(
                        "or",
                        [
                            Term::op("not", [simplify_pass(&inner_items[1])]),
                            Term::op("not", [simplify_pass(&inner_items[2])]),
                        ],
                    )
                }
                Term::Lst(inner_items) if inner.operator() == Some("or") && inner_items.len() == 3 => {
                    Term::op(
                        "and",
                        [
                            Term::op("not", [simplify_pass(&inner_items[1])]),
                            Term::op("not", [simplify_pass(&inner_items[2])]),
                        ],
                    )
                }
                _ => Term::op("not", [simplify_pass(inner)]),
            }
        }
        Term::Lst(items) => Term::Lst(items.iter().map(simplify_pass).collect()),
        other => other.clone(),
    }
}

/// Alpha-renames every variable in `rule`'s antecedent/consequent with a
/// depth-suffixed prefix (`?x` at depth 2 becomes `?x__2`), preventing
/// capture when the same rule is matched more than once during backward
/// chaining. `rule.form` is left untouched since it is the rule's
/// content-address and must stay stable across renamings.
pub fn rename_rule_variables(rule: &Rule, depth: u32) -> Rule {
    Rule {
        id: rule.id,
        form: rule.form.clone(),
        antecedent: rename_vars(&rule.antecedent, depth),
        consequent: rename_vars(&rule.consequent, depth),
        priority: rule.priority,
        derivation_depth: rule.derivation_depth,
        source_note_id: rule.source_note_id.clone(),
    }
}

fn rename_vars(term: &Term, depth: u32) -> Term {
    match term {
        Term::Var(name) => Term::Var(format!("{name}__{depth}")),
        Term::Lst(items) => Term::Lst(items.iter().map(|t| rename_vars(t, depth)).collect()),
        other => other.clone(),
    }
}
