//! Predicate index: `Atom -> set<assertionId>`, per spec.md §4.2.
//!
//! Keyed on the operator atom of every referenced subterm, recursively —
//! not just the top-level operator — so a query on any nested predicate
//! still finds the assertion. Shape follows `caliber-storage`'s
//! `Arc<RwLock<HashMap<_, _>>>` indexed-lookup convention.

use kernel_core::{AssertionId, Term};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

#[derive(Default)]
pub struct PredicateIndex {
    by_operator: RwLock<HashMap<String, HashSet<AssertionId>>>,
    operators_by_id: RwLock<HashMap<AssertionId, HashSet<String>>>,
}

impl PredicateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: AssertionId, term: &Term) {
        let mut operators = HashSet::new();
        gather_operators(term, &mut operators);

        let mut by_operator = self.by_operator.write().unwrap();
        for op in &operators {
            by_operator.entry(op.clone()).or_default().insert(id);
        }
        drop(by_operator);

        self.operators_by_id.write().unwrap().insert(id, operators);
    }

    pub fn remove(&self, id: AssertionId) {
        let Some(operators) = self.operators_by_id.write().unwrap().remove(&id) else {
            return;
        };
        let mut by_operator = self.by_operator.write().unwrap();
        for op in operators {
            if let Some(set) = by_operator.get_mut(&op) {
                set.remove(&id);
                if set.is_empty() {
                    by_operator.remove(&op);
                }
            }
        }
    }

    pub fn candidates(&self, operator: &str) -> HashSet<AssertionId> {
        self.by_operator.read().unwrap().get(operator).cloned().unwrap_or_default()
    }
}

fn gather_operators(term: &Term, out: &mut HashSet<String>) {
    if let Term::Lst(items) = term {
        if let Some(op) = items.first().and_then(Term::as_atom) {
            out.insert(op.to_string());
        }
        for item in items {
            gather_operators(item, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_nested_operators() {
        let index = PredicateIndex::new();
        let id = AssertionId::now_v7();
        let term = Term::op("and", [Term::op("p", [Term::atom("a")]), Term::op("q", [Term::atom("b")])]);
        index.insert(id, &term);
        assert!(index.candidates("and").contains(&id));
        assert!(index.candidates("p").contains(&id));
        assert!(index.candidates("q").contains(&id));
    }

    #[test]
    fn remove_clears_all_buckets() {
        let index = PredicateIndex::new();
        let id = AssertionId::now_v7();
        let term = Term::op("p", [Term::atom("a")]);
        index.insert(id, &term);
        index.remove(id);
        assert!(index.candidates("p").is_empty());
    }
}
