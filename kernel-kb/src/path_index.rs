//! Discrimination-tree-style path index, per spec.md §4.2.
//!
//! Each indexed term is flattened to a prefix (Polish notation) token
//! sequence: a `Sym(name, arity)` token for every operator position,
//! `Const` for a leaf atom/string/number, and `Var` for a variable —
//! which, depending on query mode, may act as a wildcard matching an
//! entire aligned subtree rather than a single token. Querying walks both
//! sequences with a recursive subtree-skip, rather than a true trie
//! traversal with per-node pruning — a simplification over a textbook
//! discrimination tree (cross-checked for shape against
//! `examples/other_examples/...pagi-uac...knowledge-store.rs.rs`) that
//! keeps the three query semantics exact while trading index-build
//! complexity for an O(n) scan per query.
//!
//! Generic over the ID it's keyed by: `KnowledgeBase` keeps one instance
//! over `AssertionId` (effective terms, for `query_assertions`'s
//! *instances-of* candidate narrowing) and a second over `RuleId` (rule
//! antecedents, for `find_matching_rules`'s *generalizations-of*
//! narrowing) — the discrimination-tree structure and its three query
//! modes are the same either way, only the stored payload's identity type
//! changes.

use kernel_core::Term;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq)]
enum PathToken {
    Sym(String, usize),
    Const(ConstValue),
    Var,
}

#[derive(Debug, Clone, PartialEq)]
enum ConstValue {
    Str(String),
    Num(u64),
}

fn flatten(term: &Term) -> Vec<PathToken> {
    let mut out = Vec::new();
    flatten_into(term, &mut out);
    out
}

fn flatten_into(term: &Term, out: &mut Vec<PathToken>) {
    match term {
        Term::Atom(s) => out.push(PathToken::Const(ConstValue::Str(format!("atom:{s}")))),
        Term::Str(s) => out.push(PathToken::Const(ConstValue::Str(format!("str:{s}")))),
        Term::Num(n) => out.push(PathToken::Const(ConstValue::Num(n.to_bits()))),
        Term::Var(_) => out.push(PathToken::Var),
        Term::Lst(items) => {
            if let Some(op) = items.first().and_then(Term::as_atom) {
                out.push(PathToken::Sym(op.to_string(), items.len() - 1));
                for item in &items[1..] {
                    flatten_into(item, out);
                }
            } else {
                // A list not headed by an atom has no natural "symbol + arity"
                // token; fall back to treating its length as the symbol name.
                out.push(PathToken::Sym(format!("@list{}", items.len()), items.len()));
                for item in items {
                    flatten_into(item, out);
                }
            }
        }
    }
}

fn skip_subtree(tokens: &[PathToken], pos: usize) -> usize {
    match &tokens[pos] {
        PathToken::Sym(_, arity) => {
            let mut p = pos + 1;
            for _ in 0..*arity {
                p = skip_subtree(tokens, p);
            }
            p
        }
        _ => pos + 1,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Wildcard {
    /// `unifiable`: a `Var` on either side matches the other side's subtree.
    Either,
    /// `instances-of`: only the query side's `Var`s are wildcards.
    QueryOnly,
    /// `generalizations-of`: only the stored side's `Var`s are wildcards.
    StoredOnly,
}

fn consume_pair(
    qt: &[PathToken],
    qi: usize,
    st: &[PathToken],
    si: usize,
    mode: Wildcard,
) -> Option<(usize, usize)> {
    let q_wild = matches!(qt[qi], PathToken::Var) && matches!(mode, Wildcard::Either | Wildcard::QueryOnly);
    let s_wild = matches!(st[si], PathToken::Var) && matches!(mode, Wildcard::Either | Wildcard::StoredOnly);

    if q_wild {
        return Some((qi + 1, skip_subtree(st, si)));
    }
    if s_wild {
        return Some((skip_subtree(qt, qi), si + 1));
    }

    match (&qt[qi], &st[si]) {
        (PathToken::Sym(qn, qa), PathToken::Sym(sn, sa)) if qn == sn && qa == sa => {
            let mut qpos = qi + 1;
            let mut spos = si + 1;
            for _ in 0..*qa {
                let (nq, ns) = consume_pair(qt, qpos, st, spos, mode)?;
                qpos = nq;
                spos = ns;
            }
            Some((qpos, spos))
        }
        (PathToken::Const(a), PathToken::Const(b)) if a == b => Some((qi + 1, si + 1)),
        (PathToken::Var, PathToken::Var) => Some((qi + 1, si + 1)),
        _ => None,
    }
}

fn shape_matches(query_tokens: &[PathToken], stored_tokens: &[PathToken], mode: Wildcard) -> bool {
    if query_tokens.is_empty() || stored_tokens.is_empty() {
        return false;
    }
    match consume_pair(query_tokens, 0, stored_tokens, 0, mode) {
        Some((qn, sn)) => qn == query_tokens.len() && sn == stored_tokens.len(),
        None => false,
    }
}

pub struct PathIndex<Id> {
    entries: RwLock<HashMap<Id, Vec<PathToken>>>,
}

impl<Id> Default for PathIndex<Id> {
    fn default() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }
}

impl<Id: Copy + Eq + Hash> PathIndex<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: Id, term: &Term) {
        self.entries.write().unwrap().insert(id, flatten(term));
    }

    pub fn remove(&self, id: Id) {
        self.entries.write().unwrap().remove(&id);
    }

    /// Candidates whose structure could unify with `query` (variables on
    /// either side match any token on the other).
    pub fn unifiable(&self, query: &Term) -> HashSet<Id> {
        self.query(query, Wildcard::Either)
    }

    /// Candidates that are instances of `query` (variables on the query
    /// side match any token on the index side; constants must match).
    pub fn instances_of(&self, query: &Term) -> HashSet<Id> {
        self.query(query, Wildcard::QueryOnly)
    }

    /// Candidates that are more general than `query` (variables on the
    /// index side match any token on the query side).
    pub fn generalizations_of(&self, query: &Term) -> HashSet<Id> {
        self.query(query, Wildcard::StoredOnly)
    }

    fn query(&self, query: &Term, mode: Wildcard) -> HashSet<Id> {
        let query_tokens = flatten(query);
        self.entries
            .read()
            .unwrap()
            .iter()
            .filter(|(_, stored_tokens)| shape_matches(&query_tokens, stored_tokens, mode))
            .map(|(id, _)| *id)
            .collect()
    }
}
