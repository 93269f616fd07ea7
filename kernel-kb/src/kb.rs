//! `KnowledgeBase`: composes persistence, the predicate/path indices, and
//! the TMS into the operations spec.md §4.2 names.

use crate::path_index::PathIndex;
use crate::persistence::Persistence;
use crate::predicate_index::PredicateIndex;
use crate::tms::{self, Dependents};
use kernel_core::{
    Assertion, AssertionId, KbId, KernelResult, NotFoundError, Note, NoteId, Relationship, Rule, RuleId,
};
use kernel_term::{unify, Bindings};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub struct KnowledgeBase {
    persistence: Arc<dyn Persistence>,
    predicate_index: PredicateIndex,
    path_index: PathIndex<AssertionId>,
    rule_index: PathIndex<RuleId>,
    dependents: Dependents,
    capacities: RwLock<HashMap<KbId, usize>>,
    /// Eviction defaults to disabled (spec.md §9 Open Question, resolved in
    /// SPEC_FULL.md): capacity tracking is maintained regardless, but
    /// `evict_if_needed` is a no-op unless explicitly enabled.
    eviction_enabled: bool,
}

impl KnowledgeBase {
    /// Builds a fresh index/TMS state from whatever `persistence` already
    /// holds — the "on load, seed the queue with all root assertions" step
    /// from spec.md §4.2.
    pub fn new(persistence: Arc<dyn Persistence>) -> KernelResult<Self> {
        let kb = Self {
            persistence,
            predicate_index: PredicateIndex::new(),
            path_index: PathIndex::new(),
            rule_index: PathIndex::new(),
            dependents: Dependents::new(),
            capacities: RwLock::new(HashMap::new()),
            eviction_enabled: false,
        };
        kb.rebuild_indices()?;
        Ok(kb)
    }

    pub fn set_capacity(&self, kb_id: KbId, capacity: usize) {
        self.capacities.write().unwrap().insert(kb_id, capacity);
    }

    pub fn with_eviction_enabled(mut self, enabled: bool) -> Self {
        self.eviction_enabled = enabled;
        self
    }

    fn rebuild_indices(&self) -> KernelResult<()> {
        let assertions = self.persistence.all_assertions()?;
        for assertion in &assertions {
            self.predicate_index.insert(assertion.id, &assertion.kif);
            self.path_index.insert(assertion.id, assertion.effective_term());
            self.dependents.add(assertion.id, &assertion.justifications);
        }

        for rule in self.persistence.all_rules()? {
            self.rule_index.insert(rule.id, &rule.antecedent);
        }

        let roots: Vec<AssertionId> =
            assertions.iter().filter(|a| a.justifications.is_empty()).map(|a| a.id).collect();
        self.recompute_from(roots)
    }

    fn recompute_from(&self, seeds: Vec<AssertionId>) -> KernelResult<()> {
        let persistence = Arc::clone(&self.persistence);
        let mut error = None;
        tms::propagate(seeds, &self.dependents, |id| {
            let Ok(Some(mut assertion)) = persistence.get_assertion(id) else {
                return false;
            };
            let justifications = assertion.justifications.clone();
            let new_active = tms::compute_active(&justifications, |j| {
                persistence.get_assertion(j).ok().flatten().map(|a| a.active).unwrap_or(false)
            });
            if new_active == assertion.active {
                return false;
            }
            assertion.active = new_active;
            if let Err(e) = persistence.save_assertion(&assertion) {
                error.get_or_insert(e);
                return false;
            }
            true
        });
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Rejects trivial assertions per spec.md §4.1; otherwise persists,
    /// indexes, and propagates activation.
    pub fn save_assertion(&self, assertion: Assertion) -> KernelResult<Option<AssertionId>> {
        if kernel_term::is_trivial(&assertion.kif) {
            return Ok(None);
        }

        self.persistence.save_assertion(&assertion)?;
        self.predicate_index.insert(assertion.id, &assertion.kif);
        self.path_index.insert(assertion.id, assertion.effective_term());
        self.dependents.add(assertion.id, &assertion.justifications);
        self.recompute_from(vec![assertion.id])?;
        self.evict_if_needed(&assertion.kb_id)?;
        Ok(Some(assertion.id))
    }

    /// The deleted assertion's dependents are recomputed; absent any
    /// surviving justification they become inactive (spec.md §4.2).
    pub fn delete_assertion(&self, id: AssertionId) -> KernelResult<()> {
        let dependents = self.dependents.of(id);
        self.persistence.delete_assertion(id)?;
        self.predicate_index.remove(id);
        self.path_index.remove(id);
        self.recompute_from(dependents)
    }

    pub fn save_rule(&self, rule: Rule) -> KernelResult<()> {
        self.persistence.save_rule(&rule)?;
        self.rule_index.insert(rule.id, &rule.antecedent);
        Ok(())
    }

    pub fn delete_rule(&self, id: RuleId) -> KernelResult<()> {
        self.persistence.delete_rule(id)?;
        self.rule_index.remove(id);
        Ok(())
    }

    pub fn save_note(&self, note: Note) -> KernelResult<()> {
        self.persistence.save_note(&note)
    }

    pub fn delete_note(&self, id: NoteId) -> KernelResult<()> {
        self.persistence.delete_note(id)
    }

    pub fn save_relationship(&self, note_id: NoteId, relationship: Relationship) -> KernelResult<()> {
        self.persistence.save_relationship(note_id, relationship)
    }

    pub fn delete_relationship(&self, note_id: NoteId, target_id: NoteId) -> KernelResult<()> {
        self.persistence.delete_relationship(note_id, target_id)
    }

    pub fn clear(&self) -> KernelResult<()> {
        let rule_ids: Vec<RuleId> = self.persistence.all_rules().unwrap_or_default().into_iter().map(|r| r.id).collect();
        let assertion_ids: Vec<AssertionId> =
            self.persistence.all_assertions().unwrap_or_default().into_iter().map(|a| a.id).collect();

        self.persistence.clear()?;

        for id in rule_ids {
            self.rule_index.remove(id);
        }
        for id in assertion_ids {
            self.predicate_index.remove(id);
            self.path_index.remove(id);
        }
        Ok(())
    }

    pub fn get_note(&self, id: NoteId) -> KernelResult<Note> {
        self.persistence.get_note(id)?.ok_or_else(|| NotFoundError::Note { id }.into())
    }

    pub fn get_assertion(&self, id: AssertionId) -> KernelResult<Assertion> {
        self.persistence.get_assertion(id)?.ok_or_else(|| NotFoundError::Assertion { id }.into())
    }

    /// `queryAssertions(pattern)`, per spec.md §4.2's four-step algorithm.
    /// The predicate index gives step 2's candidate set (by top-level
    /// operator); the path index's *instances-of* query — "variables on
    /// the query side match any token on the index side; constants must
    /// match" (spec.md §4.2) — is exactly `pattern`'s relationship to a
    /// stored assertion, so it narrows the same candidate set a second,
    /// independent way before the final exact `unify` check in step 4.
    pub fn query_assertions(&self, pattern: &kernel_core::Term) -> KernelResult<Vec<Assertion>> {
        let want_negated = pattern.is_negation();
        let body = pattern.negation_body();

        let Some(operator) = body.operator() else {
            // No operator to index on: the path index's instances-of query
            // still narrows the scan (a bare var matches every entry, as
            // the full table scan would), so this never silently returns
            // nothing.
            return self.scan_all(body, want_negated);
        };

        let predicate_candidates = self.predicate_index.candidates(operator);
        let path_candidates = self.path_index.instances_of(body);
        let mut out = Vec::new();
        for id in predicate_candidates.intersection(&path_candidates) {
            let Some(assertion) = self.persistence.get_assertion(*id)? else {
                continue;
            };
            if !assertion.active || assertion.is_negated != want_negated {
                continue;
            }
            if unify(body, assertion.effective_term(), &Bindings::new()).is_some() {
                out.push(assertion);
            }
        }
        Ok(out)
    }

    fn scan_all(&self, body: &kernel_core::Term, want_negated: bool) -> KernelResult<Vec<Assertion>> {
        let mut out = Vec::new();
        for id in self.path_index.instances_of(body) {
            let Some(assertion) = self.persistence.get_assertion(id)? else {
                continue;
            };
            if !assertion.active || assertion.is_negated != want_negated {
                continue;
            }
            if unify(body, assertion.effective_term(), &Bindings::new()).is_some() {
                out.push(assertion);
            }
        }
        Ok(out)
    }

    /// `findMatchingRules(term)`: rules whose antecedent unifies with
    /// `term`, alongside the extracted bindings. The rule path index's
    /// *generalizations-of* query — "candidates that are more general
    /// than a query term" (spec.md §4.2) — is exactly a rule antecedent's
    /// relationship to an incoming ground(ish) `term`, so it narrows the
    /// rule set before the exact `unify` that extracts bindings.
    pub fn find_matching_rules(&self, term: &kernel_core::Term) -> KernelResult<Vec<(Rule, Bindings)>> {
        let mut out = Vec::new();
        for id in self.rule_index.generalizations_of(term) {
            let Some(rule) = self.persistence.get_rule(id)? else {
                continue;
            };
            if let Some(sigma) = unify(&rule.antecedent, term, &Bindings::new()) {
                out.push((rule, sigma));
            }
        }
        Ok(out)
    }

    /// Evicts the lowest-priority inactive assertion first, then the
    /// lowest-priority active leaf (no dependents), until `kb_id` is back
    /// under capacity. No-op unless eviction was explicitly enabled.
    fn evict_if_needed(&self, kb_id: &KbId) -> KernelResult<()> {
        if !self.eviction_enabled {
            return Ok(());
        }
        let Some(&capacity) = self.capacities.read().unwrap().get(kb_id) else {
            return Ok(());
        };

        loop {
            let members: Vec<Assertion> = self
                .persistence
                .all_assertions()?
                .into_iter()
                .filter(|a| &a.kb_id == kb_id)
                .collect();
            if members.len() <= capacity {
                return Ok(());
            }

            let victim = members
                .iter()
                .filter(|a| !a.active)
                .min_by(|a, b| a.priority.total_cmp(&b.priority))
                .or_else(|| {
                    members
                        .iter()
                        .filter(|a| self.dependents.of(a.id).is_empty())
                        .min_by(|a, b| a.priority.total_cmp(&b.priority))
                });

            match victim {
                Some(victim) => self.delete_assertion(victim.id)?,
                None => return Ok(()),
            }
        }
    }
}
