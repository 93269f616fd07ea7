//! Justification-based truth maintenance, per spec.md §4.2.
//!
//! `Dependents` is the inverse of the justification edges (`assertionId ->
//! set<assertionId>` that depend on it), kept as an ID-keyed edge map
//! rather than live references — the same shape `caliber-core::event`'s
//! `walk_ancestors`/upstream-signal propagation uses for its DAG.
//! `propagate` is the worklist runner: seed with changed assertions,
//! recompute each, and enqueue its dependents only when its own status
//! actually changed, with a "queued" set standing in for the visited set
//! that prevents the same assertion piling up in the queue twice at once.

use kernel_core::AssertionId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

#[derive(Default)]
pub struct Dependents {
    edges: RwLock<HashMap<AssertionId, HashSet<AssertionId>>>,
}

impl Dependents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `dependent` relies on each of `justifications`.
    pub fn add(&self, dependent: AssertionId, justifications: &[AssertionId]) {
        let mut edges = self.edges.write().unwrap();
        for j in justifications {
            edges.entry(*j).or_default().insert(dependent);
        }
    }

    /// Removes `dependent`'s reliance on each of `justifications`.
    pub fn remove(&self, dependent: AssertionId, justifications: &[AssertionId]) {
        let mut edges = self.edges.write().unwrap();
        for j in justifications {
            if let Some(set) = edges.get_mut(j) {
                set.remove(&dependent);
            }
        }
    }

    pub fn of(&self, id: AssertionId) -> Vec<AssertionId> {
        self.edges.read().unwrap().get(&id).map(|s| s.iter().copied().collect()).unwrap_or_default()
    }
}

/// `active ↔ justifications = ∅ ∨ ∀j: active(j)`.
pub fn compute_active(justifications: &[AssertionId], is_active: impl Fn(AssertionId) -> bool) -> bool {
    justifications.is_empty() || justifications.iter().all(|j| is_active(*j))
}

/// Worklist-based propagation. `recompute` is called once per dequeued
/// assertion and must return `true` if that assertion's active status
/// actually changed (triggering its dependents to be enqueued in turn).
pub fn propagate(seeds: impl IntoIterator<Item = AssertionId>, dependents: &Dependents, mut recompute: impl FnMut(AssertionId) -> bool) {
    let mut queue: VecDeque<AssertionId> = VecDeque::new();
    let mut queued: HashSet<AssertionId> = HashSet::new();
    for seed in seeds {
        if queued.insert(seed) {
            queue.push_back(seed);
        }
    }

    while let Some(id) = queue.pop_front() {
        queued.remove(&id);
        if recompute(id) {
            for dependent in dependents.of(id) {
                if queued.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_with_no_justifications_is_active() {
        assert!(compute_active(&[], |_| false));
    }

    #[test]
    fn active_requires_all_justifications_active() {
        let a = AssertionId::now_v7();
        let b = AssertionId::now_v7();
        assert!(!compute_active(&[a, b], |id| id == a));
        assert!(compute_active(&[a, b], |_| true));
    }

    #[test]
    fn propagate_visits_dependents_transitively() {
        let root = AssertionId::now_v7();
        let mid = AssertionId::now_v7();
        let leaf = AssertionId::now_v7();

        let dependents = Dependents::new();
        dependents.add(mid, &[root]);
        dependents.add(leaf, &[mid]);

        let mut visited = Vec::new();
        propagate([root], &dependents, |id| {
            visited.push(id);
            true
        });

        assert_eq!(visited, vec![root, mid, leaf]);
    }

    #[test]
    fn propagate_stops_when_recompute_reports_no_change() {
        let root = AssertionId::now_v7();
        let dependent = AssertionId::now_v7();
        let dependents = Dependents::new();
        dependents.add(dependent, &[root]);

        let mut visited = Vec::new();
        propagate([root], &dependents, |id| {
            visited.push(id);
            false
        });

        assert_eq!(visited, vec![root]);
    }
}
