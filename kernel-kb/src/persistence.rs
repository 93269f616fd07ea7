//! Write-through persistence for notes, assertions, and rules.
//!
//! `Persistence` mirrors `caliber-storage::StorageTrait`'s shape (a
//! `Send + Sync` trait over `CaliberResult`, backed in tests by an
//! in-memory mock); `InMemoryPersistence` follows `MockStorage`'s
//! `Arc<RwLock<HashMap<Id, T>>>`-per-entity layout. `FilePersistence` adds
//! the write-through-to-disk behavior spec.md §4.2 requires: every public
//! mutation synchronously updates the snapshot file before returning.

use kernel_core::{AssertionId, KernelError, KernelResult, NotFoundError, Note, NoteId, Relationship, Rule, RuleId};
use std::collections::HashMap;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

pub trait Persistence: Send + Sync {
    fn save_assertion(&self, assertion: &kernel_core::Assertion) -> KernelResult<()>;
    fn get_assertion(&self, id: AssertionId) -> KernelResult<Option<kernel_core::Assertion>>;
    fn delete_assertion(&self, id: AssertionId) -> KernelResult<()>;
    fn all_assertions(&self) -> KernelResult<Vec<kernel_core::Assertion>>;

    fn save_rule(&self, rule: &Rule) -> KernelResult<()>;
    fn get_rule(&self, id: RuleId) -> KernelResult<Option<Rule>>;
    fn delete_rule(&self, id: RuleId) -> KernelResult<()>;
    fn all_rules(&self) -> KernelResult<Vec<Rule>>;

    fn save_note(&self, note: &Note) -> KernelResult<()>;
    fn get_note(&self, id: NoteId) -> KernelResult<Option<Note>>;
    fn delete_note(&self, id: NoteId) -> KernelResult<()>;
    fn all_notes(&self) -> KernelResult<Vec<Note>>;

    fn save_relationship(&self, note_id: NoteId, relationship: Relationship) -> KernelResult<()>;
    fn delete_relationship(&self, note_id: NoteId, target_id: NoteId) -> KernelResult<()>;

    fn clear(&self) -> KernelResult<()>;
}

/// In-memory mock, analogous to `caliber-storage::MockStorage`.
#[derive(Default)]
pub struct InMemoryPersistence {
    assertions: Arc<RwLock<HashMap<AssertionId, kernel_core::Assertion>>>,
    rules: Arc<RwLock<HashMap<RuleId, Rule>>>,
    notes: Arc<RwLock<HashMap<NoteId, Note>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for InMemoryPersistence {
    fn save_assertion(&self, assertion: &kernel_core::Assertion) -> KernelResult<()> {
        self.assertions.write().unwrap().insert(assertion.id, assertion.clone());
        Ok(())
    }

    fn get_assertion(&self, id: AssertionId) -> KernelResult<Option<kernel_core::Assertion>> {
        Ok(self.assertions.read().unwrap().get(&id).cloned())
    }

    fn delete_assertion(&self, id: AssertionId) -> KernelResult<()> {
        self.assertions
            .write()
            .unwrap()
            .remove(&id)
            .ok_or(NotFoundError::Assertion { id })?;
        Ok(())
    }

    fn all_assertions(&self) -> KernelResult<Vec<kernel_core::Assertion>> {
        Ok(self.assertions.read().unwrap().values().cloned().collect())
    }

    fn save_rule(&self, rule: &Rule) -> KernelResult<()> {
        self.rules.write().unwrap().insert(rule.id, rule.clone());
        Ok(())
    }

    fn get_rule(&self, id: RuleId) -> KernelResult<Option<Rule>> {
        Ok(self.rules.read().unwrap().get(&id).cloned())
    }

    fn delete_rule(&self, id: RuleId) -> KernelResult<()> {
        self.rules.write().unwrap().remove(&id).ok_or(NotFoundError::Rule { id })?;
        Ok(())
    }

    fn all_rules(&self) -> KernelResult<Vec<Rule>> {
        Ok(self.rules.read().unwrap().values().cloned().collect())
    }

    fn save_note(&self, note: &Note) -> KernelResult<()> {
        self.notes.write().unwrap().insert(note.id, note.clone());
        Ok(())
    }

    fn get_note(&self, id: NoteId) -> KernelResult<Option<Note>> {
        Ok(self.notes.read().unwrap().get(&id).cloned())
    }

    fn delete_note(&self, id: NoteId) -> KernelResult<()> {
        self.notes.write().unwrap().remove(&id).ok_or(NotFoundError::Note { id })?;
        Ok(())
    }

    fn all_notes(&self) -> KernelResult<Vec<Note>> {
        Ok(self.notes.read().unwrap().values().cloned().collect())
    }

    fn save_relationship(&self, note_id: NoteId, relationship: Relationship) -> KernelResult<()> {
        let mut notes = self.notes.write().unwrap();
        let note = notes.get_mut(&note_id).ok_or(NotFoundError::Note { id: note_id })?;
        note.relationships.retain(|r| r.target_id != relationship.target_id);
        note.relationships.push(relationship);
        Ok(())
    }

    fn delete_relationship(&self, note_id: NoteId, target_id: NoteId) -> KernelResult<()> {
        let mut notes = self.notes.write().unwrap();
        let note = notes.get_mut(&note_id).ok_or(NotFoundError::Note { id: note_id })?;
        note.relationships.retain(|r| r.target_id != target_id);
        Ok(())
    }

    fn clear(&self) -> KernelResult<()> {
        self.assertions.write().unwrap().clear();
        self.rules.write().unwrap().clear();
        self.notes.write().unwrap().clear();
        Ok(())
    }
}

#[derive(serde::Serialize, serde::Deserialize, Default)]
struct Snapshot {
    assertions: Vec<kernel_core::Assertion>,
    rules: Vec<Rule>,
    notes: Vec<Note>,
}

/// Write-through file-backed persistence: delegates to an
/// `InMemoryPersistence` for reads and indexed access, then rewrites the
/// whole snapshot file after every mutation. Simple whole-file rewrite
/// rather than a WAL/append log — acceptable at the scale a single
/// in-process kernel operates at.
pub struct FilePersistence {
    inner: InMemoryPersistence,
    path: PathBuf,
}

impl FilePersistence {
    /// Restores from `path` if it exists and is non-empty, otherwise starts
    /// from an empty knowledge base.
    pub fn restore(path: impl Into<PathBuf>) -> KernelResult<Self> {
        let path = path.into();
        let inner = InMemoryPersistence::new();
        if let Ok(contents) = std::fs::read_to_string(&path) {
            if !contents.trim().is_empty() {
                let snapshot: Snapshot = serde_json::from_str(&contents).map_err(|e| {
                    KernelError::Fault(kernel_core::KernelFault::IndexInconsistency {
                        location: "FilePersistence::restore".to_string(),
                        message: e.to_string(),
                    })
                })?;
                for a in snapshot.assertions {
                    inner.save_assertion(&a)?;
                }
                for r in snapshot.rules {
                    inner.save_rule(&r)?;
                }
                for n in snapshot.notes {
                    inner.save_note(&n)?;
                }
            }
        }
        Ok(Self { inner, path })
    }

    fn flush(&self) -> KernelResult<()> {
        let snapshot = Snapshot {
            assertions: self.inner.all_assertions()?,
            rules: self.inner.all_rules()?,
            notes: self.inner.all_notes()?,
        };
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| {
            KernelError::Fault(kernel_core::KernelFault::IndexInconsistency {
                location: "FilePersistence::flush".to_string(),
                message: e.to_string(),
            })
        })?;
        let mut file = std::fs::File::create(&self.path).map_err(|e| {
            KernelError::Fault(kernel_core::KernelFault::IndexInconsistency {
                location: "FilePersistence::flush".to_string(),
                message: e.to_string(),
            })
        })?;
        file.write_all(json.as_bytes()).map_err(|e| {
            KernelError::Fault(kernel_core::KernelFault::IndexInconsistency {
                location: "FilePersistence::flush".to_string(),
                message: e.to_string(),
            })
        })
    }
}

impl Persistence for FilePersistence {
    fn save_assertion(&self, assertion: &kernel_core::Assertion) -> KernelResult<()> {
        self.inner.save_assertion(assertion)?;
        self.flush()
    }

    fn get_assertion(&self, id: AssertionId) -> KernelResult<Option<kernel_core::Assertion>> {
        self.inner.get_assertion(id)
    }

    fn delete_assertion(&self, id: AssertionId) -> KernelResult<()> {
        self.inner.delete_assertion(id)?;
        self.flush()
    }

    fn all_assertions(&self) -> KernelResult<Vec<kernel_core::Assertion>> {
        self.inner.all_assertions()
    }

    fn save_rule(&self, rule: &Rule) -> KernelResult<()> {
        self.inner.save_rule(rule)?;
        self.flush()
    }

    fn get_rule(&self, id: RuleId) -> KernelResult<Option<Rule>> {
        self.inner.get_rule(id)
    }

    fn delete_rule(&self, id: RuleId) -> KernelResult<()> {
        self.inner.delete_rule(id)?;
        self.flush()
    }

    fn all_rules(&self) -> KernelResult<Vec<Rule>> {
        self.inner.all_rules()
    }

    fn save_note(&self, note: &Note) -> KernelResult<()> {
        self.inner.save_note(note)?;
        self.flush()
    }

    fn get_note(&self, id: NoteId) -> KernelResult<Option<Note>> {
        self.inner.get_note(id)
    }

    fn delete_note(&self, id: NoteId) -> KernelResult<()> {
        self.inner.delete_note(id)?;
        self.flush()
    }

    fn all_notes(&self) -> KernelResult<Vec<Note>> {
        self.inner.all_notes()
    }

    fn save_relationship(&self, note_id: NoteId, relationship: Relationship) -> KernelResult<()> {
        self.inner.save_relationship(note_id, relationship)?;
        self.flush()
    }

    fn delete_relationship(&self, note_id: NoteId, target_id: NoteId) -> KernelResult<()> {
        self.inner.delete_relationship(note_id, target_id)?;
        self.flush()
    }

    fn clear(&self) -> KernelResult<()> {
        self.inner.clear()?;
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_core::{AssertionType, KbId};

    fn sample(id: AssertionId) -> kernel_core::Assertion {
        kernel_core::Assertion {
            id,
            kif: kernel_core::Term::op("p", [kernel_core::Term::atom("a")]),
            priority: 1.0,
            timestamp: chrono::Utc::now(),
            source_note_id: None,
            justifications: Vec::new(),
            assertion_type: AssertionType::Ground,
            is_equality: false,
            is_oriented: false,
            is_negated: false,
            quantified_vars: Vec::new(),
            derivation_depth: 0,
            active: true,
            kb_id: KbId::global(),
        }
    }

    #[test]
    fn save_then_get_round_trips() {
        let store = InMemoryPersistence::new();
        let id = AssertionId::now_v7();
        store.save_assertion(&sample(id)).unwrap();
        assert!(store.get_assertion(id).unwrap().is_some());
    }

    #[test]
    fn delete_missing_assertion_errors() {
        let store = InMemoryPersistence::new();
        assert!(store.delete_assertion(AssertionId::now_v7()).is_err());
    }

    #[test]
    fn clear_empties_all_namespaces() {
        let store = InMemoryPersistence::new();
        store.save_assertion(&sample(AssertionId::now_v7())).unwrap();
        store.clear().unwrap();
        assert!(store.all_assertions().unwrap().is_empty());
    }

    #[test]
    fn file_persistence_restores_after_flush() {
        let dir = std::env::temp_dir().join(format!("kernel-kb-test-{}", uuid::Uuid::new_v4()));
        let id = AssertionId::now_v7();
        {
            let store = FilePersistence::restore(&dir).unwrap();
            store.save_assertion(&sample(id)).unwrap();
        }
        let restored = FilePersistence::restore(&dir).unwrap();
        assert!(restored.get_assertion(id).unwrap().is_some());
        let _ = std::fs::remove_file(&dir);
    }
}
