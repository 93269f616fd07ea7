//! The persisted entity model: Note, Assertion, Rule, Relationship.
//!
//! Field/derive conventions follow `caliber-core::entities` (the teacher):
//! every entity derives `Debug, Clone, PartialEq, Serialize, Deserialize`
//! and, behind the `openapi` feature, `utoipa::ToSchema`.

use crate::identity::{AssertionId, KbId, NoteId, RuleId};
use crate::term::Term;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An assertion's derivation shape, per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AssertionType {
    /// No free variables.
    Ground,
    /// Universally quantified (`forall`).
    Universal,
    /// Contains skolem constants/functions introduced by skolemization.
    Skolemized,
}

impl AssertionType {
    /// Classifies a term's assertion type by inspecting its shape, per the
    /// `Assert` action's "type derived" rule in spec.md §4.3.
    pub fn classify(kif: &Term) -> Self {
        if kif.contains_skolem() {
            AssertionType::Skolemized
        } else if kif.is_forall() {
            AssertionType::Universal
        } else if kif.is_ground() {
            AssertionType::Ground
        } else {
            // Free variables with no quantifier and no skolem marker: the
            // spec does not name this case explicitly; treated as ground
            // for query purposes since it carries no quantification.
            AssertionType::Ground
        }
    }
}

/// A stored, possibly-justified fact. See spec.md §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Assertion {
    pub id: AssertionId,
    /// The fact itself; always a `Lst` term (the KIF form).
    pub kif: Term,
    /// Used for eviction ordering and `Assert` priority decay.
    pub priority: f64,
    pub timestamp: DateTime<Utc>,
    pub source_note_id: Option<NoteId>,
    /// Support set: the assertions/rules this assertion's activation
    /// depends on. Empty means this is a root (always active).
    pub justifications: Vec<AssertionId>,
    pub assertion_type: AssertionType,
    pub is_equality: bool,
    pub is_oriented: bool,
    pub is_negated: bool,
    /// Quantified variable names, populated for `Universal` assertions.
    pub quantified_vars: Vec<String>,
    /// Hops from an externally supplied input term.
    pub derivation_depth: u32,
    /// Derived predicate: `justifications = ∅ ∨ ∀j: active(j)`.
    pub active: bool,
    pub kb_id: KbId,
}

impl Assertion {
    /// The term actually used for matching: the body of `(not X)` when
    /// negated, `kif` otherwise (spec.md §3).
    pub fn effective_term(&self) -> &Term {
        self.kif.negation_body()
    }
}

/// A term-pattern antecedent plus an action consequent. See spec.md §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Rule {
    pub id: RuleId,
    /// The original `(=> antecedent consequent)` term this rule was parsed
    /// from; rules are content-addressable by `form` equality.
    pub form: Term,
    pub antecedent: Term,
    /// An action term: operator in `{Assert, Retract, ExecuteTool}`.
    pub consequent: Term,
    pub priority: f64,
    pub derivation_depth: u32,
    pub source_note_id: Option<NoteId>,
}

/// A typed directed edge from a `Note` to another note. Stored inline on
/// the source note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Relationship {
    pub target_id: NoteId,
    /// Ontology-defined relationship type (e.g. `"references"`, `"parentOf"`).
    pub relationship_type: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// The universal note entity. See spec.md §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Note {
    pub id: NoteId,
    /// Ontology-defined type tag (e.g. `"task"`, `"configuration"`).
    pub note_type: String,
    pub title: String,
    pub content: String,
    pub status: String,
    pub priority: f64,
    pub color: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub relationships: Vec<Relationship>,
    /// Term IDs (assertions/rules) associated with this note.
    pub associated_term_ids: Vec<AssertionId>,
}

impl Note {
    pub fn new(note_type: impl Into<String>, title: impl Into<String>) -> Self {
        Note {
            id: NoteId::now_v7(),
            note_type: note_type.into(),
            title: title.into(),
            content: String::new(),
            status: "active".to_string(),
            priority: 0.5,
            color: None,
            updated_at: Utc::now(),
            metadata: HashMap::new(),
            relationships: Vec::new(),
            associated_term_ids: Vec::new(),
        }
    }
}
