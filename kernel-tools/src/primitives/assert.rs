//! `_Assert`: `(<kifTerm> <priority?> <sourceNoteId?>)`, per spec.md §4.4 —
//! equivalent to the engine's `Assert` action, callable from rules that
//! need a runtime-computed shape.

use super::{fact, parse_note_id};
use crate::registry::{Tool, ToolContext};
use async_trait::async_trait;
use kernel_core::{AssertionType, KbId, KernelResult, Term, ValidationError};

pub struct AssertTool;

#[async_trait]
impl Tool for AssertTool {
    fn name(&self) -> &str {
        "_Assert"
    }

    fn description(&self) -> &str {
        "asserts a runtime-computed KIF term into the knowledge base"
    }

    async fn execute(&self, params: &Term, ctx: &ToolContext) -> KernelResult<Term> {
        let args = params.as_lst().unwrap_or(&[]);
        let kif = args
            .first()
            .cloned()
            .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "kifTerm".to_string() })?;
        let priority = args.get(1).and_then(kif_num).unwrap_or(0.5);
        let kb_id = args
            .get(2)
            .and_then(Term::as_atom)
            .and_then(parse_note_id)
            .map(|id| KbId::for_note(&id))
            .unwrap_or_else(KbId::global);

        if kernel_term::is_trivial(&kif) {
            return Ok(Term::atom("trivial-rejected"));
        }

        let mut assertion = fact(kif, kb_id);
        assertion.priority = priority;
        assertion.assertion_type = AssertionType::classify(&assertion.kif);
        assertion.is_negated = assertion.kif.is_negation();
        assertion.is_equality = assertion.kif.is_equality();

        match ctx.kb.save_assertion(assertion)? {
            Some(id) => Ok(Term::op("Asserted", [Term::atom(id.to_string())])),
            None => Ok(Term::atom("trivial-rejected")),
        }
    }
}

fn kif_num(term: &Term) -> Option<f64> {
    match term {
        Term::Num(n) => Some(*n),
        _ => None,
    }
}
