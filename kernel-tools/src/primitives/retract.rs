//! `_Retract`: `(<kifTerm|assertionId>)`, per spec.md §4.4 — equivalent
//! to the engine's `Retract` action.

use crate::registry::{Tool, ToolContext};
use async_trait::async_trait;
use kernel_core::{AssertionId, KernelResult, Term, ValidationError};

pub struct RetractTool;

#[async_trait]
impl Tool for RetractTool {
    fn name(&self) -> &str {
        "_Retract"
    }

    fn description(&self) -> &str {
        "retracts an assertion identified by KIF term or assertion ID"
    }

    async fn execute(&self, params: &Term, ctx: &ToolContext) -> KernelResult<Term> {
        let target = params
            .as_lst()
            .and_then(|args| args.first())
            .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "target".to_string() })?;

        let id = match target.as_atom().and_then(|a| a.parse::<AssertionId>().ok()) {
            Some(id) => Some(id),
            None => ctx.kb.query_assertions(target)?.first().map(|a| a.id),
        };

        match id {
            Some(id) => {
                ctx.kb.delete_assertion(id)?;
                Ok(Term::op("Retracted", [Term::atom(id.to_string())]))
            }
            None => Ok(Term::atom("not-found")),
        }
    }
}
