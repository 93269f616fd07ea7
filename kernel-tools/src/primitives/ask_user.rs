//! `_AskUser`: `(<prompt> <dialogueId> <kind> <options?> <ttlMs?>)`, per
//! spec.md §4.4. Asserting `DialogueRequest` into `api-outbox` is the
//! entire effect of this tool: nothing here blocks the control loop. The
//! "suspend until answered" behavior described in §4.4 is modeled by
//! whatever rule drove this tool staying inactive until a matching
//! `(DialogueResponse <dialogueId> ...)` assertion appears and makes its
//! antecedent satisfiable again — resolved as a design decision, since
//! spec.md describes the wait from the caller's perspective, not as a
//! literal blocking call inside a single tool invocation.
//!
//! When a `ttlMs` is given (spec.md §5), a `(SystemEvent <dueAt>
//! (DialogueTimeout <dialogueId>))` is also asserted — `SystemControl`'s
//! deferred-event phase fires it once `dueAt` passes, asserting
//! `(DialogueTimeout <dialogueId>)` for real.

use super::fact;
use crate::registry::{Tool, ToolContext};
use async_trait::async_trait;
use kernel_core::{KbId, KernelResult, Term, ValidationError};

pub struct AskUserTool;

#[async_trait]
impl Tool for AskUserTool {
    fn name(&self) -> &str {
        "_AskUser"
    }

    fn description(&self) -> &str {
        "asserts a DialogueRequest for the user-facing client to answer"
    }

    async fn execute(&self, params: &Term, ctx: &ToolContext) -> KernelResult<Term> {
        let args = params.as_lst().unwrap_or(&[]);
        let prompt = args
            .first()
            .cloned()
            .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "prompt".to_string() })?;
        let dialogue_id = args
            .get(1)
            .cloned()
            .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "dialogueId".to_string() })?;
        let kind = args.get(2).cloned().unwrap_or_else(|| Term::atom("text"));
        let options = args.get(3).cloned().unwrap_or_else(|| Term::lst(Vec::new()));
        let ttl_ms = match args.get(4) {
            Some(Term::Num(n)) => Some(*n),
            _ => None,
        };

        let request = Term::op("DialogueRequest", [dialogue_id.clone(), prompt, kind, options]);
        ctx.kb.save_assertion(fact(request.clone(), KbId::api_outbox()))?;

        if let Some(ttl_ms) = ttl_ms {
            let due_at = chrono::Utc::now().timestamp_millis() as f64 + ttl_ms;
            let timeout = Term::op("SystemEvent", [
                Term::num(due_at),
                Term::op("DialogueTimeout", [dialogue_id]),
            ]);
            ctx.kb.save_assertion(fact(timeout, KbId::system()))?;
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;
    use kernel_kb::{InMemoryPersistence, KnowledgeBase};
    use kernel_llm::MockLlmProvider;
    use std::sync::Arc;

    #[tokio::test]
    async fn asserts_a_dialogue_request() {
        let context = ToolContext {
            kb: Arc::new(KnowledgeBase::new(Arc::new(InMemoryPersistence::new())).unwrap()),
            llm: Arc::new(MockLlmProvider::new("")),
            outbound: Arc::new(NullSink),
        };
        let params = Term::lst(vec![
            Term::str("pick one"),
            Term::atom("d1"),
            Term::atom("choice"),
            Term::lst(vec![Term::str("yes"), Term::str("no")]),
        ]);
        let result = AskUserTool.execute(&params, &context).await.unwrap();
        assert_eq!(result.operator(), Some("DialogueRequest"));
        assert_eq!(result.args()[0], Term::atom("d1"));
    }

    #[tokio::test]
    async fn a_ttl_schedules_a_dialogue_timeout_system_event() {
        let kb = Arc::new(KnowledgeBase::new(Arc::new(InMemoryPersistence::new())).unwrap());
        let context = ToolContext { kb: kb.clone(), llm: Arc::new(MockLlmProvider::new("")), outbound: Arc::new(NullSink) };
        let params = Term::lst(vec![
            Term::str("pick one"),
            Term::atom("d2"),
            Term::atom("choice"),
            Term::lst(vec![Term::str("yes"), Term::str("no")]),
            Term::num(5000.0),
        ]);
        AskUserTool.execute(&params, &context).await.unwrap();

        let scheduled = kb
            .query_assertions(&Term::op("SystemEvent", [Term::var("dueAt"), Term::op("DialogueTimeout", [Term::atom("d2")])]))
            .unwrap();
        assert_eq!(scheduled.len(), 1);
    }

    #[tokio::test]
    async fn no_ttl_schedules_nothing() {
        let kb = Arc::new(KnowledgeBase::new(Arc::new(InMemoryPersistence::new())).unwrap());
        let context = ToolContext { kb: kb.clone(), llm: Arc::new(MockLlmProvider::new("")), outbound: Arc::new(NullSink) };
        let params = Term::lst(vec![Term::str("pick one"), Term::atom("d3")]);
        AskUserTool.execute(&params, &context).await.unwrap();

        let scheduled =
            kb.query_assertions(&Term::op("SystemEvent", [Term::var("dueAt"), Term::var("payload")])).unwrap();
        assert!(scheduled.is_empty());
    }
}
