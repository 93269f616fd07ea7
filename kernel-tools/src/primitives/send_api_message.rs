//! `_SendApiMessage`: `(<assertionId>)`, per spec.md §4.4 — resolves an
//! outbound-channel assertion (`ApiResponse`, `DialogueRequest`, or
//! `Event`), converts it to the matching wire message, sends it, and
//! records a `SentApiResponse` marker so resending is a no-op (invariant
//! 9, at-most-once send). The marker name is historical (the tool
//! originally only handled `ApiResponse`); it now covers every outbound
//! assertion kind, keyed by assertion ID regardless of operator.

use super::fact;
use crate::registry::{Tool, ToolContext};
use async_trait::async_trait;
use kernel_api::{convert_api_response_to_message, convert_dialogue_request_to_message, convert_event_to_message};
use kernel_core::{Assertion, AssertionId, KbId, KernelResult, Term, ValidationError};

pub struct SendApiMessageTool;

#[async_trait]
impl Tool for SendApiMessageTool {
    fn name(&self) -> &str {
        "_SendApiMessage"
    }

    fn description(&self) -> &str {
        "sends an ApiResponse/DialogueRequest/Event assertion exactly once"
    }

    async fn execute(&self, params: &Term, ctx: &ToolContext) -> KernelResult<Term> {
        let id: AssertionId = params
            .as_lst()
            .and_then(|args| args.first())
            .and_then(Term::as_atom)
            .and_then(|a| a.parse().ok())
            .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "assertionId".to_string() })?;

        let already_sent = Term::op("SentApiResponse", [Term::atom(id.to_string())]);
        if !ctx.kb.query_assertions(&already_sent)?.is_empty() {
            return Ok(Term::atom("already-sent"));
        }

        let assertion = ctx.kb.get_assertion(id)?;
        let message = convert_outbound(&assertion)?;
        ctx.outbound.send(serde_json::to_value(&message).map_err(|e| {
            kernel_core::KernelFault::IndexInconsistency { location: "_SendApiMessage".to_string(), message: e.to_string() }
        })?);

        ctx.kb.save_assertion(fact(already_sent.clone(), KbId::system()))?;
        Ok(already_sent)
    }
}

fn convert_outbound(assertion: &Assertion) -> KernelResult<kernel_api::OutboundMessage> {
    match assertion.kif.operator() {
        Some("DialogueRequest") => convert_dialogue_request_to_message(assertion),
        Some("Event") => convert_event_to_message(assertion),
        _ => convert_api_response_to_message(assertion),
    }
}
