//! `_CallLLM`: `(<prompt> <conversationId?> <options?>)`, per spec.md
//! §4.4 — invokes the LLM service, asserting `LLMResult`/`LLMError`.

use super::fact;
use crate::registry::{Tool, ToolContext};
use async_trait::async_trait;
use kernel_core::{KbId, KernelResult, Term, ValidationError};
use kernel_llm::ChatMessage;

pub struct CallLlmTool;

#[async_trait]
impl Tool for CallLlmTool {
    fn name(&self) -> &str {
        "_CallLLM"
    }

    fn description(&self) -> &str {
        "invokes the configured LLM and asserts LLMResult/LLMError"
    }

    async fn execute(&self, params: &Term, ctx: &ToolContext) -> KernelResult<Term> {
        let args = params.as_lst().unwrap_or(&[]);
        let prompt = args
            .first()
            .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "prompt".to_string() })?;
        let prompt_text = match prompt {
            Term::Str(s) => s.clone(),
            Term::Atom(s) => s.clone(),
            other => other.to_string(),
        };
        let conversation_id = args.get(1).and_then(Term::as_atom).map(Term::atom).unwrap_or_else(|| Term::lst(Vec::new()));

        let result_term = match ctx.llm.chat(&[ChatMessage::user(prompt_text)]).await {
            Ok(reply) => Term::op("LLMResult", [conversation_id, Term::str(reply.content)]),
            Err(e) => Term::op("LLMError", [conversation_id, Term::str(e.to_string())]),
        };

        ctx.kb.save_assertion(fact(result_term.clone(), KbId::system()))?;
        Ok(result_term)
    }
}
