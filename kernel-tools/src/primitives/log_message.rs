//! `_LogMessage`: `(<text> <level?>)`, per spec.md §4.4 — emits a
//! `tracing` event and asserts a `LogMessage` record into `system`.

use super::fact;
use crate::registry::{Tool, ToolContext};
use async_trait::async_trait;
use chrono::Utc;
use kernel_core::{KbId, KernelResult, Term, ValidationError};

pub struct LogMessageTool;

#[async_trait]
impl Tool for LogMessageTool {
    fn name(&self) -> &str {
        "_LogMessage"
    }

    fn description(&self) -> &str {
        "logs a message via tracing and records it in the system KB"
    }

    async fn execute(&self, params: &Term, ctx: &ToolContext) -> KernelResult<Term> {
        let args = params.as_lst().unwrap_or(&[]);
        let text = args
            .first()
            .map(term_text)
            .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "text".to_string() })?;
        let level = args.get(1).and_then(Term::as_atom).unwrap_or("info");

        match level {
            "error" => tracing::error!(%text, "log_message"),
            "warn" => tracing::warn!(%text, "log_message"),
            "debug" => tracing::debug!(%text, "log_message"),
            _ => tracing::info!(%text, "log_message"),
        }

        let record = Term::op(
            "LogMessage",
            [Term::atom(level), Term::str(text), Term::str(Utc::now().to_rfc3339())],
        );
        ctx.kb.save_assertion(fact(record.clone(), KbId::system()))?;
        Ok(record)
    }
}

fn term_text(term: &Term) -> String {
    match term {
        Term::Str(s) => s.clone(),
        Term::Atom(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;
    use kernel_kb::{InMemoryPersistence, KnowledgeBase};
    use kernel_llm::MockLlmProvider;
    use std::sync::Arc;

    fn ctx() -> ToolContext {
        ToolContext {
            kb: Arc::new(KnowledgeBase::new(Arc::new(InMemoryPersistence::new())).unwrap()),
            llm: Arc::new(MockLlmProvider::new("")),
            outbound: Arc::new(NullSink),
        }
    }

    #[tokio::test]
    async fn logs_and_records_a_message() {
        let context = ctx();
        let params = Term::lst(vec![Term::str("hello"), Term::atom("warn")]);
        let result = LogMessageTool.execute(&params, &context).await.unwrap();
        assert_eq!(result.operator(), Some("LogMessage"));
        assert_eq!(result.args()[0], Term::atom("warn"));
    }

    #[tokio::test]
    async fn defaults_to_info_level() {
        let context = ctx();
        let params = Term::lst(vec![Term::str("hi")]);
        let result = LogMessageTool.execute(&params, &context).await.unwrap();
        assert_eq!(result.args()[0], Term::atom("info"));
    }
}
