//! `_QueryKB`: `(<queryType-atom> <pattern> <requestId?> <options?>)`, per
//! spec.md §4.4 — runs the query and asserts an `ApiResponse` carrying a
//! `QueryResult` term into `api-outbox`.

use super::fact;
use crate::registry::{Tool, ToolContext};
use async_trait::async_trait;
use kernel_core::{KbId, KernelResult, Term, ValidationError};

pub struct QueryKbTool;

#[async_trait]
impl Tool for QueryKbTool {
    fn name(&self) -> &str {
        "_QueryKB"
    }

    fn description(&self) -> &str {
        "runs a KB query and asserts its ApiResponse into api-outbox"
    }

    async fn execute(&self, params: &Term, ctx: &ToolContext) -> KernelResult<Term> {
        let args = params.as_lst().unwrap_or(&[]);
        let query_type = args
            .first()
            .and_then(Term::as_atom)
            .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "queryType".to_string() })?;
        let pattern = args
            .get(1)
            .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "pattern".to_string() })?;
        let request_id = args.get(2).and_then(Term::as_atom).unwrap_or("").to_string();

        let query_result = match query_type {
            "query" => match ctx.kb.query_assertions(pattern) {
                Ok(matches) => {
                    let results = Term::lst(matches.into_iter().map(|a| a.kif).collect::<Vec<_>>());
                    Term::op("QueryResult", [Term::atom("query"), Term::atom("SUCCESS"), results])
                }
                Err(e) => error_result(query_type, &e.to_string()),
            },
            other => error_result(other, &format!("unrecognized query type: {other}")),
        };

        let response = Term::op("ApiResponse", [Term::atom(request_id), query_result]);
        ctx.kb.save_assertion(fact(response.clone(), KbId::api_outbox()))?;
        Ok(response)
    }
}

fn error_result(query_type: &str, message: &str) -> Term {
    Term::op(
        "QueryResult",
        [Term::atom(query_type), Term::atom("ERROR"), Term::lst(Vec::new()), Term::str(message)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::fact;
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
    async fn query_returns_matching_assertions() {
        let context = ctx();
        let kif = Term::op("parent", [Term::atom("alice"), Term::atom("bob")]);
        context.kb.save_assertion(fact(kif, KbId::global())).unwrap();

        let params = Term::lst(vec![Term::atom("query"), Term::op("parent", [Term::var("x"), Term::atom("bob")]), Term::atom("r1")]);
        let result = QueryKbTool.execute(&params, &context).await.unwrap();
        let query_result = &result.args()[1];
        assert_eq!(query_result.args()[1], Term::atom("SUCCESS"));
    }

    #[tokio::test]
    async fn unknown_query_type_surfaces_as_error_status() {
        let context = ctx();
        let params = Term::lst(vec![Term::atom("malformed"), Term::atom("x")]);
        let result = QueryKbTool.execute(&params, &context).await.unwrap();
        let query_result = &result.args()[1];
        assert_eq!(query_result.args()[1], Term::atom("ERROR"));
    }
}
