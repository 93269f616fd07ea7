//! `Tool` trait and `ToolRegistry`, per spec.md §4.4.
//!
//! Grounded on `caliber-llm/src/lib.rs`'s `ProviderAdapter`/
//! `ProviderRegistry` async-trait pattern: an `#[async_trait]` trait
//! object held behind `Arc`, registered by name into a map guarded by a
//! `tokio::sync::RwLock`, duplicate registration rejected with a typed
//! error. Trimmed relative to the teacher: no routing strategy, no
//! circuit breaker, no Echo/Ping discovery protocol — the spec names
//! none of those for tools.

use crate::sink::OutboundSink;
use async_trait::async_trait;
use kernel_core::{KernelResult, Term, ToolError};
use kernel_kb::KnowledgeBase;
use kernel_llm::LlmProvider;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything a tool needs to do its work, per spec.md §4.4's
/// `ToolContext` ("KnowledgeBase, LLMService, ApiGateway, event bus,
/// shared executor"). `ApiGateway` itself is pure functions (no state to
/// hold); the "send" side of it is `outbound`.
pub struct ToolContext {
    pub kb: Arc<KnowledgeBase>,
    pub llm: Arc<dyn LlmProvider>,
    pub outbound: Arc<dyn OutboundSink>,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn execute(&self, params: &Term, ctx: &ToolContext) -> KernelResult<Term>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, tool: Arc<dyn Tool>) -> KernelResult<()> {
        let mut tools = self.tools.write().await;
        let name = tool.name().to_string();
        if tools.contains_key(&name) {
            return Err(ToolError::DuplicateRegistration { name }.into());
        }
        tools.insert(name, tool);
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().await.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        self.tools.read().await.keys().cloned().collect()
    }

    pub async fn execute(&self, name: &str, params: &Term, ctx: &ToolContext) -> KernelResult<Term> {
        let tool = self
            .get(name)
            .await
            .ok_or_else(|| kernel_core::NotFoundError::Tool { name: name.to_string() })?;
        tool.execute(params, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "_Echo"
        }

        fn description(&self) -> &str {
            "returns its params unchanged"
        }

        async fn execute(&self, params: &Term, _ctx: &ToolContext) -> KernelResult<Term> {
            Ok(params.clone())
        }
    }

    #[tokio::test]
    async fn duplicate_registration_fails() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).await.unwrap();
        assert!(registry.register(Arc::new(EchoTool)).await.is_err());
    }

    #[tokio::test]
    async fn unregistered_tool_lookup_fails() {
        let registry = ToolRegistry::new();
        assert!(registry.get("_Missing").await.is_none());
    }
}
