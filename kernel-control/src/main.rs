//! Cognitive kernel process entry point.
//!
//! Bootstraps tracing, loads configuration, wires the knowledge base, tool
//! registry, LLM client, and term-logic engine together, then runs the
//! system control loop until interrupted. Mirrors `caliber-api/src/main.rs`'s
//! shape (`#[tokio::main]`, ordered resource construction, `tokio::select!`
//! graceful shutdown) with the HTTP/DB-specific pieces replaced by the
//! kernel's own KB/tools/engine/control wiring.

use kernel_control::SystemControl;
use kernel_core::{KernelConfig, KernelResult};
use kernel_kb::{FilePersistence, KnowledgeBase, Persistence};
use kernel_llm::{LlmClient, LlmSettings};
use kernel_tools::{
    AskUserTool, AssertTool, CallLlmTool, ChannelSink, LogMessageTool, QueryKbTool, RetractTool,
    SendApiMessageTool, ToolContext, ToolRegistry,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> KernelResult<()> {
    init_tracing();

    let config = kernel_control::config::load()?;
    tracing::info!(?config, "loaded kernel configuration");

    let kb = Arc::new(build_kb(&config)?);
    let tools = Arc::new(build_tools().await?);
    let llm = Arc::new(LlmClient::new(LlmSettings {
        base_url: config.llm_api_url.clone(),
        model: config.llm_model.clone(),
        temperature: config.llm_temperature,
        timeout: Duration::from_secs(config.llm_timeout_seconds),
    }));

    let (sink, mut outbound_rx) = ChannelSink::new();
    let tool_context = ToolContext { kb: kb.clone(), llm: llm.clone(), outbound: Arc::new(sink) };
    let engine = Arc::new(kernel_engine::TermLogicEngine::new(
        kb.clone(),
        tools.clone(),
        tool_context_clone(&tool_context),
        config.concurrency,
    ));

    let control = Arc::new(SystemControl::new(
        kb.clone(),
        engine,
        tools.clone(),
        tool_context,
        config.polling_interval,
        config.warmup,
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let drain_handle = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            tracing::debug!(%message, "outbound message ready for delivery");
        }
    });

    let control_loop = control.run(shutdown_rx);

    tokio::select! {
        result = control_loop => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    }

    drain_handle.abort();
    Ok(())
}

fn build_kb(config: &KernelConfig) -> KernelResult<KnowledgeBase> {
    let persistence: Arc<dyn Persistence> = Arc::new(FilePersistence::restore(&config.persistence_file_path)?);
    let kb = KnowledgeBase::new(persistence)?;
    kb.set_capacity(kernel_core::KbId::global(), config.global_kb_capacity);
    Ok(kb)
}

async fn build_tools() -> KernelResult<ToolRegistry> {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(AssertTool)).await?;
    registry.register(Arc::new(RetractTool)).await?;
    registry.register(Arc::new(QueryKbTool)).await?;
    registry.register(Arc::new(CallLlmTool)).await?;
    registry.register(Arc::new(SendApiMessageTool)).await?;
    registry.register(Arc::new(LogMessageTool)).await?;
    registry.register(Arc::new(AskUserTool)).await?;
    Ok(registry)
}

fn tool_context_clone(ctx: &ToolContext) -> ToolContext {
    ToolContext { kb: ctx.kb.clone(), llm: ctx.llm.clone(), outbound: ctx.outbound.clone() }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();
}
