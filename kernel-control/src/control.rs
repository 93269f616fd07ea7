//! `SystemControl`: the per-tick scheduler, per spec.md §4.7.
//!
//! Three phases per tick, each processed FIFO by assertion timestamp (ties
//! broken by priority, then by assertion ID):
//! 1. inbound tasks — unprocessed `ApiRequest` assertions in `api-inbox`
//!    are dispatched through the engine; a `Processed`/`TaskError` marker
//!    is asserted on completion so a later tick never redispatches them.
//! 2. outbound messages — `ApiResponse`, `DialogueRequest`, and `Event`
//!    assertions in `api-outbox` not yet covered by a `SentApiResponse`
//!    marker are sent via `_SendApiMessage`, which owns the at-most-once
//!    marker itself (invariant 9) regardless of which of the three it sent.
//! 3. deferred events — due `SystemEvent` terms are fed back through the
//!    engine, unblocking any rule waiting on their arrival.
//!
//! Grounded on the teacher's single-loop scheduler shape (a
//! `tokio::time::interval`-driven `tokio::select!` against a shutdown
//! signal, as in `caliber-api/src/main.rs`'s `tokio::select!{server,
//! ctrl_c}`), adapted here to drive ticks instead of serving requests.

use kernel_core::{Assertion, KbId, KernelResult, Term};
use kernel_engine::TermLogicEngine;
use kernel_kb::KnowledgeBase;
use kernel_tools::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;

pub struct SystemControl {
    kb: Arc<KnowledgeBase>,
    engine: Arc<TermLogicEngine>,
    tools: Arc<ToolRegistry>,
    tool_context: kernel_tools::ToolContext,
    polling_interval: Duration,
    warmup: Duration,
}

impl SystemControl {
    pub fn new(
        kb: Arc<KnowledgeBase>,
        engine: Arc<TermLogicEngine>,
        tools: Arc<ToolRegistry>,
        tool_context: kernel_tools::ToolContext,
        polling_interval: Duration,
        warmup: Duration,
    ) -> Self {
        SystemControl { kb, engine, tools, tool_context, polling_interval, warmup }
    }

    /// Parses and saves a raw inbound wire message into `api-inbox`,
    /// returning the new `ApiRequest` assertion's ID. Transport-agnostic,
    /// per spec.md §1's "no particular wire protocol" non-goal — callers
    /// supply the raw bytes however they arrive (WebSocket frame, stdin
    /// line, test harness).
    pub fn submit_raw(&self, raw: &str) -> KernelResult<Option<kernel_core::AssertionId>> {
        let assertion = kernel_api::build_api_request(raw)?;
        self.kb.save_assertion(assertion)
    }

    /// Runs ticks forever at `polling_interval`, after an initial `warmup`
    /// delay, until `shutdown` reports `true`.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) -> KernelResult<()> {
        tokio::time::sleep(self.warmup).await;
        let mut ticker = tokio::time::interval(self.polling_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(error = %e, "control loop tick failed");
                    }
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        tracing::info!("control loop shutting down");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs exactly one tick of all three phases. Exposed separately from
    /// [`Self::run`] so tests can drive ticks deterministically instead of
    /// waiting on wall-clock time.
    pub async fn tick(&self) -> KernelResult<()> {
        self.process_inbound().await?;
        self.process_outbound().await?;
        self.process_deferred_events().await?;
        Ok(())
    }

    async fn process_inbound(&self) -> KernelResult<()> {
        let pattern = Term::op("ApiRequest", [Term::var("requestId"), Term::var("command")]);
        let mut pending: Vec<Assertion> = self
            .kb
            .query_assertions(&pattern)?
            .into_iter()
            .filter(|a| a.kb_id == KbId::api_inbox())
            .filter(|a| !self.already_handled(a).unwrap_or(true))
            .collect();
        order_fifo(&mut pending);

        for assertion in pending {
            self.dispatch_inbound(&assertion).await?;
        }
        Ok(())
    }

    fn already_handled(&self, assertion: &Assertion) -> KernelResult<bool> {
        let Some(request_id) = assertion.kif.args().first().cloned() else {
            return Ok(true);
        };
        let processed = Term::op("Processed", [request_id.clone()]);
        let errored = Term::op("TaskError", [request_id, Term::var("reason")]);
        Ok(!self.kb.query_assertions(&processed)?.is_empty() || !self.kb.query_assertions(&errored)?.is_empty())
    }

    async fn dispatch_inbound(&self, assertion: &Assertion) -> KernelResult<()> {
        let Some(request_id) = assertion.kif.args().first().cloned() else {
            return Ok(());
        };
        let marker = match self.engine.process_term(&assertion.kif, Some(assertion.id)).await {
            Ok(_) => Term::op("Processed", [request_id]),
            Err(e) => {
                tracing::warn!(request = %assertion.id, error = %e, "inbound task failed");
                Term::op("TaskError", [request_id, Term::str(e.to_string())])
            }
        };
        self.kb.save_assertion(marker_fact(marker, KbId::system()))?;
        Ok(())
    }

    /// Drains every outbound-channel assertion kind — `ApiResponse`,
    /// `DialogueRequest`, and `Event` all live in `api-outbox` per spec.md
    /// §4.6 ("Events and dialogue requests are wrapped similarly... each
    /// outbound message has its own id") — and sends each exactly once.
    async fn process_outbound(&self) -> KernelResult<()> {
        let patterns = [
            Term::op("ApiResponse", [Term::var("requestId"), Term::var("content")]),
            Term::op("DialogueRequest", [Term::var("dialogueId"), Term::var("prompt"), Term::var("kind"), Term::var("options")]),
            Term::op("Event", [Term::var("content")]),
        ];
        let mut pending: Vec<Assertion> = Vec::new();
        for pattern in &patterns {
            pending.extend(
                self.kb
                    .query_assertions(pattern)?
                    .into_iter()
                    .filter(|a| a.kb_id == KbId::api_outbox())
                    .filter(|a| !self.already_sent(a).unwrap_or(true)),
            );
        }
        order_fifo(&mut pending);

        for assertion in pending {
            let params = Term::lst(vec![Term::atom(assertion.id.to_string())]);
            if let Err(e) = self.tools.execute("_SendApiMessage", &params, &self.tool_context).await {
                tracing::warn!(response = %assertion.id, error = %e, "failed to send outbound response");
            }
        }
        Ok(())
    }

    fn already_sent(&self, assertion: &Assertion) -> KernelResult<bool> {
        let marker = Term::op("SentApiResponse", [Term::atom(assertion.id.to_string())]);
        Ok(!self.kb.query_assertions(&marker)?.is_empty())
    }

    /// Fires every currently-active `SystemEvent` whose `dueAt` has
    /// passed. `SystemEvent` terms are asserted by rules or tools that
    /// schedule future work (spec.md §4.7) — e.g. `_AskUser`'s dialogue
    /// TTL (spec.md §5) schedules a `(DialogueTimeout <dialogueId>)`
    /// payload this way. Firing asserts the payload itself (so "a term is
    /// asserted" is literally true, not just routed through rule
    /// matching) and refeeds it through the engine so any rule waiting on
    /// it fires too; the `SystemEvent` wrapper is then retracted so it
    /// fires exactly once.
    async fn process_deferred_events(&self) -> KernelResult<()> {
        let pattern = Term::op("SystemEvent", [Term::var("dueAt"), Term::var("payload")]);
        let mut due: Vec<Assertion> = self
            .kb
            .query_assertions(&pattern)?
            .into_iter()
            .filter(|a| is_due(a))
            .collect();
        order_fifo(&mut due);

        for assertion in due {
            if let Some(payload) = assertion.kif.args().get(1).cloned() {
                let id = self.kb.save_assertion(marker_fact(payload.clone(), assertion.kb_id))?;
                self.engine.process_term(&payload, id).await?;
            }
            self.kb.delete_assertion(assertion.id)?;
        }
        Ok(())
    }
}

fn is_due(assertion: &Assertion) -> bool {
    match assertion.kif.args().first() {
        Some(Term::Num(due_at)) => *due_at <= chrono::Utc::now().timestamp_millis() as f64,
        _ => true,
    }
}

/// Sorts by assertion timestamp ascending, ties broken by priority
/// descending, then by assertion ID for a total order.
fn order_fifo(assertions: &mut [Assertion]) {
    assertions.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| b.priority.total_cmp(&a.priority))
            .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
    });
}

fn marker_fact(kif: Term, kb_id: KbId) -> Assertion {
    Assertion {
        id: kernel_core::AssertionId::now_v7(),
        kif,
        priority: 0.9,
        timestamp: chrono::Utc::now(),
        source_note_id: None,
        justifications: Vec::new(),
        assertion_type: kernel_core::AssertionType::Ground,
        is_equality: false,
        is_oriented: false,
        is_negated: false,
        quantified_vars: Vec::new(),
        derivation_depth: 0,
        active: true,
        kb_id,
    }
}
