//! `TermLogicEngine::process_term`, per spec.md §4.3.
//!
//! Grounded on `kernel-kb::KnowledgeBase::find_matching_rules` for the
//! match step and on `kernel-tools::ToolRegistry` for `ExecuteTool`.
//! Concurrent action completion uses `futures_util::future::join_all`,
//! matching the teacher's `futures-util` dependency rather than pulling in
//! a task-spawning runtime abstraction the spec doesn't ask for — each
//! action here is already either a synchronous KB write or a single
//! `Tool::execute` future. The shared bounded worker pool spec.md §5 calls
//! for is a `tokio::sync::Semaphore` sized from `KernelConfig::concurrency`:
//! `do_execute_tool` acquires a permit before dispatching to
//! `ToolRegistry::execute` and releases it as soon as that call returns —
//! before feeding the tool's result back through `process_term` — so
//! `join_all`'s fan-out still matches and fires every rule concurrently but
//! never runs more than `concurrency` tool/LLM calls at once. Holding the
//! permit across the refeed instead would serialize a rule chain against
//! its own pool slot and could deadlock a pool sized below the chain's
//! depth. `Assert`/`Retract` actions are plain KB writes, not pool work,
//! and stay unbounded.

use kernel_core::{AssertionId, AssertionType, KbId, KernelFault, KernelResult, Rule, Term};
use kernel_kb::KnowledgeBase;
use kernel_term::Bindings;
use kernel_tools::{ToolContext, ToolRegistry};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::helpers::{rename_rule_variables, simplify};

/// Outcome of firing a single rule match against one input term.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Asserted(Option<AssertionId>),
    Retracted(bool),
    ToolInvoked { tool: String, result: Term },
    ToolFailed { tool: String, message: String },
    UnknownOperator(String),
}

pub struct TermLogicEngine {
    kb: Arc<KnowledgeBase>,
    tools: Arc<ToolRegistry>,
    tool_context: ToolContext,
    worker_pool: Arc<Semaphore>,
}

impl TermLogicEngine {
    /// `concurrency` sizes the shared worker pool (spec.md §5); pass
    /// `KernelConfig::concurrency`.
    pub fn new(kb: Arc<KnowledgeBase>, tools: Arc<ToolRegistry>, tool_context: ToolContext, concurrency: usize) -> Self {
        TermLogicEngine { kb, tools, tool_context, worker_pool: Arc::new(Semaphore::new(concurrency.max(1))) }
    }

    /// Finds every rule whose antecedent unifies with `input_term`, fires
    /// each match's consequent as an action term, and awaits completion of
    /// every action — the "composite completion handle" from spec.md §4.3
    /// is this future itself.
    ///
    /// `trigger` names the `AssertionId` of the assertion whose arrival
    /// caused this dispatch, if any. `Assertion.justifications` is typed
    /// `Vec<AssertionId>` (see `kernel-core::entities`), not a union of
    /// assertion/rule IDs — rules are never part of the TMS graph and are
    /// never evicted or deactivated, so an `Assert` action's derived
    /// assertion is justified by the triggering assertion, not by
    /// `rule.id`. When `trigger` is `None` (e.g. dispatch over a term that
    /// has no backing assertion, such as a freshly-parsed `ApiRequest`),
    /// derived assertions get empty justifications and are treated as
    /// roots.
    pub async fn process_term(
        &self,
        input_term: &Term,
        trigger: Option<AssertionId>,
    ) -> KernelResult<Vec<ActionOutcome>> {
        let matches = self.kb.find_matching_rules(input_term)?;
        let mut actions = Vec::with_capacity(matches.len());
        for (rule, bindings) in matches {
            actions.push(self.fire(&rule, &bindings, trigger));
        }
        let results = futures_util::future::join_all(actions).await;
        results.into_iter().collect()
    }

    async fn fire(
        &self,
        rule: &Rule,
        bindings: &Bindings,
        trigger: Option<AssertionId>,
    ) -> KernelResult<ActionOutcome> {
        let action_term = kernel_term::fully(&rule.consequent, bindings)?;
        match action_term.operator() {
            Some("Assert") => self.do_assert(rule, &action_term, trigger).await,
            Some("Retract") => self.do_retract(rule, &action_term),
            Some("ExecuteTool") => self.do_execute_tool(rule, &action_term).await,
            Some(other) => {
                tracing::warn!(operator = other, rule = %rule.id, "unknown action-term operator");
                Ok(ActionOutcome::UnknownOperator(other.to_string()))
            }
            None => {
                tracing::warn!(rule = %rule.id, "action term has no operator atom");
                Ok(ActionOutcome::UnknownOperator(action_term.to_string()))
            }
        }
    }

    /// Saves the derived assertion, then — forward chaining's whole point —
    /// feeds its content back through [`Self::process_term`] so any rule
    /// waiting on *this* new fact fires in turn, justified by the fact
    /// itself rather than by whatever triggered the rule that derived it.
    async fn do_assert(
        &self,
        rule: &Rule,
        action_term: &Term,
        trigger: Option<AssertionId>,
    ) -> KernelResult<ActionOutcome> {
        let kif = action_term
            .args()
            .first()
            .cloned()
            .ok_or_else(|| KernelFault::Unreachable {
                location: "TermLogicEngine::do_assert".to_string(),
                message: "Assert action term missing its kif-term argument".to_string(),
            })?;

        if kernel_term::is_trivial(&kif) {
            return Ok(ActionOutcome::Asserted(None));
        }

        let decay = 0.95_f64.powi(1);
        let priority = (rule.priority * decay).clamp(0.0, 1.0);
        let kb_id = rule
            .source_note_id
            .as_ref()
            .map(KbId::for_note)
            .unwrap_or_else(KbId::global);
        let refeed_term = kif.clone();

        let assertion = kernel_core::Assertion {
            id: AssertionId::now_v7(),
            is_equality: kif.is_equality(),
            is_negated: kif.is_negation(),
            is_oriented: kif.is_equality(),
            assertion_type: AssertionType::classify(&kif),
            quantified_vars: if kif.is_forall() {
                kif.args().first().map(|vars| vars.free_variables()).unwrap_or_default()
            } else {
                Vec::new()
            },
            kif,
            priority,
            timestamp: chrono::Utc::now(),
            source_note_id: rule.source_note_id.clone(),
            justifications: trigger.into_iter().collect(),
            derivation_depth: rule.derivation_depth + 1,
            active: true,
            kb_id,
        };

        let id = self.kb.save_assertion(assertion)?;
        if let Some(id) = id {
            self.refeed(refeed_term, Some(id)).await?;
        }
        Ok(ActionOutcome::Asserted(id))
    }

    fn do_retract(&self, rule: &Rule, action_term: &Term) -> KernelResult<ActionOutcome> {
        let target = action_term.args().first().ok_or_else(|| KernelFault::Unreachable {
            location: "TermLogicEngine::do_retract".to_string(),
            message: "Retract action term missing its target argument".to_string(),
        })?;

        let id = match target.as_atom().and_then(|a| a.parse::<AssertionId>().ok()) {
            Some(id) => Some(id),
            None => {
                let candidates = self.kb.query_assertions(target)?;
                candidates
                    .into_iter()
                    .find(|a| rule.source_note_id.is_none() || a.source_note_id == rule.source_note_id)
                    .map(|a| a.id)
            }
        };

        match id {
            Some(id) => {
                self.kb.delete_assertion(id)?;
                Ok(ActionOutcome::Retracted(true))
            }
            None => Ok(ActionOutcome::Retracted(false)),
        }
    }

    async fn do_execute_tool(&self, rule: &Rule, action_term: &Term) -> KernelResult<ActionOutcome> {
        let args = action_term.args();
        let tool_name = args.first().and_then(Term::as_atom).ok_or_else(|| KernelFault::Unreachable {
            location: "TermLogicEngine::do_execute_tool".to_string(),
            message: "ExecuteTool action term missing its tool-name argument".to_string(),
        })?;
        let params = args.get(1).cloned().unwrap_or_else(|| Term::lst(Vec::new()));

        let outcome = {
            let _permit = self.worker_pool.acquire().await.map_err(|e| KernelFault::Unreachable {
                location: "TermLogicEngine::do_execute_tool".to_string(),
                message: format!("worker pool semaphore closed: {e}"),
            })?;
            self.tools.execute(tool_name, &params, &self.tool_context).await
        };

        match outcome {
            Ok(result) => {
                let record = Term::op(
                    "ToolResult",
                    [Term::atom(tool_name), result.clone(), Term::atom(rule.id.to_string())],
                );
                self.assert_and_refeed(record, KbId::global()).await?;
                Ok(ActionOutcome::ToolInvoked { tool: tool_name.to_string(), result })
            }
            Err(e) => {
                let message = e.to_string();
                let record = Term::op(
                    "ToolError",
                    [Term::atom(tool_name), Term::str(message.clone()), Term::atom(rule.id.to_string())],
                );
                self.assert_and_refeed(record, KbId::global()).await?;
                Ok(ActionOutcome::ToolFailed { tool: tool_name.to_string(), message })
            }
        }
    }

    /// Saves a tool's outcome term and feeds it back through
    /// `process_term`, per the spec.md §4.3/§9 "automatic feedback"
    /// resolution: tool results re-enter rule matching on their own,
    /// rather than requiring a caller to notice and re-dispatch them.
    /// Boxed to break the otherwise self-referential `process_term` ->
    /// `fire` -> `do_execute_tool` -> `process_term` async call cycle.
    fn assert_and_refeed<'a>(
        &'a self,
        record: Term,
        kb_id: KbId,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = KernelResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let id = self.kb.save_assertion(kernel_tools_fact(record.clone(), kb_id))?;
            self.process_term(&record, id).await?;
            Ok(())
        })
    }

    /// Re-enters `process_term` for an assertion that was already saved by
    /// the caller (an `Assert` action's derived fact). Same boxing reason
    /// as `assert_and_refeed`: this is part of the same
    /// `process_term -> fire -> do_assert -> process_term` cycle.
    fn refeed<'a>(
        &'a self,
        term: Term,
        trigger: Option<AssertionId>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = KernelResult<()>> + Send + 'a>> {
        Box::pin(async move {
            self.process_term(&term, trigger).await?;
            Ok(())
        })
    }
}

/// Mirrors `kernel_tools::primitives::fact` (private to that crate): a
/// ground, unjustified, always-active record of an engine-driven tool
/// invocation's outcome.
fn kernel_tools_fact(kif: Term, kb_id: KbId) -> kernel_core::Assertion {
    kernel_core::Assertion {
        id: AssertionId::now_v7(),
        kif,
        priority: 0.9,
        timestamp: chrono::Utc::now(),
        source_note_id: None,
        justifications: Vec::new(),
        assertion_type: AssertionType::Ground,
        is_equality: false,
        is_oriented: false,
        is_negated: false,
        quantified_vars: Vec::new(),
        derivation_depth: 0,
        active: true,
        kb_id,
    }
}

impl TermLogicEngine {
    /// `Simplify`: iterated one-pass rewrite of double-negation and
    /// distribution shapes, per spec.md §4.3. Exposed on the engine since
    /// rules reference it as a term-level helper.
    pub fn simplify(&self, term: &Term) -> Term {
        simplify(term)
    }

    /// Alpha-renames `rule`'s variables with a depth-suffixed prefix to
    /// prevent capture during backward chaining, per spec.md §4.3.
    pub fn rename_rule_variables(&self, rule: &Rule, depth: u32) -> Rule {
        rename_rule_variables(rule, depth)
    }
}
