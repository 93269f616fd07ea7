mod assert;
mod ask_user;
mod call_llm;
mod log_message;
mod query_kb;
mod retract;
mod send_api_message;

pub use assert::AssertTool;
pub use ask_user::AskUserTool;
pub use call_llm::CallLlmTool;
pub use log_message::LogMessageTool;
pub use query_kb::QueryKbTool;
pub use retract::RetractTool;
pub use send_api_message::SendApiMessageTool;

use chrono::Utc;
use kernel_core::{Assertion, AssertionId, AssertionType, KbId, NoteId};

/// Builds a ground, unjustified (root), always-active fact for asserting
/// a tool's own result term — `justifications` empty means it needs no
/// support from the rule/assertion that triggered the tool.
pub(crate) fn fact(kif: kernel_core::Term, kb_id: KbId) -> Assertion {
    Assertion {
        id: AssertionId::now_v7(),
        kif,
        priority: 0.9,
        timestamp: Utc::now(),
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

pub(crate) fn parse_note_id(atom: &str) -> Option<NoteId> {
    atom.parse().ok()
}
