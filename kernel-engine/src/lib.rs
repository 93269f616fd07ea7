mod engine;
mod helpers;

pub use engine::{ActionOutcome, TermLogicEngine};
pub use helpers::{rename_rule_variables, simplify};
