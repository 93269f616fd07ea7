//! Error taxonomy for the cognitive kernel.
//!
//! Mirrors spec.md §7's error kinds: parse, validation, not-found, tool
//! failure, external failure, internal invariant, cancelled, timed out.

use crate::identity::{AssertionId, NoteId, RuleId};
use thiserror::Error;

/// KIF or wire-message parse errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TermError {
    #[error("unexpected character '{found}' at line {line}, column {column}")]
    UnexpectedChar { found: char, line: usize, column: usize },

    #[error("unterminated string literal starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("unbalanced parentheses: {open} open, {close} closed")]
    UnbalancedParens { open: usize, close: usize },

    #[error("unexpected end of input while parsing {context}")]
    UnexpectedEof { context: String },

    #[error("substitution exceeded depth cap {cap} while resolving ?{var}")]
    SubstitutionDepthExceeded { var: String, cap: usize },
}

/// Wire/command-shape validation errors at the API boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("unrecognized command: {command}")]
    UnrecognizedCommand { command: String },
}

/// ID-lookup misses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("assertion not found: {id}")]
    Assertion { id: AssertionId },

    #[error("rule not found: {id}")]
    Rule { id: RuleId },

    #[error("note not found: {id}")]
    Note { id: NoteId },

    #[error("tool not found: {name}")]
    Tool { name: String },
}

/// Business-logic errors surfaced by a primitive tool.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("tool {tool} failed: {reason}")]
    ExecutionFailed { tool: String, reason: String },

    #[error("tool {tool} received malformed parameters: {reason}")]
    MalformedParams { tool: String, reason: String },

    #[error("duplicate tool registration: {name}")]
    DuplicateRegistration { name: String },
}

/// LLM / network failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("no LLM endpoint configured")]
    NotConfigured,

    #[error("request to {endpoint} failed with status {status}: {message}")]
    RequestFailed {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("request to {endpoint} timed out after {timeout_seconds}s")]
    TimedOut { endpoint: String, timeout_seconds: u64 },
}

/// Internal invariant violations (index/TMS inconsistency). Surfaced as a
/// `(KernelFault <where> <message>)` term per spec.md §7; never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KernelFault {
    #[error("TMS inconsistency at {location}: {message}")]
    TmsInconsistency { location: String, message: String },

    #[error("index inconsistency at {location}: {message}")]
    IndexInconsistency { location: String, message: String },

    #[error("unreachable state at {location}: {message}")]
    Unreachable { location: String, message: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cancelled: {reason}")]
pub struct CancelledError {
    pub reason: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("timed out after {elapsed_ms}ms: {operation}")]
pub struct TimeoutError {
    pub operation: String,
    pub elapsed_ms: u64,
}

/// Master error type for all kernel operations.
#[derive(Debug, Clone, Error)]
pub enum KernelError {
    #[error("term error: {0}")]
    Term(#[from] TermError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error("kernel fault: {0}")]
    Fault(#[from] KernelFault),

    #[error("{0}")]
    Cancelled(#[from] CancelledError),

    #[error("{0}")]
    Timeout(#[from] TimeoutError),
}

pub type KernelResult<T> = Result<T, KernelError>;

impl KernelError {
    /// `true` for error kinds spec.md §7 says tools/external calls may
    /// legitimately retry (LLM/network failures, timeouts).
    pub fn is_retriable(&self) -> bool {
        matches!(self, KernelError::Llm(_) | KernelError::Timeout(_))
    }
}
