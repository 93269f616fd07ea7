//! The outbound message sink: the one seam where a tool hands a
//! translated wire message to whatever transport the binary wires up.
//! Kept to a one-method trait — grounded on `caliber-llm`'s
//! `EventListener` pattern (a narrow `Send + Sync` trait invoked at a
//! fixed point, with the concrete transport left to the caller) — since
//! spec.md §1 puts the transport itself out of scope for this core.

use serde_json::Value;

pub trait OutboundSink: Send + Sync {
    fn send(&self, message: Value);
}

/// Discards every message. Used in tests and wherever outbound delivery
/// is not under test.
#[derive(Default)]
pub struct NullSink;

impl OutboundSink for NullSink {
    fn send(&self, _message: Value) {}
}

/// Forwards messages onto an unbounded channel; `kernel-control`'s binary
/// entrypoint drains the receiving half onto whatever transport it owns.
pub struct ChannelSink {
    sender: tokio::sync::mpsc::UnboundedSender<Value>,
}

impl ChannelSink {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<Value>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl OutboundSink for ChannelSink {
    fn send(&self, message: Value) {
        // The receiver may already be gone (binary shutting down); an
        // outbound message with nowhere to go is not a kernel fault.
        let _ = self.sender.send(message);
    }
}
