mod primitives;
mod registry;
mod sink;

pub use primitives::{
    AskUserTool, AssertTool, CallLlmTool, LogMessageTool, QueryKbTool, RetractTool,
    SendApiMessageTool,
};
pub use registry::{Tool, ToolContext, ToolRegistry};
pub use sink::{ChannelSink, NullSink, OutboundSink};
