//! # Operation Hooks

//! Diagnostic wrappers invoked around every tool operation. Hooks are injected into the
//! [`ToolDispatcher`](super::ToolDispatcher), so a deployment can swap them or run without any.

use std::time::Duration;
use serde_json::Value;
use tracing::{info, warn};
use super::ToolReply;

pub trait OperationHook: Send + Sync {
    /// Called before the operation runs, with the caller's arguments
    fn before(&self, operation: &str, arguments: &Value);

    /// Called once the operation has produced its reply
    fn after(&self, operation: &str, reply: &ToolReply, elapsed: Duration);
}

/// Emits structured `tracing` events around each operation
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHook;

impl OperationHook for TracingHook {
    fn before(&self, operation: &str, arguments: &Value) {
        info!(operation, %arguments, "About to call tool");
    }

    fn after(&self, operation: &str, reply: &ToolReply, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        match &reply.error {
            None => info!(operation, elapsed_ms, result = %reply.result, "Tool call completed"),
            Some(error) => warn!(
                operation,
                elapsed_ms,
                kind = %error.kind,
                message = %error.message,
                "Tool call failed"
            ),
        }
    }
}
