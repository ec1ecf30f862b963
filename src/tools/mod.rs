//! # Caller-Facing Tools

//! The operations the conversational agent may invoke: `get_dock_slots`, `verify_id_tool` and
//! `create_appointment`. Each call is answered with a [`ToolReply`]; its `error.kind` names the
//! failure category even where the `result` itself collapses to null or `false`.

pub mod hooks;

pub use hooks::*;

use std::sync::Arc;
use std::time::Instant;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use crate::errors::DockBookingError;
use crate::services::{AppointmentBookingService, CarrierDirectory, SlotLookupService};

/// A typed tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "arguments")]
pub enum ToolCall {
    #[serde(rename = "get_dock_slots")]
    GetDockSlots { date_ddmmyyyy: String },
    #[serde(rename = "verify_id_tool")]
    VerifyId { partner_id: String },
    #[serde(rename = "create_appointment")]
    CreateAppointment {
        loadpoint: String,
        carrier: String,
        req_start_time: String,
    },
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GetDockSlots { .. } => "get_dock_slots",
            ToolCall::VerifyId { .. } => "verify_id_tool",
            ToolCall::CreateAppointment { .. } => "create_appointment",
        }
    }

    pub fn arguments(&self) -> Value {
        match self {
            ToolCall::GetDockSlots { date_ddmmyyyy } => json!({ "date_ddmmyyyy": date_ddmmyyyy }),
            ToolCall::VerifyId { partner_id } => json!({ "partner_id": partner_id }),
            ToolCall::CreateAppointment { loadpoint, carrier, req_start_time } => json!({
                "loadpoint": loadpoint,
                "carrier": carrier,
                "req_start_time": req_start_time,
            }),
        }
    }
}

/// One line of the stdio protocol: an optional correlation id plus the call
#[derive(Debug, Clone, Deserialize)]
pub struct ToolInvocation {
    #[serde(default)]
    pub id: Option<Value>,
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolInvocation {
    pub fn into_call(self) -> Result<(Option<Value>, ToolCall), (Option<Value>, String, DockBookingError)> {
        let ToolInvocation { id, tool, arguments } = self;
        match serde_json::from_value(json!({ "tool": &tool, "arguments": arguments })) {
            Ok(call) => Ok((id, call)),
            Err(e) => Err((id, tool, DockBookingError::InvalidInput(format!("invalid tool call: {}", e)))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    pub kind: String,
    pub message: String,
}

impl From<&DockBookingError> for ToolError {
    fn from(err: &DockBookingError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub tool: String,
    pub ok: bool,
    /// Slot list, verification flag or document number; null (or `false` for verification) on failure
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl ToolReply {
    fn success(tool: &str, result: Value) -> Self {
        Self { id: None, tool: tool.to_string(), ok: true, result, error: None }
    }

    fn failure(tool: &str, result: Value, err: &DockBookingError) -> Self {
        Self { id: None, tool: tool.to_string(), ok: false, result, error: Some(ToolError::from(err)) }
    }

    pub fn error_kind(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.kind.as_str())
    }

    fn with_id(mut self, id: Option<Value>) -> Self {
        self.id = id;
        self
    }
}

/// Routes tool calls to the booking services and runs the injected hooks around each call.
/// Holds no mutable state, so one dispatcher can serve concurrent calls.
#[derive(Clone)]
pub struct ToolDispatcher {
    slots: SlotLookupService,
    carriers: CarrierDirectory,
    booking: AppointmentBookingService,
    hooks: Vec<Arc<dyn OperationHook>>,
}

impl ToolDispatcher {
    pub fn new(slots: SlotLookupService, carriers: CarrierDirectory, booking: AppointmentBookingService) -> Self {
        Self { slots, carriers, booking, hooks: Vec::new() }
    }

    pub fn with_hook(mut self, hook: Arc<dyn OperationHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub async fn dispatch(&self, call: ToolCall) -> ToolReply {
        let operation = call.name();
        let arguments = call.arguments();
        for hook in &self.hooks {
            hook.before(operation, &arguments);
        }

        let start = Instant::now();
        let reply = match call {
            ToolCall::GetDockSlots { date_ddmmyyyy } => match self.slots.list_slots(&date_ddmmyyyy).await {
                Ok(slots) => match serde_json::to_value(slots) {
                    Ok(result) => ToolReply::success(operation, result),
                    Err(e) => ToolReply::failure(operation, Value::Null, &DockBookingError::from(e)),
                },
                Err(e) => ToolReply::failure(operation, Value::Null, &e),
            },
            ToolCall::VerifyId { partner_id } => match self.carriers.check(&partner_id).await {
                Ok(known) => ToolReply::success(operation, Value::Bool(known)),
                Err(e) => ToolReply::failure(operation, Value::Bool(false), &e),
            },
            ToolCall::CreateAppointment { loadpoint, carrier, req_start_time } => {
                match self.booking.book(&loadpoint, &carrier, &req_start_time).await {
                    Ok(document_number) => ToolReply::success(operation, Value::String(document_number.0)),
                    Err(e) => ToolReply::failure(operation, Value::Null, &e),
                }
            }
        };

        let elapsed = start.elapsed();
        for hook in &self.hooks {
            hook.after(operation, &reply, elapsed);
        }
        reply
    }

    /// Handles one line of the stdio protocol.
    /// Lines that are not a valid invocation are answered with an `invalid_input` reply.
    pub async fn dispatch_line(&self, line: &str) -> ToolReply {
        let invocation: ToolInvocation = match serde_json::from_str(line) {
            Ok(invocation) => invocation,
            Err(e) => {
                let err = DockBookingError::InvalidInput(format!("invalid tool call: {}", e));
                return ToolReply::failure("unknown", Value::Null, &err);
            }
        };
        match invocation.into_call() {
            Ok((id, call)) => self.dispatch(call).await.with_id(id),
            Err((id, tool, err)) => ToolReply::failure(&tool, Value::Null, &err).with_id(id),
        }
    }
}
