//! Wire protocol (spec.md §6): newline-delimited JSON requests and
//! responses over a Unix socket (preferred) or loopback TCP, grounded on
//! the request/response shape of the daemon listener in
//! `groblegark-oddjobs`'s `crates-daemon-src-listener` module, generalized
//! from that daemon's bespoke enum-per-request-kind protocol to a single
//! `{op, args}` envelope since this crate's operation set spans five
//! independent stores rather than one runtime.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub op: String,
    #[serde(default)]
    pub args: serde_json::Value,
    pub deadline_ms: Option<u64>,
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub request_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl Response {
    pub fn ok(request_id: String, result: serde_json::Value) -> Self {
        Self { request_id, ok: true, result: Some(result), error: None }
    }

    pub fn err(request_id: String, kind: &str, message: impl Into<String>) -> Self {
        Self { request_id, ok: false, result: None, error: Some(ErrorPayload { kind: kind.to_string(), message: message.into() }) }
    }
}

/// Maps a `SwarmError` onto the wire error `kind` the spec's response
/// envelope names (`{request_id, ok, error{kind, message}}`).
pub fn error_kind(err: &swarmcell_core::errors::SwarmError) -> &'static str {
    use swarmcell_core::errors::SwarmError::*;
    match err {
        Validation { .. } => "validation",
        NotFound { .. } => "not_found",
        InvalidTransition { .. } => "invalid_transition",
        DependencyCycle { .. } => "dependency_cycle",
        AmbiguousId { .. } => "ambiguous_id",
        Timeout { .. } => "timeout",
        Conflict { .. } => "conflict",
        Corruption { .. } => "corruption",
        Transport { .. } => "transport",
        Storage(_) => "storage",
        Serialization(_) => "serialization",
        Io(_) => "io",
        Config(_) => "config",
    }
}
