//! Gateway message envelope
//!
//! Every frame is `{"op": n, "d": ..., "s": n?, "t": "NAME"?}`.

use super::{HelloPayload, IdentifyPayload, OpCode, ResumePayload};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gateway message format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Operation code
    pub op: OpCode,

    /// Event name (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Sequence number (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event data payload
    #[serde(default)]
    pub d: Option<Value>,
}

/// Envelope with the opcode still raw, so unknown opcodes can be told apart from bad JSON
#[derive(Deserialize)]
struct RawMessage {
    op: u64,
    #[serde(default)]
    t: Option<String>,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    d: Option<Value>,
}

/// Why an inbound frame could not be decoded
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed gateway payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown opcode {0}")]
    UnknownOpcode(u64),
}

impl GatewayMessage {
    // === Client Messages ===

    /// Create a Heartbeat message (op=1); `d` is `null` before the first dispatch
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self {
            op: OpCode::Heartbeat,
            t: None,
            s: None,
            d: Some(last_sequence.map_or(Value::Null, |s| Value::Number(s.into()))),
        }
    }

    /// Create an Identify message (op=2)
    #[must_use]
    pub fn identify(payload: &IdentifyPayload) -> Self {
        Self::with_payload(OpCode::Identify, payload)
    }

    /// Create a Resume message (op=6)
    #[must_use]
    pub fn resume(payload: &ResumePayload) -> Self {
        Self::with_payload(OpCode::Resume, payload)
    }

    // === Server Messages ===

    /// Create a Hello message (op=10)
    #[must_use]
    pub fn hello(heartbeat_interval: u64) -> Self {
        Self::with_payload(OpCode::Hello, &HelloPayload { heartbeat_interval })
    }

    /// Create a Dispatch message (op=0)
    #[must_use]
    pub fn dispatch(event: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event.into()),
            s: Some(sequence),
            d: Some(data),
        }
    }

    /// Create a Heartbeat ACK message (op=11)
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self::bare(OpCode::HeartbeatAck)
    }

    /// Create a Reconnect message (op=7)
    #[must_use]
    pub fn reconnect() -> Self {
        Self::bare(OpCode::Reconnect)
    }

    /// Create an Invalid Session message (op=9)
    #[must_use]
    pub fn invalid_session(resumable: bool) -> Self {
        Self {
            op: OpCode::InvalidSession,
            t: None,
            s: None,
            d: Some(Value::Bool(resumable)),
        }
    }

    fn bare(op: OpCode) -> Self {
        Self {
            op,
            t: None,
            s: None,
            d: None,
        }
    }

    fn with_payload<T: Serialize>(op: OpCode, payload: &T) -> Self {
        Self {
            op,
            t: None,
            s: None,
            d: Some(serde_json::to_value(payload).unwrap_or_default()),
        }
    }

    // === Payload Access ===

    /// Decode `d` as `T` when the opcode matches
    pub fn payload<T: DeserializeOwned>(&self, op: OpCode) -> Option<T> {
        if self.op != op {
            return None;
        }
        self.d
            .as_ref()
            .and_then(|d| T::deserialize(d).ok())
    }

    pub fn as_hello(&self) -> Option<HelloPayload> {
        self.payload(OpCode::Hello)
    }

    pub fn as_identify(&self) -> Option<IdentifyPayload> {
        self.payload(OpCode::Identify)
    }

    pub fn as_resume(&self) -> Option<ResumePayload> {
        self.payload(OpCode::Resume)
    }

    /// The `d` flag of an Invalid Session (op=9); absent counts as not resumable
    pub fn as_invalid_session(&self) -> Option<bool> {
        if self.op != OpCode::InvalidSession {
            return None;
        }
        Some(self.d.as_ref().and_then(Value::as_bool).unwrap_or(false))
    }

    /// Sequence carried by a Heartbeat (op=1)
    pub fn as_heartbeat_seq(&self) -> Option<Option<u64>> {
        if self.op != OpCode::Heartbeat {
            return None;
        }
        Some(self.d.as_ref().and_then(Value::as_u64))
    }

    // === Utilities ===

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON string
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let raw: RawMessage = serde_json::from_str(text)?;
        let op = u8::try_from(raw.op)
            .ok()
            .and_then(OpCode::from_u8)
            .ok_or(DecodeError::UnknownOpcode(raw.op))?;

        Ok(Self {
            op,
            t: raw.t,
            s: raw.s,
            d: raw.d,
        })
    }
}
