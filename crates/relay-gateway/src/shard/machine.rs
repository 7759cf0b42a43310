use super::Action;
use crate::events::{GatewayEvent, GatewayEventType, ReadyEvent};
use crate::protocol::{
    GatewayMessage, IdentifyPayload, IdentifyProperties, Intents, OpCode, ResumePayload,
};
use relay_core::SessionError;
use std::fmt;
use std::time::Duration;

/// Protocol state for one gateway session
///
/// Sequence and session id survive a resume-reconnect; [`Shard::reset`] clears
/// them before a fresh Identify.
#[derive(Clone)]
pub struct Shard {
    token: String,
    intents: Intents,
    properties: IdentifyProperties,
    sequence: Option<u64>,
    session_id: Option<String>,
    resume_url: Option<String>,
    heartbeat_interval: Option<Duration>,
    pending_acks: u32,
    identified: bool,
}

impl Shard {
    pub fn new(token: impl Into<String>, intents: Intents) -> Self {
        Self {
            token: token.into(),
            intents,
            properties: IdentifyProperties::default(),
            sequence: None,
            session_id: None,
            resume_url: None,
            heartbeat_interval: None,
            pending_acks: 0,
            identified: false,
        }
    }

    #[must_use]
    pub fn with_properties(mut self, properties: IdentifyProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Resume URL handed out by READY, if any
    pub fn resume_url(&self) -> Option<&str> {
        self.resume_url.as_deref()
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    pub fn pending_acks(&self) -> u32 {
        self.pending_acks
    }

    pub fn is_identified(&self) -> bool {
        self.identified
    }

    /// A session id and a sequence are both needed to Resume
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence.is_some()
    }

    /// Forget the session so the next Hello triggers Identify
    pub fn reset(&mut self) {
        self.sequence = None;
        self.session_id = None;
        self.resume_url = None;
        self.begin_connection();
    }

    /// Clear per-connection state; session id and sequence are kept
    pub fn begin_connection(&mut self) {
        self.heartbeat_interval = None;
        self.pending_acks = 0;
        self.identified = false;
    }

    /// Decode one text frame and process it
    ///
    /// Frames that fail to decode are logged and produce no actions.
    pub fn handle_text(&mut self, text: &str) -> Vec<Action> {
        tracing::trace!(frame = %text, "< gateway");
        match GatewayMessage::from_json(text) {
            Ok(message) => self.handle(message),
            Err(e) => {
                let error = SessionError::ProtocolParse(e.to_string());
                tracing::warn!(error = %error, code = error.code(), "Ignoring gateway frame");
                Vec::new()
            }
        }
    }

    pub fn handle(&mut self, message: GatewayMessage) -> Vec<Action> {
        match message.op {
            OpCode::Hello => self.on_hello(&message),
            OpCode::Dispatch => self.on_dispatch(message),
            OpCode::HeartbeatAck => {
                self.on_heartbeat_ack();
                Vec::new()
            }
            OpCode::Heartbeat => {
                // Server asked for an immediate beat
                self.pending_acks = self.pending_acks.saturating_add(1);
                vec![Action::Send(GatewayMessage::heartbeat(self.sequence))]
            }
            OpCode::Reconnect => {
                tracing::info!(
                    session_id = ?self.session_id,
                    seq = ?self.sequence,
                    "Gateway requested reconnect"
                );
                vec![Action::Reconnect { resume: true }]
            }
            OpCode::InvalidSession => {
                let resumable = message.as_invalid_session().unwrap_or(false);
                tracing::warn!(
                    session_id = ?self.session_id,
                    resumable,
                    "Gateway invalidated the session"
                );
                self.reset();
                vec![Action::Reconnect { resume: false }]
            }
            op => {
                anomaly(&format!("unexpected {op} from server"));
                Vec::new()
            }
        }
    }

    /// Timer firing: beat, or report a zombie connection
    pub fn heartbeat_due(&mut self) -> Action {
        if self.pending_acks > 1 {
            return Action::Zombie {
                unacked: self.pending_acks,
            };
        }
        self.pending_acks += 1;
        tracing::trace!(seq = ?self.sequence, pending = self.pending_acks, "Heartbeat");
        Action::Send(GatewayMessage::heartbeat(self.sequence))
    }

    fn on_hello(&mut self, message: &GatewayMessage) -> Vec<Action> {
        let Some(hello) = message.as_hello() else {
            anomaly("hello without heartbeat interval");
            return Vec::new();
        };
        if hello.heartbeat_interval == 0 {
            anomaly("hello with zero heartbeat interval");
        }

        let interval = Duration::from_millis(hello.heartbeat_interval);
        self.heartbeat_interval = Some(interval);
        self.pending_acks = 0;

        let greeting = self.greeting();
        vec![Action::StartHeartbeat(interval), Action::Send(greeting)]
    }

    /// Resume when possible, else Identify
    fn greeting(&self) -> GatewayMessage {
        match (&self.session_id, self.sequence) {
            (Some(session_id), Some(seq)) => {
                tracing::info!(session_id = %session_id, seq, "Resuming gateway session");
                GatewayMessage::resume(&ResumePayload {
                    token: self.token.clone(),
                    session_id: session_id.clone(),
                    seq,
                })
            }
            _ => {
                tracing::info!(intents = self.intents.bits(), "Identifying");
                let mut identify = IdentifyPayload::new(self.token.clone(), self.intents);
                identify.properties = self.properties.clone();
                GatewayMessage::identify(&identify)
            }
        }
    }

    fn on_heartbeat_ack(&mut self) {
        if self.pending_acks == 0 {
            anomaly("heartbeat ack without an outstanding heartbeat");
            return;
        }
        self.pending_acks -= 1;
    }

    fn on_dispatch(&mut self, message: GatewayMessage) -> Vec<Action> {
        let (Some(name), Some(seq)) = (message.t, message.s) else {
            anomaly("dispatch without event name or sequence");
            return Vec::new();
        };
        self.sequence = Some(seq);

        let event = GatewayEvent::new(name, seq, message.d.unwrap_or_default());
        match event.kind {
            Some(GatewayEventType::Ready) => match event.parse::<ReadyEvent>() {
                Ok(ready) => {
                    tracing::info!(
                        session_id = %ready.session_id,
                        user = %ready.user.username,
                        "Gateway session ready"
                    );
                    self.session_id = Some(ready.session_id);
                    self.resume_url = ready.resume_gateway_url;
                    self.identified = true;
                }
                Err(e) => {
                    let error = SessionError::ProtocolParse(format!("READY payload: {e}"));
                    tracing::warn!(error = %error, "Malformed READY");
                }
            },
            Some(GatewayEventType::Resumed) => {
                tracing::info!(session_id = ?self.session_id, seq, "Gateway session resumed");
                self.identified = true;
            }
            _ => {}
        }

        vec![Action::Dispatch(event)]
    }
}

fn anomaly(detail: &str) {
    let error = SessionError::ProtocolAnomaly(detail.to_string());
    tracing::warn!(error = %error, code = error.code(), "Gateway protocol anomaly");
}

impl fmt::Debug for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shard")
            .field("token", &"********")
            .field("intents", &self.intents)
            .field("sequence", &self.sequence)
            .field("session_id", &self.session_id)
            .field("resume_url", &self.resume_url)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("pending_acks", &self.pending_acks)
            .field("identified", &self.identified)
            .finish()
    }
}
