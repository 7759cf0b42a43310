//! Session errors - the failure taxonomy every adapter reports through

use std::fmt;
use std::io;

use thiserror::Error;

/// Coarse classification of a [`SessionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Resolution,
    Connect,
    Handshake,
    ProtocolParse,
    ProtocolAnomaly,
    Transport,
    Closed,
}

/// Errors raised while establishing or running a session
#[derive(Debug, Error)]
pub enum SessionError {
    // =========================================================================
    // Connection establishment
    // =========================================================================
    #[error("Failed to resolve {host}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Handshake with {host} failed: {reason}")]
    Handshake { host: String, reason: String },

    // =========================================================================
    // Protocol
    // =========================================================================
    #[error("Malformed protocol message: {0}")]
    ProtocolParse(String),

    #[error("Protocol anomaly: {0}")]
    ProtocolAnomaly(String),

    // =========================================================================
    // Established session
    // =========================================================================
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Session closed")]
    Closed,
}

impl SessionError {
    /// Build a transport error from anything displayable
    pub fn transport(err: impl fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// Build a handshake error for `host`
    pub fn handshake(host: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Handshake {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Resolution { .. } => ErrorKind::Resolution,
            Self::Connect { .. } => ErrorKind::Connect,
            Self::Handshake { .. } => ErrorKind::Handshake,
            Self::ProtocolParse(_) => ErrorKind::ProtocolParse,
            Self::ProtocolAnomaly(_) => ErrorKind::ProtocolAnomaly,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Closed => ErrorKind::Closed,
        }
    }

    /// Get an error code string for structured logs
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Resolution => "RESOLUTION_ERROR",
            ErrorKind::Connect => "CONNECT_ERROR",
            ErrorKind::Handshake => "HANDSHAKE_ERROR",
            ErrorKind::ProtocolParse => "PROTOCOL_PARSE_ERROR",
            ErrorKind::ProtocolAnomaly => "PROTOCOL_ANOMALY",
            ErrorKind::Transport => "TRANSPORT_ERROR",
            ErrorKind::Closed => "SESSION_CLOSED",
        }
    }

    /// Whether the error ends the current session
    ///
    /// Parse errors and anomalies are logged and the session keeps running.
    pub fn is_session_fatal(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::ProtocolParse | ErrorKind::ProtocolAnomaly
        )
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = SessionError::Resolution {
            host: "irc.example.org".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such host"),
        };
        assert_eq!(err.code(), "RESOLUTION_ERROR");
        assert_eq!(SessionError::Closed.code(), "SESSION_CLOSED");
        assert_eq!(
            SessionError::handshake("gateway", "bad certificate").code(),
            "HANDSHAKE_ERROR"
        );
    }

    #[test]
    fn test_parse_errors_are_not_fatal() {
        assert!(!SessionError::ProtocolParse("garbage".into()).is_session_fatal());
        assert!(!SessionError::ProtocolAnomaly("extra ack".into()).is_session_fatal());
        assert!(SessionError::transport("reset by peer").is_session_fatal());
        assert!(SessionError::Closed.is_session_fatal());
    }

    #[test]
    fn test_display_includes_context() {
        let err = SessionError::Connect {
            host: "irc.example.org".into(),
            port: 6697,
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to connect to irc.example.org:6697: refused"
        );
    }
}
