//! Lifecycle state machine shared by both protocol adapters
//!
//! ```text
//! Disconnected -> Resolving -> Connecting -> Handshaking
//!     -> ProtocolAuthenticating -> Ready -> Closing -> Disconnected
//! ```
//!
//! Any failure drops straight back to `Disconnected`. Adapters without an
//! authentication gate go from `Handshaking` directly to `Ready`.

use std::fmt;

use crate::error::SessionError;

/// Where a session currently is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Resolving,
    Connecting,
    Handshaking,
    ProtocolAuthenticating,
    Ready,
    Closing,
}

impl SessionState {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Resolving => "Resolving",
            Self::Connecting => "Connecting",
            Self::Handshaking => "Handshaking",
            Self::ProtocolAuthenticating => "ProtocolAuthenticating",
            Self::Ready => "Ready",
            Self::Closing => "Closing",
        }
    }

    /// Check whether `next` is reachable from this state in one step
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            // Failure and completed close both land here
            (Self::Disconnected, Self::Disconnected) => false,
            (_, Self::Disconnected) => true,

            (Self::Disconnected, Self::Resolving)
            | (Self::Resolving, Self::Connecting)
            | (Self::Connecting, Self::Handshaking)
            | (Self::Handshaking, Self::ProtocolAuthenticating | Self::Ready)
            | (Self::ProtocolAuthenticating, Self::Ready) => true,

            (
                Self::Resolving
                | Self::Connecting
                | Self::Handshaking
                | Self::ProtocolAuthenticating
                | Self::Ready,
                Self::Closing,
            ) => true,

            _ => false,
        }
    }

    /// A transport exists or is being built
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Disconnected | Self::Closing)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks one client's session state and logs every transition
#[derive(Debug)]
pub struct Lifecycle {
    client: &'static str,
    state: SessionState,
    attempts: u64,
}

impl Lifecycle {
    pub fn new(client: &'static str) -> Self {
        Self {
            client,
            state: SessionState::Disconnected,
            attempts: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of connection attempts started so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Move to `next`; rejected transitions are logged and leave the state unchanged
    pub fn transition(&mut self, next: SessionState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                client = self.client,
                from = %self.state,
                to = %next,
                "Rejected session state transition"
            );
            return false;
        }

        tracing::debug!(client = self.client, from = %self.state, to = %next, "Session state");
        if next == SessionState::Resolving {
            self.attempts += 1;
        }
        self.state = next;
        true
    }

    /// Adopt a transport that was established outside the connector
    ///
    /// The session enters at `Handshaking`, as if resolution and connect had succeeded.
    pub fn adopt(&mut self) {
        if self.state != SessionState::Disconnected {
            self.fail_silently();
        }
        self.attempts += 1;
        tracing::debug!(client = self.client, to = %SessionState::Handshaking, "Adopted transport");
        self.state = SessionState::Handshaking;
    }

    /// Begin an orderly close
    ///
    /// Returns `false` when a close is already underway or nothing is open, in
    /// which case the caller must not tear anything down a second time.
    pub fn begin_close(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.transition(SessionState::Closing)
    }

    /// Drop back to `Disconnected` after `err`
    pub fn fail(&mut self, err: &SessionError) {
        tracing::warn!(
            client = self.client,
            state = %self.state,
            code = err.code(),
            error = %err,
            "Session failed"
        );
        self.fail_silently();
    }

    /// Finish a close started with [`Lifecycle::begin_close`]
    pub fn finish_close(&mut self) {
        if self.state != SessionState::Disconnected {
            self.transition(SessionState::Disconnected);
        }
    }

    fn fail_silently(&mut self) {
        self.state = SessionState::Disconnected;
    }
}
