//! Reconnecting line-protocol client
//!
//! Each session: connect, send credentials, then read lines until the
//! transport fails or shutdown is requested. Any transport failure starts a
//! new session straight away; retries are unbounded.

use futures_util::StreamExt;
use relay_common::TwitchSettings;
use relay_core::{
    Connector, LineCodec, Lifecycle, RuntimeContext, SessionError, SessionResult, SessionState,
    TransportMode, WriteFailures, WriteQueue,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{BytesCodec, FramedRead, FramedWrite};

use crate::handlers::HandlerTable;
use crate::message::{IrcMessage, ParseError};
use crate::sender::{IrcHandle, IrcSender};

/// Why a session ended
#[derive(Debug)]
pub enum SessionEnd {
    /// Shutdown was requested; the client stops
    Shutdown,
    /// The transport failed; the client reconnects
    Lost(SessionError),
}

/// Client for one line-protocol server
#[derive(Debug)]
pub struct IrcClient {
    settings: TwitchSettings,
    connector: Connector,
    handlers: HandlerTable,
    handle: IrcHandle,
    lifecycle: Lifecycle,
}

impl IrcClient {
    pub fn new(settings: TwitchSettings, connector: Connector) -> Self {
        Self {
            settings,
            connector,
            handlers: HandlerTable::with_keepalive(),
            handle: IrcHandle::new(),
            lifecycle: Lifecycle::new("irc"),
        }
    }

    /// Register a handler for `command`, after the built-in ones
    pub fn on<F>(&mut self, command: &str, handler: F) -> &mut Self
    where
        F: Fn(&IrcSender, &IrcMessage) + Send + Sync + 'static,
    {
        self.handlers.register(command, handler);
        self
    }

    /// Handle for sending on whichever session is live
    pub fn handle(&self) -> IrcHandle {
        self.handle.clone()
    }

    pub fn settings(&self) -> &TwitchSettings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    /// Connect and keep reconnecting until `ctx` is shut down
    pub async fn run(mut self, ctx: RuntimeContext) {
        let mode = TransportMode::from_tls_flag(self.settings.tls);
        tracing::info!(
            host = %self.settings.host,
            port = self.settings.port,
            tls = self.settings.tls,
            "IRC client starting"
        );

        while !ctx.is_shutdown() {
            let connected = tokio::select! {
                () = ctx.cancelled() => break,
                result = self.connector.connect(
                    &self.settings.host,
                    self.settings.port,
                    mode,
                    &mut self.lifecycle,
                ) => result,
            };

            match connected {
                Ok(stream) => match self.run_session(stream, &ctx).await {
                    SessionEnd::Shutdown => break,
                    SessionEnd::Lost(_) => tracing::info!("Reconnecting to IRC server"),
                },
                Err(_) => tracing::info!("Retrying IRC connection"),
            }

            // Immediate retry, but let other tasks run first
            tokio::task::yield_now().await;
        }

        self.lifecycle.finish_close();
        tracing::info!("IRC client stopped");
    }

    /// Run one session over an established transport
    pub async fn run_session<S>(&mut self, stream: S, ctx: &RuntimeContext) -> SessionEnd
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        if self.lifecycle.state() == SessionState::Disconnected {
            self.lifecycle.adopt();
        }

        let (reader, writer) = tokio::io::split(stream);
        let (queue, mut failures) =
            WriteQueue::spawn("irc", FramedWrite::new(writer, BytesCodec::new()));
        let sender = IrcSender::new(queue);

        let end = match self.authenticate(&sender) {
            Ok(()) => {
                self.lifecycle.transition(SessionState::Ready);
                self.handle.attach(sender.clone());
                tracing::info!(nick = %self.settings.nick, "IRC session ready");
                self.read_lines(reader, &sender, &mut failures, ctx).await
            }
            Err(err) => SessionEnd::Lost(err),
        };

        if matches!(end, SessionEnd::Shutdown) {
            if let Err(e) = sender.quit("shutting down") {
                tracing::debug!(error = %e, "QUIT not sent");
            }
        }

        // The writer drains what is queued, then closes the transport
        self.handle.detach();
        self.lifecycle.begin_close();
        drop(sender);

        match &end {
            SessionEnd::Shutdown => self.lifecycle.finish_close(),
            SessionEnd::Lost(err) => self.lifecycle.fail(err),
        }
        end
    }

    fn authenticate(&self, sender: &IrcSender) -> SessionResult<()> {
        sender.pass(&self.settings.pass)?;
        sender.nick(&self.settings.nick)
    }

    async fn read_lines<R>(
        &self,
        reader: R,
        sender: &IrcSender,
        failures: &mut WriteFailures,
        ctx: &RuntimeContext,
    ) -> SessionEnd
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = FramedRead::new(reader, LineCodec::new());
        loop {
            tokio::select! {
                () = ctx.cancelled() => return SessionEnd::Shutdown,
                err = failures.recv() => return SessionEnd::Lost(err),
                line = lines.next() => match line {
                    Some(Ok(line)) => self.on_line(sender, &line),
                    Some(Err(e)) => return SessionEnd::Lost(SessionError::transport(e)),
                    None => {
                        return SessionEnd::Lost(SessionError::transport("connection closed by peer"))
                    }
                },
            }
        }
    }

    fn on_line(&self, sender: &IrcSender, line: &str) {
        if line.is_empty() {
            return;
        }
        tracing::debug!("< {line}");

        match IrcMessage::parse(line) {
            Ok(message) => {
                self.handlers.dispatch(sender, &message);
            }
            Err(ParseError { line }) => {
                tracing::warn!(line = %line, "Discarding malformed line");
            }
        }
    }
}
