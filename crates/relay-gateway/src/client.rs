//! Reconnecting gateway client
//!
//! One loop per process: discover the endpoint (once), connect, run a session
//! until it ends, then reconnect with Resume or Identify as the session's end
//! dictates. Protocol decisions live in [`Shard`]; this module only moves
//! frames and timers.

use futures_util::StreamExt;
use relay_common::DiscordSettings;
use relay_core::{
    Connector, Lifecycle, MaybeTlsStream, RuntimeContext, SessionError, SessionState,
    TransportMode, WriteQueue,
};
use reqwest::Url;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::USER_AGENT as USER_AGENT_HEADER;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;

use crate::error::{GatewayError, GatewayResult};
use crate::events::{EventHandlers, GatewayEvent, GatewayEventType};
use crate::heartbeat::HeartbeatTimer;
use crate::http::{DiscordHttp, GatewayEndpoint, USER_AGENT};
use crate::protocol::{CloseCode, Intents, API_VERSION};
use crate::shard::{Action, Shard};

/// Close code that tells the server the session should stay resumable
const RESUMABLE_CLOSE: u16 = 4000;

/// How a session ended, and what the client does next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Shutdown was requested
    Shutdown,
    /// Open a new connection, resuming when `resume` is set
    Reconnect { resume: bool, delay: bool },
    /// The server refused the session for good
    Fatal { code: u16, reason: String },
}

/// Gateway client for one bot token
#[derive(Debug)]
pub struct GatewayClient {
    http: DiscordHttp,
    connector: Connector,
    endpoint: Option<GatewayEndpoint>,
    shard: Shard,
    handlers: EventHandlers,
    lifecycle: Lifecycle,
    reconnect_delay: Duration,
}

impl GatewayClient {
    pub fn new(settings: &DiscordSettings, connector: Connector) -> GatewayResult<Self> {
        let http = DiscordHttp::new(&settings.api_base, &settings.token)?;
        let intents = Intents::from_bits_retain(settings.intents);

        Ok(Self {
            http,
            connector,
            endpoint: None,
            shard: Shard::new(settings.token.clone(), intents),
            handlers: EventHandlers::new(),
            lifecycle: Lifecycle::new("gateway"),
            reconnect_delay: Duration::from_millis(settings.reconnect_delay_ms),
        })
    }

    /// Register a handler for a dispatch event
    pub fn on<F>(&mut self, kind: GatewayEventType, handler: F) -> &mut Self
    where
        F: Fn(&GatewayEvent) + Send + Sync + 'static,
    {
        self.handlers.register(kind, handler);
        self
    }

    /// REST client sharing this client's credentials
    pub fn http(&self) -> &DiscordHttp {
        &self.http
    }

    pub fn shard(&self) -> &Shard {
        &self.shard
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    pub fn endpoint(&self) -> Option<&GatewayEndpoint> {
        self.endpoint.as_ref()
    }

    /// Drop the cached endpoint; the next connect rediscovers it
    pub fn invalidate_endpoint(&mut self) {
        self.endpoint = None;
    }

    /// Connect and keep the session alive until shutdown or a fatal close
    pub async fn run(mut self, ctx: RuntimeContext) -> GatewayResult<()> {
        tracing::info!(api = %self.http.base(), "Gateway client starting");
        let mut delay = false;

        let result = loop {
            if delay && !pause(&ctx, self.reconnect_delay).await {
                break Ok(());
            }
            if ctx.is_shutdown() {
                break Ok(());
            }

            let url = tokio::select! {
                () = ctx.cancelled() => break Ok(()),
                endpoint = self.ensure_endpoint() => match endpoint {
                    Ok(url) => url,
                    Err(e) => {
                        tracing::warn!(code = e.code(), error = %e, "Gateway discovery failed");
                        delay = true;
                        continue;
                    }
                },
            };

            let connected = tokio::select! {
                () = ctx.cancelled() => break Ok(()),
                ws = self.connect(&url) => ws,
            };

            let ws = match connected {
                Ok(ws) => ws,
                Err(e) => {
                    tracing::warn!(code = e.code(), error = %e, "Gateway connection failed");
                    delay = true;
                    continue;
                }
            };

            match self.run_session(ws, &ctx).await {
                SessionOutcome::Shutdown => break Ok(()),
                SessionOutcome::Reconnect { resume, delay: wait } => {
                    if !resume {
                        self.shard.reset();
                    }
                    tracing::info!(resume, delay = wait, "Reconnecting to gateway");
                    delay = wait;
                }
                SessionOutcome::Fatal { code, reason } => {
                    tracing::error!(code, reason = %reason, "Gateway refused the session");
                    break Err(GatewayError::Rejected { code, reason });
                }
            }
        };

        self.lifecycle.finish_close();
        tracing::info!("Gateway client stopped");
        result
    }

    /// URL for the next connect: the resume URL when resuming, else the endpoint
    async fn ensure_endpoint(&mut self) -> GatewayResult<String> {
        if self.shard.can_resume() {
            if let Some(url) = self.shard.resume_url() {
                return Ok(url.to_string());
            }
        }

        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.url.clone());
        }

        let endpoint = self.http.get_gateway_bot().await?;
        let url = endpoint.url.clone();
        self.endpoint = Some(endpoint);
        Ok(url)
    }

    async fn connect(&mut self, url: &str) -> GatewayResult<WebSocketStream<MaybeTlsStream>> {
        let mut target = Url::parse(url).map_err(|e| GatewayError::invalid_url(url, e))?;
        let mode = match target.scheme() {
            "wss" => TransportMode::Tls,
            "ws" => TransportMode::Plain,
            other => {
                return Err(GatewayError::invalid_url(
                    url,
                    format!("unsupported scheme {other}"),
                ))
            }
        };
        let host = target
            .host_str()
            .ok_or_else(|| GatewayError::invalid_url(url, "missing host"))?
            .to_string();
        let port = target
            .port_or_known_default()
            .ok_or_else(|| GatewayError::invalid_url(url, "missing port"))?;

        target
            .query_pairs_mut()
            .clear()
            .append_pair("v", &API_VERSION.to_string())
            .append_pair("encoding", "json");

        let stream = self
            .connector
            .connect(&host, port, mode, &mut self.lifecycle)
            .await?;

        match upgrade(target.as_str(), stream).await {
            Ok(ws) => {
                self.lifecycle.transition(SessionState::ProtocolAuthenticating);
                Ok(ws)
            }
            Err(e) => {
                let err = SessionError::handshake(host, e);
                self.lifecycle.fail(&err);
                Err(err.into())
            }
        }
    }

    /// Run one session over an upgraded websocket
    pub async fn run_session<S>(&mut self, ws: WebSocketStream<S>, ctx: &RuntimeContext) -> SessionOutcome
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        if self.lifecycle.state() == SessionState::Disconnected {
            self.lifecycle.adopt();
        }
        if self.lifecycle.state() == SessionState::Handshaking {
            self.lifecycle.transition(SessionState::ProtocolAuthenticating);
        }
        self.shard.begin_connection();

        let (sink, mut frames) = ws.split();
        let (queue, mut failures) = WriteQueue::spawn("gateway", sink);
        let mut heartbeat = HeartbeatTimer::new();

        let outcome = loop {
            let step = tokio::select! {
                () = ctx.cancelled() => Some(SessionOutcome::Shutdown),
                err = failures.recv() => Some(self.lost(&err)),
                () = heartbeat.tick() => {
                    let action = self.shard.heartbeat_due();
                    self.apply(vec![action], &queue, &mut heartbeat)
                }
                frame = frames.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        let actions = self.shard.handle_text(&text);
                        self.apply(actions, &queue, &mut heartbeat)
                    }
                    Some(Ok(Message::Binary(data))) => {
                        tracing::warn!(len = data.len(), "Ignoring binary gateway frame");
                        None
                    }
                    Some(Ok(Message::Close(frame))) => Some(self.closed_by_server(frame.as_ref())),
                    Some(Ok(_)) => None,
                    Some(Err(e)) => Some(self.lost(&SessionError::transport(e))),
                    None => Some(self.lost(&SessionError::transport("connection closed by gateway"))),
                },
            };

            if let Some(outcome) = step {
                break outcome;
            }
        };

        heartbeat.stop();

        // Only a transport we still own gets a close frame
        if self.lifecycle.begin_close() {
            let code = match &outcome {
                SessionOutcome::Reconnect { resume: true, .. } => {
                    WsCloseCode::Library(RESUMABLE_CLOSE)
                }
                _ => WsCloseCode::Normal,
            };
            let frame = CloseFrame {
                code,
                reason: "".into(),
            };
            if let Err(e) = queue.enqueue(Message::Close(Some(frame))) {
                tracing::debug!(error = %e, "Close frame not sent");
            }
        }
        drop(queue);
        self.lifecycle.finish_close();

        outcome
    }

    fn apply(
        &mut self,
        actions: Vec<Action>,
        queue: &WriteQueue<Message>,
        heartbeat: &mut HeartbeatTimer,
    ) -> Option<SessionOutcome> {
        for action in actions {
            match action {
                Action::Send(message) => {
                    let json = match message.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::warn!(op = %message.op, error = %e, "Failed to encode frame");
                            continue;
                        }
                    };
                    tracing::trace!(op = %message.op, "> gateway");
                    if let Err(e) = queue.enqueue(Message::Text(json)) {
                        return Some(self.lost(&e));
                    }
                }
                Action::StartHeartbeat(period) => {
                    tracing::debug!(interval_ms = period.as_millis() as u64, "Heartbeat armed");
                    heartbeat.start(period);
                }
                Action::Dispatch(event) => {
                    if (event.is(GatewayEventType::Ready) || event.is(GatewayEventType::Resumed))
                        && self.lifecycle.state() == SessionState::ProtocolAuthenticating
                    {
                        self.lifecycle.transition(SessionState::Ready);
                    }
                    self.handlers.dispatch(&event);
                }
                Action::Reconnect { resume } => {
                    return Some(SessionOutcome::Reconnect {
                        resume,
                        delay: false,
                    });
                }
                Action::Zombie { unacked } => {
                    tracing::warn!(unacked, "Heartbeats unacknowledged, dropping connection");
                    return Some(SessionOutcome::Reconnect {
                        resume: true,
                        delay: true,
                    });
                }
            }
        }
        None
    }

    /// Transport is gone; resume after the reconnect delay
    fn lost(&mut self, err: &SessionError) -> SessionOutcome {
        self.lifecycle.fail(err);
        SessionOutcome::Reconnect {
            resume: true,
            delay: true,
        }
    }

    fn closed_by_server(&mut self, frame: Option<&CloseFrame<'_>>) -> SessionOutcome {
        let (raw, reason) = frame.map_or((1005, String::new()), |f| {
            (u16::from(f.code), f.reason.to_string())
        });
        self.lifecycle
            .fail(&SessionError::transport(format!("closed by gateway ({raw}) {reason}")));

        match CloseCode::from_u16(raw) {
            Some(code) if !code.should_reconnect() => SessionOutcome::Fatal {
                code: raw,
                reason: code.description().to_string(),
            },
            Some(code) => SessionOutcome::Reconnect {
                resume: code.allows_resume(),
                delay: true,
            },
            None => SessionOutcome::Reconnect {
                resume: true,
                delay: true,
            },
        }
    }
}

async fn upgrade(
    url: &str,
    stream: MaybeTlsStream,
) -> Result<WebSocketStream<MaybeTlsStream>, tungstenite::Error> {
    let mut request = url.into_client_request()?;
    request
        .headers_mut()
        .insert(USER_AGENT_HEADER, HeaderValue::from_static(USER_AGENT));
    let (ws, _response) = tokio_tungstenite::client_async(request, stream).await?;
    Ok(ws)
}

/// Sleep unless shutdown comes first; `false` means shut down
async fn pause(ctx: &RuntimeContext, delay: Duration) -> bool {
    tokio::select! {
        () = ctx.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}
