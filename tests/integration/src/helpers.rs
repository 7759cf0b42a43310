//! Fake servers

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use relay_gateway::GatewayMessage;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Upper bound for any single wait in a test
pub const WAIT: Duration = Duration::from_secs(10);

async fn within<T>(what: &str, fut: impl std::future::Future<Output = T>) -> Result<T> {
    tokio::time::timeout(WAIT, fut)
        .await
        .map_err(|_| anyhow!("timed out waiting for {what}"))
}

// ============================================================================
// Line protocol
// ============================================================================

/// Line-protocol server on loopback
pub struct FakeIrcServer {
    listener: TcpListener,
}

impl FakeIrcServer {
    pub async fn start() -> Result<Self> {
        Ok(Self {
            listener: TcpListener::bind("127.0.0.1:0").await?,
        })
    }

    pub fn port(&self) -> u16 {
        self.listener.local_addr().map(|a| a.port()).unwrap_or_default()
    }

    pub async fn accept(&self) -> Result<IrcPeer> {
        let (stream, _) = within("an IRC connection", self.listener.accept()).await??;
        let (reader, writer) = stream.into_split();
        Ok(IrcPeer {
            reader: BufReader::new(reader),
            writer,
        })
    }
}

/// Server side of one line-protocol connection
pub struct IrcPeer {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl IrcPeer {
    /// Next line from the client, without the line terminator
    pub async fn next_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = within("a line", self.reader.read_line(&mut line)).await??;
        if read == 0 {
            bail!("client closed the connection");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Skip lines until one equals `expected`
    pub async fn expect_line(&mut self, expected: &str) -> Result<()> {
        loop {
            let line = self.next_line().await?;
            if line == expected {
                return Ok(());
            }
        }
    }

    pub async fn send(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(format!("{line}\r\n").as_bytes()).await?;
        Ok(())
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Gateway websocket server on loopback
pub struct FakeGateway {
    listener: TcpListener,
}

impl FakeGateway {
    pub async fn start() -> Result<Self> {
        Ok(Self {
            listener: TcpListener::bind("127.0.0.1:0").await?,
        })
    }

    pub fn url(&self) -> String {
        let port = self.listener.local_addr().map(|a| a.port()).unwrap_or_default();
        format!("ws://127.0.0.1:{port}")
    }

    /// Accept one websocket client, recording its upgrade request
    pub async fn accept(&self) -> Result<GatewayPeer> {
        let (stream, _) = within("a gateway connection", self.listener.accept()).await??;

        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        let callback = move |request: &Request, response: Response| {
            let user_agent = request
                .headers()
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            if let Ok(mut slot) = record.lock() {
                *slot = Some((request.uri().to_string(), user_agent));
            }
            Ok::<Response, ErrorResponse>(response)
        };

        let ws = within(
            "the websocket upgrade",
            tokio_tungstenite::accept_hdr_async(stream, callback),
        )
        .await??;
        let (uri, user_agent) = seen
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .context("upgrade request not recorded")?;

        Ok(GatewayPeer { ws, uri, user_agent })
    }
}

/// Server side of one gateway connection
pub struct GatewayPeer {
    ws: WebSocketStream<TcpStream>,
    /// Request target of the upgrade, including the query string
    pub uri: String,
    pub user_agent: String,
}

impl GatewayPeer {
    pub async fn send(&mut self, message: &GatewayMessage) -> Result<()> {
        self.ws.send(Message::Text(message.to_json()?)).await?;
        Ok(())
    }

    /// Next frame, ignoring control frames tungstenite answers itself
    pub async fn next_frame(&mut self) -> Result<Message> {
        loop {
            let frame = within("a gateway frame", self.ws.next())
                .await?
                .context("client closed the stream")??;
            if !matches!(frame, Message::Ping(_) | Message::Pong(_)) {
                return Ok(frame);
            }
        }
    }

    pub async fn recv(&mut self) -> Result<GatewayMessage> {
        match self.next_frame().await? {
            Message::Text(text) => Ok(GatewayMessage::from_json(&text)?),
            other => bail!("expected a text frame, got {other:?}"),
        }
    }

    /// Wait for the client's close frame
    pub async fn expect_close(&mut self) -> Result<Option<CloseFrame<'static>>> {
        loop {
            match self.next_frame().await? {
                Message::Close(frame) => return Ok(frame),
                Message::Text(_) => {}
                other => bail!("expected a close frame, got {other:?}"),
            }
        }
    }

    pub async fn close(&mut self, frame: CloseFrame<'static>) -> Result<()> {
        self.ws.close(Some(frame)).await?;
        Ok(())
    }
}

/// REST mock answering `GET /gateway/bot` with `gateway_url`, exactly once
pub async fn mock_discovery(gateway_url: &str, token: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gateway/bot"))
        .and(header("authorization", format!("Bot {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": gateway_url,
            "shards": 1,
            "session_start_limit": {
                "total": 1000,
                "remaining": 999,
                "reset_after": 14_400_000,
                "max_concurrency": 1
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    server
}
