//! Staged connection establishment driving the session lifecycle

use std::net::SocketAddr;
use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::{lookup_host, TcpStream};
use tokio_rustls::TlsConnector;

use super::stream::MaybeTlsStream;
use super::tls::client_config;
use crate::error::{SessionError, SessionResult};
use crate::session::{Lifecycle, SessionState};

/// Whether to layer TLS over the TCP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Plain,
    Tls,
}

impl TransportMode {
    pub fn from_tls_flag(tls: bool) -> Self {
        if tls {
            Self::Tls
        } else {
            Self::Plain
        }
    }
}

/// Opens transports; one instance is shared by every client of the agent
#[derive(Clone)]
pub struct Connector {
    tls: TlsConnector,
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector").finish_non_exhaustive()
    }
}

impl Connector {
    /// Connector verifying TLS peers against the bundled root certificates
    pub fn new() -> Result<Self, rustls::Error> {
        Ok(Self {
            tls: TlsConnector::from(Arc::new(client_config()?)),
        })
    }

    /// Resolve, connect, and (for `TransportMode::Tls`) handshake with `host:port`
    ///
    /// Walks `lifecycle` through `Resolving`, `Connecting` and `Handshaking`.
    /// On failure the lifecycle is back at `Disconnected` and the error names
    /// the stage that failed.
    pub async fn connect(
        &self,
        host: &str,
        port: u16,
        mode: TransportMode,
        lifecycle: &mut Lifecycle,
    ) -> SessionResult<MaybeTlsStream> {
        let result = self.establish(host, port, mode, lifecycle).await;
        if let Err(e) = &result {
            lifecycle.fail(e);
        }
        result
    }

    async fn establish(
        &self,
        host: &str,
        port: u16,
        mode: TransportMode,
        lifecycle: &mut Lifecycle,
    ) -> SessionResult<MaybeTlsStream> {
        lifecycle.transition(SessionState::Resolving);
        let addrs = resolve(host, port).await?;

        lifecycle.transition(SessionState::Connecting);
        let tcp = connect_any(host, port, &addrs).await?;

        lifecycle.transition(SessionState::Handshaking);
        match mode {
            TransportMode::Plain => Ok(MaybeTlsStream::Plain(tcp)),
            TransportMode::Tls => self.handshake(host, tcp).await,
        }
    }

    async fn handshake(&self, host: &str, tcp: TcpStream) -> SessionResult<MaybeTlsStream> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| SessionError::handshake(host, e))?;

        let tls = self
            .tls
            .connect(server_name, tcp)
            .await
            .map_err(|e| SessionError::handshake(host, e))?;

        if let Some(version) = tls.get_ref().1.protocol_version() {
            tracing::debug!(host, version = ?version, "TLS established");
        }
        Ok(MaybeTlsStream::Tls(Box::new(tls)))
    }
}

async fn resolve(host: &str, port: u16) -> SessionResult<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(|source| SessionError::Resolution {
            host: host.to_string(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(SessionError::Resolution {
            host: host.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses"),
        });
    }

    tracing::debug!(host, count = addrs.len(), "Resolved");
    Ok(addrs)
}

/// Try each resolved address in turn, keeping the last failure
async fn connect_any(host: &str, port: u16, addrs: &[SocketAddr]) -> SessionResult<TcpStream> {
    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(tcp) => {
                // Line and frame protocols send small writes that must not be delayed
                if let Err(e) = tcp.set_nodelay(true) {
                    tracing::debug!(%addr, error = %e, "Failed to set TCP_NODELAY");
                }
                tracing::debug!(host, %addr, "Connected");
                return Ok(tcp);
            }
            Err(e) => {
                tracing::debug!(host, %addr, error = %e, "Connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(SessionError::Connect {
        host: host.to_string(),
        port,
        source: last_error.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses")
        }),
    })
}
