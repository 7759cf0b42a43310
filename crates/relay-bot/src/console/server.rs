use bytes::Bytes;
use futures_util::StreamExt;
use relay_common::{AppError, AppResult, ConsoleSettings};
use relay_core::{LineCodec, RuntimeContext, WriteQueue};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{BytesCodec, FramedRead, FramedWrite};

use super::{CommandTable, GREETING, PROMPT};

/// Listening console
#[derive(Debug)]
pub struct ConsoleServer {
    listener: TcpListener,
    commands: Arc<CommandTable>,
}

impl ConsoleServer {
    pub async fn bind(settings: &ConsoleSettings, commands: CommandTable) -> AppResult<Self> {
        let address = settings.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| AppError::console(format!("cannot listen on {address}: {e}")))?;

        Ok(Self {
            listener,
            commands: Arc::new(commands),
        })
    }

    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until shutdown
    pub async fn run(self, ctx: RuntimeContext) {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(addr = %addr, "Console listening");
        }

        loop {
            tokio::select! {
                () = ctx.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(serve(stream, peer, self.commands.clone(), ctx.clone()));
                    }
                    Err(e) => tracing::warn!(error = %e, "Console accept failed"),
                },
            }
        }

        tracing::info!("Console stopped");
    }
}

async fn serve(stream: TcpStream, peer: SocketAddr, commands: Arc<CommandTable>, ctx: RuntimeContext) {
    tracing::info!(peer = %peer, "Console client connected");

    let (reader, writer) = stream.into_split();
    let (queue, mut failures) =
        WriteQueue::spawn("console", FramedWrite::new(writer, BytesCodec::new()));
    let write = |text: &str| queue.enqueue(Bytes::copy_from_slice(text.as_bytes())).is_ok();

    write(GREETING);
    write(PROMPT);

    let mut lines = FramedRead::new(reader, LineCodec::new());
    loop {
        tokio::select! {
            () = ctx.cancelled() => break,
            _ = failures.recv() => break,
            line = lines.next() => match line {
                Some(Ok(line)) => {
                    for reply in commands.execute(&line) {
                        write(&format!("{reply}\n"));
                    }
                    if !write(PROMPT) {
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::debug!(peer = %peer, error = %e, "Console read failed");
                    break;
                }
                None => break,
            },
        }
    }

    tracing::info!(peer = %peer, "Console client disconnected");
}
