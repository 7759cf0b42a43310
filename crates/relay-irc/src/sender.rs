//! Outbound line helpers
//!
//! Every helper formats one protocol line, appends CRLF, and enqueues it on
//! the session's write queue. Nothing here awaits the network.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use relay_core::{SessionError, SessionResult, WriteQueue};

/// Write access to one live session
#[derive(Debug, Clone)]
pub struct IrcSender {
    queue: WriteQueue<Bytes>,
}

impl IrcSender {
    pub fn new(queue: WriteQueue<Bytes>) -> Self {
        Self { queue }
    }

    /// Send one raw line; embedded line breaks are cut off
    pub fn send_line(&self, line: &str) -> SessionResult<()> {
        let line = single_line(line);
        tracing::debug!("> {line}");
        self.enqueue(line)
    }

    pub fn join(&self, channel: &str) -> SessionResult<()> {
        self.send_line(&format!("JOIN {channel}"))
    }

    pub fn part(&self, channel: &str) -> SessionResult<()> {
        self.send_line(&format!("PART {channel}"))
    }

    /// Send `text` to a channel or nick
    pub fn say(&self, target: &str, text: &str) -> SessionResult<()> {
        self.send_line(&format!("PRIVMSG {target} :{text}"))
    }

    pub fn pong(&self, token: &str) -> SessionResult<()> {
        self.send_line(&format!("PONG :{token}"))
    }

    pub fn nick(&self, nick: &str) -> SessionResult<()> {
        self.send_line(&format!("NICK {nick}"))
    }

    /// Send the connection password; the secret is masked in the logs
    /// An empty password goes out as an empty trailing parameter
    pub fn pass(&self, pass: &str) -> SessionResult<()> {
        let pass = single_line(pass);
        let line = if pass.is_empty() {
            "PASS :".to_string()
        } else {
            format!("PASS {pass}")
        };
        tracing::debug!("> PASS ********");
        self.enqueue(&line)
    }

    pub fn quit(&self, reason: &str) -> SessionResult<()> {
        self.send_line(&format!("QUIT :{reason}"))
    }

    fn enqueue(&self, line: &str) -> SessionResult<()> {
        let mut wire = String::with_capacity(line.len() + 2);
        wire.push_str(line);
        wire.push_str("\r\n");
        self.queue.enqueue(Bytes::from(wire))
    }
}

fn single_line(line: &str) -> &str {
    match line.find(['\r', '\n']) {
        Some(end) => {
            tracing::warn!("Outbound line contained a line break, truncating");
            &line[..end]
        }
        None => line,
    }
}

/// Stable handle to whichever session is currently live
///
/// The client swaps the sender in and out as sessions come and go, so holders
/// (the console, other tasks) never keep a dead session's queue alive.
#[derive(Debug, Clone, Default)]
pub struct IrcHandle {
    current: Arc<RwLock<Option<IrcSender>>>,
}

impl IrcHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&self, sender: IrcSender) {
        *self.current.write() = Some(sender);
    }

    pub(crate) fn detach(&self) {
        self.current.write().take();
    }

    pub fn is_connected(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn send_line(&self, line: &str) -> SessionResult<()> {
        self.with_sender(|sender| sender.send_line(line))
    }

    pub fn join(&self, channel: &str) -> SessionResult<()> {
        self.with_sender(|sender| sender.join(channel))
    }

    pub fn say(&self, target: &str, text: &str) -> SessionResult<()> {
        self.with_sender(|sender| sender.say(target, text))
    }

    fn with_sender<F>(&self, f: F) -> SessionResult<()>
    where
        F: FnOnce(&IrcSender) -> SessionResult<()>,
    {
        match self.current.read().as_ref() {
            Some(sender) => f(sender),
            None => Err(SessionError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::sink::drain;

    #[tokio::test]
    async fn test_detached_handle_reports_closed() {
        let handle = IrcHandle::new();
        assert!(!handle.is_connected());
        assert!(matches!(handle.say("#rust", "hi"), Err(SessionError::Closed)));

        let (queue, _failures) = WriteQueue::spawn("test", drain());
        handle.attach(IrcSender::new(queue));
        assert!(handle.is_connected());
        assert!(handle.join("#rust").is_ok());

        handle.detach();
        assert!(matches!(handle.join("#rust"), Err(SessionError::Closed)));
    }

    #[test]
    fn test_line_breaks_are_cut() {
        assert_eq!(single_line("PRIVMSG #a :hi\r\nQUIT"), "PRIVMSG #a :hi");
        assert_eq!(single_line("JOIN #a"), "JOIN #a");
    }
}
