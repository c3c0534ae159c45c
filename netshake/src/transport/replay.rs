//! Scripted in-memory transport for offline handshake tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::trace;

use super::Transport;
use crate::error::TransportError;

#[derive(Debug, Clone)]
enum Step {
    /// Deliver bytes on the next receive.
    Emit(Vec<u8>),
    /// Hold further output until the session has sent these bytes.
    Await(Vec<u8>),
    /// Peer hangs up.
    Close,
}

/// Everything a session wrote to a [`ReplayTransport`].
#[derive(Debug, Clone, Default)]
pub struct SentLog {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SentLog {
    fn push(&self, data: &[u8]) {
        if let Ok(mut sent) = self.inner.lock() {
            sent.extend_from_slice(data);
        }
    }

    /// All bytes sent so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// All bytes sent so far as a string (lossy UTF-8).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }
}

/// A fake device that replays a fixed dialogue.
///
/// Output is emitted step by step; an `await_send` step blocks further
/// output until the session writes exactly those bytes, so the script stays
/// in lockstep with the handshake. Writes made while no await step is next
/// are only recorded. Once the script runs dry, receives time out like an
/// idle device.
///
/// ```rust
/// use netshake::transport::ReplayTransport;
///
/// let transport = ReplayTransport::new()
///     .emit("\r\nUsername:")
///     .await_send("admin\r")
///     .emit("\r\nPassword:");
/// ```
#[derive(Debug, Default)]
pub struct ReplayTransport {
    steps: VecDeque<Step>,
    pending_send: Vec<u8>,
    sent: SentLog,
    open: bool,
}

impl ReplayTransport {
    /// Create an empty script.
    pub fn new() -> Self {
        Self {
            open: true,
            ..Default::default()
        }
    }

    /// Queue output from the device.
    pub fn emit(mut self, data: impl AsRef<[u8]>) -> Self {
        self.steps.push_back(Step::Emit(data.as_ref().to_vec()));
        self
    }

    /// Wait for the session to send `data` before emitting more.
    pub fn await_send(mut self, data: impl AsRef<[u8]>) -> Self {
        self.steps.push_back(Step::Await(data.as_ref().to_vec()));
        self
    }

    /// Hang up once this step is reached.
    pub fn close_after(mut self) -> Self {
        self.steps.push_back(Step::Close);
        self
    }

    /// Handle on the bytes the session sends.
    pub fn sent_log(&self) -> SentLog {
        self.sent.clone()
    }

    /// Match pending sent bytes against leading await steps.
    fn settle_awaits(&mut self) -> Result<(), TransportError> {
        while let Some(Step::Await(expected)) = self.steps.front() {
            if self.pending_send.len() < expected.len() {
                if !expected.starts_with(&self.pending_send) {
                    return Err(self.mismatch(expected));
                }
                return Ok(());
            }
            if !self.pending_send.starts_with(expected) {
                return Err(self.mismatch(expected));
            }
            let consumed = expected.len();
            self.pending_send.drain(..consumed);
            self.steps.pop_front();
        }
        Ok(())
    }

    fn mismatch(&self, expected: &[u8]) -> TransportError {
        TransportError::ReplayMismatch(format!(
            "expected {:?}, got {:?}",
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(&self.pending_send)
        ))
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Disconnected);
        }
        self.sent.push(data);
        // unscripted writes are logged but not checked
        if matches!(self.steps.front(), Some(Step::Await(_))) {
            self.pending_send.extend_from_slice(data);
        }
        self.settle_awaits()
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        if !self.open {
            return Err(TransportError::Disconnected);
        }
        match self.steps.pop_front() {
            Some(Step::Emit(data)) => {
                trace!("replay emit {:?}", String::from_utf8_lossy(&data));
                Ok(data)
            }
            Some(Step::Close) => {
                self.open = false;
                Err(TransportError::Disconnected)
            }
            Some(step @ Step::Await(_)) => {
                self.steps.push_front(step);
                tokio::time::sleep(timeout).await;
                Err(TransportError::Timeout(timeout))
            }
            None => {
                tokio::time::sleep(timeout).await;
                Err(TransportError::Timeout(timeout))
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emits_in_order() {
        let mut transport = ReplayTransport::new().emit("one").emit("two");
        let timeout = Duration::from_millis(10);
        assert_eq!(transport.receive(timeout).await.unwrap(), b"one");
        assert_eq!(transport.receive(timeout).await.unwrap(), b"two");
        assert!(matches!(
            transport.receive(timeout).await,
            Err(TransportError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_await_gates_output() {
        let mut transport = ReplayTransport::new()
            .await_send("admin\r")
            .emit("Password:");
        let timeout = Duration::from_millis(10);
        assert!(transport.receive(timeout).await.is_err());

        transport.send(b"adm").await.unwrap();
        transport.send(b"in\r").await.unwrap();
        assert_eq!(transport.receive(timeout).await.unwrap(), b"Password:");
        assert_eq!(transport.sent_log().text(), "admin\r");
    }

    #[tokio::test]
    async fn test_unexpected_send_is_mismatch() {
        let mut transport = ReplayTransport::new().await_send("admin\r");
        let err = transport.send(b"root\r").await.unwrap_err();
        assert!(matches!(err, TransportError::ReplayMismatch(_)));
    }

    #[tokio::test]
    async fn test_close_step_disconnects() {
        let mut transport = ReplayTransport::new().emit("bye").close_after();
        let timeout = Duration::from_millis(10);
        transport.receive(timeout).await.unwrap();
        assert!(matches!(
            transport.receive(timeout).await,
            Err(TransportError::Disconnected)
        ));
        assert!(!transport.is_open());
    }
}
