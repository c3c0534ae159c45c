//! Stream channel: a transport plus the pattern buffer fed from it.

use std::sync::Arc;
use std::time::Duration;

use log::trace;
use tokio::sync::watch;
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use super::patterns::{MatchSpan, PatternSet, TailAnchor};
use crate::error::TransportError;
use crate::transport::Transport;

/// Configuration for stream channel behavior.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Search depth for pattern matching.
    pub search_depth: usize,

    /// Number of leading bytes kept for fingerprinting.
    pub head_size: usize,

    /// Trailing blank bytes tolerated after a prompt.
    pub trailing_tolerance: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            search_depth: 1000,
            head_size: 1024,
            trailing_tolerance: 2,
        }
    }
}

/// Cloneable handle that aborts a channel's pending and future waits.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CloseHandle {
    /// Mark the channel closed; any pending wait fails with
    /// [`TransportError::Disconnected`].
    pub fn close(&self) {
        self.tx.send_replace(true);
    }

    /// Whether close was requested.
    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Channel over a transport with prompt-aware reads.
pub struct StreamChannel {
    transport: Box<dyn Transport>,
    buffer: PatternBuffer,
    anchor: TailAnchor,
    close_handle: CloseHandle,
    closed: watch::Receiver<bool>,
}

impl StreamChannel {
    /// Create a channel over a transport.
    pub fn new(transport: Box<dyn Transport>, config: &ChannelConfig) -> Self {
        let (tx, closed) = watch::channel(false);
        Self {
            transport,
            buffer: PatternBuffer::new(config.search_depth, config.head_size),
            anchor: TailAnchor::new(config.trailing_tolerance),
            close_handle: CloseHandle { tx: Arc::new(tx) },
            closed,
        }
    }

    /// Handle that can close this channel from another task.
    pub fn close_handle(&self) -> CloseHandle {
        self.close_handle.clone()
    }

    /// Get a reference to the buffer.
    pub fn buffer(&self) -> &PatternBuffer {
        &self.buffer
    }

    /// Get a mutable reference to the buffer.
    pub fn buffer_mut(&mut self) -> &mut PatternBuffer {
        &mut self.buffer
    }

    /// The tail anchor used for matching.
    pub fn anchor(&self) -> &TailAnchor {
        &self.anchor
    }

    /// Whether the channel can still be used.
    pub fn is_open(&self) -> bool {
        !self.close_handle.is_closed() && self.transport.is_open()
    }

    /// Write raw bytes, waiting at most `timeout` for the transport to
    /// accept them. Closing the channel aborts a pending write.
    pub async fn send(&mut self, data: &[u8], timeout: Duration) -> Result<(), TransportError> {
        if self.close_handle.is_closed() {
            return Err(TransportError::Disconnected);
        }

        let mut closed = self.closed.clone();
        tokio::select! {
            sent = tokio::time::timeout(timeout, self.transport.send(data)) => {
                sent.map_err(|_| TransportError::Timeout(timeout))?
            }
            _ = closed.wait_for(|c| *c) => Err(TransportError::Disconnected),
        }
    }

    /// Write a line followed by `terminator`.
    pub async fn send_line(
        &mut self,
        line: &str,
        terminator: &str,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        let mut data = Vec::with_capacity(line.len() + terminator.len());
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(terminator.as_bytes());
        self.send(&data, timeout).await
    }

    /// Check the buffer tail against each tagged set in order.
    pub fn scan<R: Copy>(&self, sets: &[(R, &PatternSet)]) -> Option<(R, MatchSpan)> {
        sets.iter().find_map(|(tag, set)| {
            self.buffer
                .find_at_tail(set, &self.anchor)
                .map(|span| (*tag, span))
        })
    }

    /// Read until one of the tagged pattern sets matches at the tail.
    ///
    /// Data already buffered is checked first. The whole wait shares one
    /// deadline.
    pub async fn read_until<R: Copy>(
        &mut self,
        sets: &[(R, &PatternSet)],
        timeout: Duration,
    ) -> Result<(R, MatchSpan), TransportError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(hit) = self.scan(sets) {
                return Ok(hit);
            }
            let chunk = self.read_chunk(deadline, timeout).await?;
            self.buffer.extend(&chunk);
        }
    }

    /// Read until the head snapshot is full, `idle` reports the stream is
    /// sitting at a prompt, or `settle` elapses. Running out of time is not
    /// an error.
    pub async fn fill_head<F>(&mut self, settle: Duration, idle: F) -> Result<(), TransportError>
    where
        F: Fn(&PatternBuffer, &TailAnchor) -> bool,
    {
        let deadline = Instant::now() + settle;
        while !self.buffer.head_complete() && !idle(&self.buffer, &self.anchor) {
            match self.read_chunk(deadline, settle).await {
                Ok(chunk) => self.buffer.extend(&chunk),
                Err(TransportError::Timeout(_)) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Receive one chunk before `deadline`, aborting on close.
    async fn read_chunk(
        &mut self,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        if self.close_handle.is_closed() {
            return Err(TransportError::Disconnected);
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(TransportError::Timeout(timeout));
        }

        let mut closed = self.closed.clone();
        tokio::select! {
            received = tokio::time::timeout(remaining, self.transport.receive(remaining)) => {
                match received {
                    Ok(Ok(data)) => {
                        trace!("received {:?}", String::from_utf8_lossy(&data));
                        Ok(data)
                    }
                    Ok(Err(TransportError::Timeout(_))) | Err(_) => {
                        Err(TransportError::Timeout(timeout))
                    }
                    Ok(Err(e)) => Err(e),
                }
            }
            _ = closed.wait_for(|c| *c) => Err(TransportError::Disconnected),
        }
    }

    /// Close the channel and the transport.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.close_handle.close();
        self.transport.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ReplayTransport;

    fn channel(transport: ReplayTransport) -> StreamChannel {
        StreamChannel::new(Box::new(transport), &ChannelConfig::default())
    }

    #[tokio::test]
    async fn test_read_until_spans_reads() {
        let prompt = PatternSet::compile(&[r"[\r\n]router1[>#]$"]).unwrap();
        let mut channel = channel(ReplayTransport::new().emit("banner\r\nrou").emit("ter1>"));

        let (tag, span) = channel
            .read_until(&[("cmd", &prompt)], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(tag, "cmd");
        assert_eq!(span.end, channel.buffer().len());
    }

    #[tokio::test]
    async fn test_read_until_times_out() {
        let prompt = PatternSet::compile(&[r"#$"]).unwrap();
        let mut channel = channel(ReplayTransport::new().emit("no prompt here"));

        let err = channel
            .read_until(&[((), &prompt)], Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_close_handle_unblocks_wait() {
        let prompt = PatternSet::compile(&[r"#$"]).unwrap();
        let mut channel = channel(ReplayTransport::new());
        let handle = channel.close_handle();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.close();
        });

        let err = channel
            .read_until(&[((), &prompt)], Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Disconnected));
        assert!(!channel.is_open());
    }

    #[tokio::test]
    async fn test_fill_head_stops_at_idle_prompt() {
        let prompt = PatternSet::compile(&[r"Username:$"]).unwrap();
        let mut channel = channel(
            ReplayTransport::new()
                .emit("Welcome\r\n")
                .emit("Username:")
                .emit("never read"),
        );

        channel
            .fill_head(Duration::from_secs(1), |buffer, anchor| {
                buffer.find_at_tail(&prompt, anchor).is_some()
            })
            .await
            .unwrap();
        assert_eq!(channel.buffer().head(), b"Welcome\r\nUsername:");
    }

    #[tokio::test]
    async fn test_fill_head_settles_quietly() {
        let mut channel = channel(ReplayTransport::new().emit("partial banner"));
        channel
            .fill_head(Duration::from_millis(30), |_, _| false)
            .await
            .unwrap();
        assert_eq!(channel.buffer().head(), b"partial banner");
    }

    struct StalledWrites;

    #[async_trait::async_trait]
    impl Transport for StalledWrites {
        async fn send(&mut self, _data: &[u8]) -> Result<(), TransportError> {
            std::future::pending().await
        }

        async fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
            tokio::time::sleep(timeout).await;
            Err(TransportError::Timeout(timeout))
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        fn is_open(&self) -> bool {
            true
        }
    }

    fn stalled() -> StreamChannel {
        StreamChannel::new(Box::new(StalledWrites), &ChannelConfig::default())
    }

    #[tokio::test]
    async fn test_stalled_write_times_out() {
        let mut channel = stalled();
        let err = channel
            .send_line("admin", "\r", Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_close_handle_unblocks_write() {
        let mut channel = stalled();
        let handle = channel.close_handle();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.close();
        });

        let err = tokio_test::assert_ok!(
            tokio::time::timeout(
                Duration::from_secs(2),
                channel.send(b"admin\r", Duration::from_secs(30)),
            )
            .await
        )
        .unwrap_err();
        assert!(matches!(err, TransportError::Disconnected));
    }
}
