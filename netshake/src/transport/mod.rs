//! Transport layer: the byte stream a session talks over.
//!
//! The handshake engine only needs to write bytes and wait for new ones.
//! [`SshTransport`] provides that over an SSH shell channel, and
//! [`ReplayTransport`] plays back a scripted device for offline tests.

pub mod config;
mod replay;
mod ssh;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use replay::{ReplayTransport, SentLog};
pub use ssh::SshTransport;

/// A character-stream connection to a device.
#[async_trait]
pub trait Transport: Send {
    /// Write raw bytes to the peer.
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Wait up to `timeout` for newly available bytes.
    ///
    /// Fails with [`TransportError::Timeout`] when nothing arrives in time
    /// and [`TransportError::Disconnected`] once the peer has gone away.
    async fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError>;

    /// Close the connection.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Whether the connection is still usable.
    fn is_open(&self) -> bool;
}
