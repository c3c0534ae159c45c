//! Session configuration.

use std::time::Duration;

use crate::channel::ChannelConfig;

/// Tunables for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for each prompt wait.
    pub timeout: Duration,

    /// Bytes at the end of the buffer searched for prompts.
    pub search_depth: usize,

    /// Trailing spaces/tabs tolerated after a prompt.
    pub trailing_tolerance: usize,

    /// Bytes of the stream head used for fingerprinting.
    pub head_size: usize,

    /// How long to collect the head when no prompt shows up.
    pub head_settle: Duration,

    /// Password submissions allowed before a repeated prompt means the
    /// credentials were refused.
    pub max_password_attempts: u32,

    /// Run the elevation step as part of `authenticate`.
    pub elevate: bool,

    /// Run the driver's session preparation after login.
    pub prepare: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            search_depth: 1000,
            trailing_tolerance: 2,
            head_size: 1024,
            head_settle: Duration::from_secs(1),
            max_password_attempts: 1,
            elevate: false,
            prepare: true,
        }
    }
}

impl SessionConfig {
    /// Channel settings derived from this config.
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            search_depth: self.search_depth,
            head_size: self.head_size,
            trailing_tolerance: self.trailing_tolerance,
        }
    }
}
