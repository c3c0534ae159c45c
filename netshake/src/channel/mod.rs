//! Channel layer for pattern matching over a byte stream.
//!
//! This module handles buffering of received text, escape stripping and
//! end-anchored prompt detection.

mod ansi;
mod buffer;
mod patterns;
mod stream;

pub use ansi::AnsiFilter;
pub use buffer::PatternBuffer;
pub use patterns::{MatchSpan, PatternSet, PromptRole, TailAnchor};
pub use stream::{ChannelConfig, CloseHandle, StreamChannel};
