//! Pattern buffer with tail-search optimization.
//!
//! Only the last `search_depth` bytes of the buffer are searched for prompt
//! patterns, so a long command output is never rescanned from the start on
//! every read.

use bytes::{Buf, BytesMut};

use super::ansi::AnsiFilter;
use super::patterns::{MatchSpan, PatternSet, TailAnchor};

/// Buffer for accumulating received text and matching prompts at its end.
#[derive(Debug)]
pub struct PatternBuffer {
    /// Unconsumed received text, escape sequences removed.
    buffer: BytesMut,

    /// First bytes ever received, kept for fingerprinting.
    head: Vec<u8>,

    /// How many head bytes to retain.
    head_capacity: usize,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,

    /// Escape filter carried across reads.
    filter: AnsiFilter,
}

impl PatternBuffer {
    /// Create a new pattern buffer.
    ///
    /// # Arguments
    ///
    /// * `search_depth` - Number of bytes from the end to search for patterns.
    /// * `head_capacity` - Number of leading bytes retained for fingerprinting.
    pub fn new(search_depth: usize, head_capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            head: Vec::with_capacity(head_capacity),
            head_capacity,
            search_depth,
            filter: AnsiFilter::new(),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = self.filter.filter(data);
        let room = self.head_capacity.saturating_sub(self.head.len());
        if room > 0 {
            self.head
                .extend_from_slice(&cleaned[..room.min(cleaned.len())]);
        }
        self.buffer.extend_from_slice(&cleaned);
    }

    /// Offset where the searched tail region starts.
    fn tail_start(&self) -> usize {
        self.buffer.len().saturating_sub(self.search_depth)
    }

    /// Match a pattern set at the anchored end of the buffer.
    ///
    /// Returned offsets are relative to the full (unconsumed) buffer.
    pub fn find_at_tail(&self, set: &PatternSet, anchor: &TailAnchor) -> Option<MatchSpan> {
        let start = self.tail_start();
        set.match_tail(&self.buffer[start..], anchor)
            .map(|span| MatchSpan {
                start: span.start + start,
                end: span.end + start,
                pattern_index: span.pattern_index,
            })
    }

    /// Drop everything up to `end` and return it.
    ///
    /// Used after a match so the next scan starts after the prompt.
    pub fn consume(&mut self, end: usize) -> Vec<u8> {
        let end = end.min(self.buffer.len());
        let taken = self.buffer[..end].to_vec();
        self.buffer.advance(end);
        taken
    }

    /// The head snapshot received so far.
    pub fn head(&self) -> &[u8] {
        &self.head
    }

    /// Whether the head snapshot is full.
    pub fn head_complete(&self) -> bool {
        self.head.len() >= self.head_capacity
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.buffer.split().to_vec()
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer. The head snapshot is kept.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000, 1024)
    }
}
