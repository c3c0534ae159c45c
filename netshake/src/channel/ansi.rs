//! ANSI / VT escape sequence removal.
//!
//! Devices sprinkle colour codes and cursor movement into prompts. The filter
//! keeps a `vte` parser alive between reads so a sequence split across two
//! chunks is still dropped.

use vte::{Parser, Perform};

/// Streaming escape-sequence filter.
pub struct AnsiFilter {
    parser: Parser,
}

impl AnsiFilter {
    /// Create a filter with a fresh parser state.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Feed raw bytes, returning the printable text.
    pub fn filter(&mut self, data: &[u8]) -> Vec<u8> {
        let mut sink = Printable {
            out: Vec::with_capacity(data.len()),
        };
        self.parser.advance(&mut sink, data);
        sink.out
    }
}

impl Default for AnsiFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnsiFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsiFilter").finish_non_exhaustive()
    }
}

struct Printable {
    out: Vec<u8>,
}

impl Perform for Printable {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        // C0 controls: keep line structure, drop bells and backspaces
        if matches!(byte, b'\r' | b'\n' | b'\t') {
            self.out.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_colour_codes() {
        let mut filter = AnsiFilter::new();
        assert_eq!(filter.filter(b"\x1b[32mrouter1\x1b[0m#"), b"router1#");
    }

    #[test]
    fn test_keeps_line_breaks() {
        let mut filter = AnsiFilter::new();
        assert_eq!(filter.filter(b"a\r\nb\tc\x07"), b"a\r\nb\tc");
    }

    #[test]
    fn test_sequence_split_across_reads() {
        let mut filter = AnsiFilter::new();
        let mut out = filter.filter(b"Password\x1b[");
        out.extend(filter.filter(b"1;31m:"));
        assert_eq!(out, b"Password:");
    }
}
