//! Prompt pattern sets and tail anchoring.

use std::fmt;

use regex::bytes::Regex;

/// The semantic role of a prompt pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptRole {
    /// Username / login prompt.
    User,
    /// Password prompt.
    Password,
    /// Idle command prompt.
    Command,
    /// Text the device prints when a login was refused.
    LoginError,
}

impl PromptRole {
    /// Short lowercase name used in errors and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptRole::User => "user",
            PromptRole::Password => "password",
            PromptRole::Command => "command",
            PromptRole::LoginError => "login-error",
        }
    }
}

impl fmt::Display for PromptRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte range of a honoured match within the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    /// Offset of the first matched byte.
    pub start: usize,
    /// Offset one past the last matched byte.
    pub end: usize,
    /// Index of the pattern in its set that produced the match.
    pub pattern_index: usize,
}

impl MatchSpan {
    /// Length of the matched text.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the match is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// How close to the end of the buffer a match must end.
///
/// Prompts sit at the very end of the received data while the device waits
/// for input. Some devices pad the prompt with a space or two, so up to
/// `tolerance` trailing spaces or tabs are ignored before anchoring. Any
/// other trailing byte means the prompt-like text is part of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailAnchor {
    /// Maximum number of trailing blank bytes ignored.
    pub tolerance: usize,
}

impl TailAnchor {
    /// Create an anchor with the given trailing tolerance.
    pub fn new(tolerance: usize) -> Self {
        Self { tolerance }
    }

    /// The end offset matches must reach: `data.len()` minus up to
    /// `tolerance` trailing spaces or tabs.
    pub fn anchor_end(&self, data: &[u8]) -> usize {
        let blanks = data
            .iter()
            .rev()
            .take(self.tolerance)
            .take_while(|b| matches!(b, b' ' | b'\t'))
            .count();
        data.len() - blanks
    }
}

impl Default for TailAnchor {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Ordered, immutable collection of compiled patterns for one role.
///
/// Patterns are tried in declaration order and the first one that matches at
/// the tail wins. Drivers place more specific patterns first.
///
/// Sets built with [`PatternSet::compile_unanchored`] match anywhere in the
/// searched region instead; they describe messages printed ahead of the next
/// prompt, such as login failures.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Regex>,
    anchored: bool,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            anchored: true,
        }
    }
}

impl PatternSet {
    /// An empty set; never matches.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile a tail-anchored set from pattern strings, in order.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        Ok(Self {
            patterns: compile_all(patterns)?,
            anchored: true,
        })
    }

    /// Compile a set that matches anywhere in the searched region.
    pub fn compile_unanchored<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        Ok(Self {
            patterns: compile_all(patterns)?,
            anchored: false,
        })
    }

    /// Whether matches must reach the end of the data.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the set holds no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Iterate over the compiled patterns.
    pub fn iter(&self) -> impl Iterator<Item = &Regex> {
        self.patterns.iter()
    }

    /// Pattern source strings, in order.
    pub fn sources(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.as_str()).collect()
    }

    /// Find the first pattern matching at the anchored end of `data`.
    ///
    /// `data` is searched only up to the anchor end, so `$`-terminated
    /// patterns still match a prompt followed by tolerated padding. Returned
    /// offsets are relative to `data`. Unanchored sets defer to
    /// [`PatternSet::find_anywhere`].
    pub fn match_tail(&self, data: &[u8], anchor: &TailAnchor) -> Option<MatchSpan> {
        if !self.anchored {
            return self.find_anywhere(data);
        }
        let end = anchor.anchor_end(data);
        let haystack = &data[..end];

        for (index, pattern) in self.patterns.iter().enumerate() {
            // An unanchored pattern may match earlier output as well; only a
            // match reaching the anchor end counts.
            let hit = pattern
                .find_iter(haystack)
                .filter(|m| m.end() == end)
                .last();
            if let Some(m) = hit {
                return Some(MatchSpan {
                    start: m.start(),
                    end: m.end(),
                    pattern_index: index,
                });
            }
        }
        None
    }

    /// First pattern (in declaration order) matching anywhere in `data`.
    pub fn find_anywhere(&self, data: &[u8]) -> Option<MatchSpan> {
        self.patterns.iter().enumerate().find_map(|(index, pattern)| {
            pattern.find(data).map(|m| MatchSpan {
                start: m.start(),
                end: m.end(),
                pattern_index: index,
            })
        })
    }

    /// Whether any pattern matches anywhere in `data`, ignoring anchoring.
    pub fn is_match_anywhere(&self, data: &[u8]) -> bool {
        self.patterns.iter().any(|p| p.is_match(data))
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_os_prompt() -> PatternSet {
        PatternSet::compile(&[r"[\r\n][\-\w+\.]+(?:\([^\)]+\))?[>#] ?$"]).unwrap()
    }

    #[test]
    fn test_first_pattern_wins() {
        let set = PatternSet::compile(&[r"[Pp]assword:\s*$", r"word:\s*$"]).unwrap();
        let span = set.match_tail(b"\r\nPassword:", &TailAnchor::default()).unwrap();
        assert_eq!(span.pattern_index, 0);
        assert_eq!(span.end, 11);
    }

    #[test]
    fn test_prompt_mid_buffer_is_ignored() {
        let set = one_os_prompt();
        let anchor = TailAnchor::default();
        assert!(set.match_tail(b"\r\nrouter1>\r\nshow output line", &anchor).is_none());
        assert!(set.match_tail(b"\r\nrouter1>\r\n", &anchor).is_none());
    }

    #[test]
    fn test_completed_prompt_matches() {
        let set = one_os_prompt();
        let anchor = TailAnchor::default();
        let mut data = b"line one\r\nline two\r\nrout".to_vec();
        assert!(set.match_tail(&data, &anchor).is_none());
        data.extend_from_slice(b"er1#");
        let span = set.match_tail(&data, &anchor).unwrap();
        assert_eq!(&data[span.start..span.end], b"\nrouter1#");
    }

    #[test]
    fn test_unanchored_pattern_must_reach_end() {
        let set = PatternSet::compile(&["Username:"]).unwrap();
        let anchor = TailAnchor::new(0);
        assert!(set.match_tail(b"Username: admin\r\n", &anchor).is_none());
        let span = set.match_tail(b"Username: x\r\nUsername:", &anchor).unwrap();
        assert_eq!(span.start, 13);
    }

    #[test]
    fn test_trailing_tolerance() {
        let set = PatternSet::compile(&[r"[\r\n]Password:$"]).unwrap();
        assert!(set.match_tail(b"\nPassword:  ", &TailAnchor::new(2)).is_some());
        assert!(set.match_tail(b"\nPassword:   ", &TailAnchor::new(2)).is_none());
        assert!(set.match_tail(b"\nPassword: ", &TailAnchor::new(0)).is_none());
        // newlines are never tolerated
        assert!(set.match_tail(b"\nPassword:\n", &TailAnchor::new(2)).is_none());
    }

    #[test]
    fn test_unanchored_set_matches_mid_buffer() {
        let set = PatternSet::compile_unanchored(&[r"% Login invalid"]).unwrap();
        assert!(!set.is_anchored());
        let data = b"\r\n% Login invalid\r\n\r\nUsername: ";
        let span = set.match_tail(data, &TailAnchor::default()).unwrap();
        assert_eq!(span.start, 2);
    }

    #[test]
    fn test_empty_set_never_matches() {
        let set = PatternSet::empty();
        assert!(set.is_empty());
        assert!(set.match_tail(b"router#", &TailAnchor::default()).is_none());
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        assert!(PatternSet::compile(&[r"(unclosed"]).is_err());
    }
}
