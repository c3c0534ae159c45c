//! Head-of-stream fingerprints.

use regex::bytes::Regex;

/// One recognisable trait of a dialect's banner, with the confidence it
/// gives when present.
#[derive(Debug, Clone)]
pub struct HeadSignature {
    pattern: Regex,
    score: u8,
}

impl HeadSignature {
    /// Compile a signature. Scores above 100 are rejected by the driver
    /// that owns it.
    pub fn new(pattern: &str, score: u8) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            score,
        })
    }

    /// Pattern source.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Confidence in `0..=100`.
    pub fn score(&self) -> u8 {
        self.score
    }

    /// Whether the signature is present in `head`.
    pub fn matches(&self, head: &[u8]) -> bool {
        self.pattern.is_match(head)
    }
}

/// Data-driven scorer: the highest score among the signatures found in the
/// head, or 0.
#[derive(Debug, Clone, Default)]
pub struct Fingerprint {
    signatures: Vec<HeadSignature>,
}

impl Fingerprint {
    /// An empty fingerprint; always scores 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signature.
    pub fn push(&mut self, signature: HeadSignature) {
        self.signatures.push(signature);
    }

    /// The signatures, in declaration order.
    pub fn signatures(&self) -> &[HeadSignature] {
        &self.signatures
    }

    /// Score `head`. Pure: the same input always yields the same score.
    pub fn score(&self, head: &[u8]) -> u8 {
        self.signatures
            .iter()
            .filter(|s| s.matches(head))
            .map(HeadSignature::score)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_matching_signature_wins() {
        let mut fingerprint = Fingerprint::new();
        fingerprint.push(HeadSignature::new("Welcome", 20).unwrap());
        fingerprint.push(HeadSignature::new("ACME OS", 80).unwrap());
        fingerprint.push(HeadSignature::new("never", 95).unwrap());

        assert_eq!(fingerprint.score(b"Welcome to ACME OS\r\n"), 80);
        assert_eq!(fingerprint.score(b"Welcome\r\n"), 20);
        assert_eq!(fingerprint.score(b""), 0);
    }

    #[test]
    fn test_empty_fingerprint_scores_zero() {
        assert_eq!(Fingerprint::new().score(b"anything"), 0);
    }
}
