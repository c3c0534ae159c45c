//! Privilege elevation definition.

use crate::channel::PatternSet;

/// How a dialect enters privileged mode from an authenticated session.
///
/// After `command` is sent the device either shows a password prompt, which
/// is answered with the elevation secret, or goes straight to its command
/// prompt. When `elevated_prompt` is non-empty the final prompt must match
/// it; a device that falls back to its unprivileged prompt (for example
/// after `% Access denied`) is then reported as a refused elevation.
#[derive(Debug, Clone)]
pub struct Elevation {
    /// Command that requests elevation (e.g., "enable").
    pub command: String,

    /// Password prompt shown after the command; the driver's regular
    /// password prompt is used when unset.
    pub password_prompt: Option<PatternSet>,

    /// Prompts only shown in privileged mode.
    pub elevated_prompt: PatternSet,
}

impl Elevation {
    /// Create an elevation step that sends `command`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            password_prompt: None,
            elevated_prompt: PatternSet::empty(),
        }
    }

    /// Use a dedicated password prompt for the elevation secret.
    pub fn with_password_prompt(mut self, patterns: &[&str]) -> Result<Self, regex::Error> {
        self.password_prompt = Some(PatternSet::compile(patterns)?);
        Ok(self)
    }

    /// Require the final prompt to match one of `patterns`.
    pub fn with_elevated_prompt(mut self, patterns: &[&str]) -> Result<Self, regex::Error> {
        self.elevated_prompt = PatternSet::compile(patterns)?;
        Ok(self)
    }

    /// Whether `prompt` shows privileged mode. Always true without
    /// elevated-prompt patterns.
    pub fn confirms(&self, prompt: &[u8]) -> bool {
        self.elevated_prompt.is_empty() || self.elevated_prompt.is_match_anywhere(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirms_without_patterns() {
        let elevation = Elevation::new("enable");
        assert!(elevation.confirms(b"\r\nrouter1>"));
    }

    #[test]
    fn test_confirms_checks_elevated_prompt() {
        let elevation = Elevation::new("enable")
            .with_elevated_prompt(&[r"[\r\n][\-\w+\.]+# ?$"])
            .unwrap();
        assert!(elevation.confirms(b"\r\nrouter1#"));
        assert!(!elevation.confirms(b"\r\nrouter1>"));
    }

    #[test]
    fn test_invalid_password_prompt() {
        assert!(Elevation::new("enable").with_password_prompt(&["[bad"]).is_err());
    }
}
