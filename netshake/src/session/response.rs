//! Command results.

use std::fmt;
use std::time::Duration;

use crate::error::{Result, SessionError};

/// Output of one command run through [`Session::execute`](super::Session::execute).
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was sent.
    pub command: String,

    /// Output with the command echo and the trailing prompt removed.
    pub result: String,

    /// Everything received up to and including the prompt.
    pub raw_result: String,

    /// The prompt that ended the output.
    pub prompt: String,

    /// Time from sending the command to seeing the prompt.
    pub elapsed: Duration,

    /// Error marker found in the output, if any.
    pub failure_message: Option<String>,
}

impl Response {
    /// Build a response from the bytes received for `command`.
    ///
    /// `prompt_start` is the offset in `raw` where the matched prompt begins.
    pub fn from_raw(command: &str, raw: &[u8], prompt_start: usize, elapsed: Duration) -> Self {
        let prompt_start = prompt_start.min(raw.len());
        let output = String::from_utf8_lossy(&raw[..prompt_start]);
        Self {
            command: command.to_string(),
            result: strip_echo(&output, command),
            raw_result: String::from_utf8_lossy(raw).into_owned(),
            prompt: String::from_utf8_lossy(&raw[prompt_start..]).trim().to_string(),
            elapsed,
            failure_message: None,
        }
    }

    /// Record the error marker found in the output.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    /// Whether no error marker was found.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Turn a flagged response into [`SessionError::CommandFailed`].
    pub fn into_result(self) -> Result<Self> {
        match self.failure_message {
            Some(message) => Err(SessionError::CommandFailed {
                command: self.command,
                message,
            }
            .into()),
            None => Ok(self),
        }
    }

    /// Output lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    /// Whether the output contains `pattern`.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.result)
    }
}

/// Drop the echoed command line and surrounding blank lines.
fn strip_echo(output: &str, command: &str) -> String {
    let output = output.trim_start();
    output
        .strip_prefix(command)
        .unwrap_or(output)
        .trim_start_matches(['\r', '\n'])
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_strips_echo_and_prompt() {
        let raw = b"show clock\r\n10:15:02 UTC Mon\r\nrouter1#";
        let response = Response::from_raw("show clock", raw, 29, Duration::from_millis(5));
        assert_eq!(response.result, "10:15:02 UTC Mon");
        assert_eq!(response.prompt, "router1#");
        assert!(response.is_success());
    }

    #[test]
    fn test_into_result_reports_failure() {
        let raw = b"bogus\r\n% Invalid input\r\nr1#";
        let response =
            Response::from_raw("bogus", raw, 24, Duration::ZERO).with_failure("% Invalid input");
        assert!(!response.is_success());
        assert!(response.into_result().is_err());
    }
}
