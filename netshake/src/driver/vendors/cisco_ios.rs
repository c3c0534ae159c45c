//! Cisco IOS / IOS-XE driver.
//!
//! # Prompt Examples
//!
//! ```text
//! router1>                  # user EXEC
//! router1#                  # privileged EXEC
//! router1(config-if)#       # configuration
//! ```

use crate::driver::{Driver, Elevation};
use crate::error::DriverError;

pub const NAME: &str = "cisco_ios";

/// Create the Cisco IOS driver.
pub fn driver() -> Result<Driver, DriverError> {
    let elevation = Elevation::new("enable")
        .with_elevated_prompt(&[r"[\r\n][\-\w+\.:/]+(?:\([^\)]+\))?# ?$"])
        .map_err(|e| DriverError::invalid_pattern(NAME, "elevated", e))?;

    Ok(Driver::new(NAME)
        .with_user_prompt(&[r"(?i)[\r\n]user ?name: ?$"])?
        .with_password_prompt(&[
            r"[\r\n](?:[Ee]nable )?[Pp]assword: ?$",
            r"last resort password: ?$",
        ])?
        .with_command_prompt(&[r"[\r\n][\-\w+\.:/]+(?:\([^\)]+\))?[>#] ?$"])?
        .with_login_error(&[
            r"[\r\n]% (?:Login invalid|Authentication failed|Bad passwords|Access denied)",
        ])?
        .with_error_patterns(&[
            r"(?m)^% ?(?:Invalid input|Incomplete command|Ambiguous command|Unknown command)",
            r"(?m)^%Error",
        ])?
        .with_head_signature(r"Cisco IOS Software|IOS-XE", 80)?
        .with_head_signature(r"User Access Verification", 60)?
        .with_init_command("terminal length 0")
        .with_init_command("terminal width 0")
        .with_elevation(elevation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::vendors::at_tail;

    #[test]
    fn test_fingerprint() {
        let driver = driver().unwrap();
        assert_eq!(driver.score(b"\r\n\r\nUser Access Verification\r\n\r\nUsername: "), 60);
        assert_eq!(driver.score(b"Cisco IOS Software, C2900"), 80);
        assert_eq!(driver.score(b"\n\nrouter1>"), 0);
    }

    #[test]
    fn test_prompts() {
        let driver = driver().unwrap();
        assert!(at_tail(driver.user_prompt(), b"\r\nUsername: "));
        assert!(at_tail(driver.password_prompt(), b"\r\nPassword: "));
        assert!(at_tail(driver.command_prompt(), b"\r\ncore-sw1.lab#"));
        assert!(at_tail(driver.command_prompt(), b"\r\nrouter1(config-router)#"));
        assert!(!at_tail(driver.command_prompt(), b"\r\nrouter1#show\r\n"));
    }

    #[test]
    fn test_failure_markers() {
        let driver = driver().unwrap();
        let output = "show foo\r\n        ^\r\n% Invalid input detected at '^' marker.";
        assert_eq!(driver.detect_failure(output), Some("% Invalid input".to_string()));
        assert!(driver.detect_failure("Interface Status up").is_none());
    }
}
