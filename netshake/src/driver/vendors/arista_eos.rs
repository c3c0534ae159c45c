//! Arista EOS driver.
//!
//! # Prompt Examples
//!
//! ```text
//! switch>                            # exec mode
//! switch#                            # privileged exec
//! switch(config-if-Et1)#             # configuration
//! ```
//!
//! Prompt patterns are adapted from [scrapli](https://github.com/carlmontanari/scrapli).

use crate::driver::{Driver, Elevation};
use crate::error::DriverError;

pub const NAME: &str = "arista_eos";

/// Create the Arista EOS driver.
///
/// `(?m)` lets `^` match at line starts; the tail anchor still requires the
/// prompt to end the buffer.
pub fn driver() -> Result<Driver, DriverError> {
    let elevation = Elevation::new("enable")
        .with_password_prompt(&[r"(?mi)^password: ?$"])
        .and_then(|e| e.with_elevated_prompt(&[r"(?mi)^[\w.\-@()/: ]{1,63}# ?$"]))
        .map_err(|e| DriverError::invalid_pattern(NAME, "elevated", e))?;

    Ok(Driver::new(NAME)
        .with_user_prompt(&[r"(?mi)^(?:login|user ?name): ?$"])?
        .with_password_prompt(&[r"(?mi)^password: ?$"])?
        .with_command_prompt(&[r"(?mi)^[\w.\-@()/: ]{1,63}[>#] ?$"])?
        .with_login_error(&[r"(?i)[\r\n]% ?(?:Authentication failed|Login incorrect)"])?
        .with_error_patterns(&[
            "% Ambiguous command",
            "% Error",
            "% Incomplete command",
            "% Invalid input",
            "% Unavailable command",
        ])?
        .with_head_signature(r"Arista", 80)?
        .with_init_command("terminal length 0")
        .with_init_command("terminal width 32767")
        .with_elevation(elevation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::vendors::at_tail;

    #[test]
    fn test_prompts() {
        let driver = driver().unwrap();
        assert!(at_tail(driver.command_prompt(), b"\r\nswitch>"));
        assert!(at_tail(driver.command_prompt(), b"\r\nadmin@switch.lab# "));
        assert!(at_tail(driver.command_prompt(), b"\r\nswitch(config-if-Et1)#"));
        // prompt followed by a newline is output, not an idle prompt
        assert!(!at_tail(driver.command_prompt(), b"\r\nswitch>\r\n"));
    }

    #[test]
    fn test_elevation_prompt() {
        let driver = driver().unwrap();
        let elevation = driver.elevation().unwrap();
        assert!(elevation.confirms(b"\nswitch#"));
        assert!(!elevation.confirms(b"\nswitch>"));
    }

    #[test]
    fn test_fingerprint() {
        let driver = driver().unwrap();
        assert_eq!(driver.score(b"Arista Networks EOS shell"), 80);
        assert_eq!(driver.score(b"\n\nrouter1>"), 0);
    }
}
