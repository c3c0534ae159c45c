//! OneAccess OneOS driver.
//!
//! # Prompt Examples
//!
//! ```text
//! Username:
//! Password:
//! router1>                  # user mode
//! router1#                  # after enable
//! router1(config)#          # configuration
//! ```
//!
//! OneOS prints its first prompt after an empty line, which is the only
//! reliable trait of its banner-less login.

use crate::driver::{Driver, Elevation};
use crate::error::DriverError;

pub const NAME: &str = "one_os";

/// Create the OneOS driver.
pub fn driver() -> Result<Driver, DriverError> {
    let elevation = Elevation::new("enable")
        .with_elevated_prompt(&[r"[\r\n][\-\w+\.]+(?:\([^\)]+\))?# ?$"])
        .map_err(|e| DriverError::invalid_pattern(NAME, "elevated", e))?;

    Ok(Driver::new(NAME)
        .with_user_prompt(&[r"[\r\n]Username:$"])?
        .with_password_prompt(&[r"[\r\n]Password:$"])?
        .with_command_prompt(&[r"[\r\n][\-\w+\.]+(?:\([^\)]+\))?[>#] ?$"])?
        .with_login_error(&[r"[\r\n]% ?(?:Login invalid|Authentication failed|Bad passwords?)"])?
        .with_error_patterns(&[r"(?m)^% ?(?:Invalid|Incomplete|Ambiguous|Unknown)"])?
        .with_head_signature(r"\r?\n\r?\n[\-\w+\.]+[>#]$", 50)?
        .with_init_command("term len 0")
        .with_elevation(elevation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::vendors::at_tail;

    #[test]
    fn test_first_prompt_scores_fifty() {
        let driver = driver().unwrap();
        assert_eq!(driver.score(b"\n\nrouter1>"), 50);
        assert_eq!(driver.score(b"\r\n\r\nrouter1#"), 50);
        assert_eq!(driver.score(b"\nrouter1>"), 0);
        assert_eq!(driver.score(b"\n\nrouter1>\r\nmore"), 0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let driver = driver().unwrap();
        let head = b"\n\nbranch-7.lab>";
        assert_eq!(driver.score(head), driver.score(head));
    }

    #[test]
    fn test_prompts() {
        let driver = driver().unwrap();
        assert!(at_tail(driver.user_prompt(), b"\r\nUsername:"));
        assert!(!at_tail(driver.user_prompt(), b"Username:"));
        assert!(at_tail(driver.password_prompt(), b"\r\nPassword: "));
        assert!(at_tail(driver.command_prompt(), b"\r\nrouter1>"));
        assert!(at_tail(driver.command_prompt(), b"\r\nrouter1(config-if)# "));
    }

    #[test]
    fn test_elevation() {
        let driver = driver().unwrap();
        let elevation = driver.elevation().unwrap();
        assert_eq!(elevation.command, "enable");
        assert!(elevation.confirms(b"\nrouter1#"));
        assert!(!elevation.confirms(b"\nrouter1>"));
        assert_eq!(driver.init_commands().to_vec(), vec!["term len 0".to_string()]);
    }
}
