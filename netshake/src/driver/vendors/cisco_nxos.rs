//! Cisco NX-OS driver.
//!
//! NX-OS users land in their role's privilege directly, so there is no
//! elevation step.
//!
//! # Prompt Examples
//!
//! ```text
//! switch#
//! switch(config-if)#
//! ```

use crate::driver::Driver;
use crate::error::DriverError;

pub const NAME: &str = "cisco_nxos";

/// Create the Cisco NX-OS driver.
pub fn driver() -> Result<Driver, DriverError> {
    Ok(Driver::new(NAME)
        .with_user_prompt(&[r"(?i)[\r\n](?:user ?name|login): ?$"])?
        .with_password_prompt(&[r"(?i)[\r\n]password: ?$"])?
        .with_command_prompt(&[r"[\r\n][\-\w+\.:/]+(?:\([^\)]+\))?# ?$"])?
        .with_login_error(&[r"(?i)[\r\n]login incorrect"])?
        .with_error_patterns(&[r"(?m)^% ?(?:Invalid|Incomplete|Ambiguous)"])?
        .with_head_signature(r"Cisco Nexus Operating System", 90)?
        .with_head_signature(r"NX-OS", 70)?
        .with_init_command("terminal length 0")
        .with_init_command("terminal width 511"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::vendors::at_tail;

    #[test]
    fn test_fingerprint() {
        let driver = driver().unwrap();
        assert_eq!(
            driver.score(b"Cisco Nexus Operating System (NX-OS) Software\r\n"),
            90
        );
        assert_eq!(driver.score(b"nexus login: "), 0);
    }

    #[test]
    fn test_prompts() {
        let driver = driver().unwrap();
        assert!(at_tail(driver.user_prompt(), b"\r\nlogin: "));
        assert!(at_tail(driver.command_prompt(), b"\r\nn9k-1#"));
        assert!(!at_tail(driver.command_prompt(), b"\r\nn9k-1>"));
        assert!(driver.elevation().is_none());
    }
}
