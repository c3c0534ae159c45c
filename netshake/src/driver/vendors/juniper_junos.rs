//! Juniper JUNOS driver.
//!
//! # Prompt Examples
//!
//! ```text
//! login:
//! Password:
//! admin@router1>                     # operational mode
//! admin@router1#                     # configuration mode
//! ```

use crate::driver::Driver;
use crate::error::DriverError;

pub const NAME: &str = "juniper_junos";

/// Create the JUNOS driver.
pub fn driver() -> Result<Driver, DriverError> {
    Ok(Driver::new(NAME)
        .with_user_prompt(&[r"[\r\n]login: ?$"])?
        .with_password_prompt(&[r"[\r\n](?:Local )?[Pp]assword: ?$"])?
        .with_command_prompt(&[r"[\r\n][\w\-\.]+@[\-\w+\.:]+[%>#] ?$"])?
        .with_login_error(&[r"[\r\n]Login incorrect"])?
        .with_error_patterns(&[r"(?m)^error:", r"(?m)^syntax error", r"(?m)^unknown command"])?
        .with_head_signature(r"JUNOS|Junos|Juniper Networks", 80)?
        .with_init_command("set cli screen-length 0")
        .with_init_command("set cli screen-width 0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::vendors::at_tail;

    #[test]
    fn test_prompts() {
        let driver = driver().unwrap();
        assert!(at_tail(driver.user_prompt(), b"\r\nlogin: "));
        assert!(at_tail(driver.command_prompt(), b"\r\n{master:0}\r\nadmin@mx1.lab> "));
        assert!(at_tail(driver.command_prompt(), b"\r\nadmin@mx1#"));
        assert!(!at_tail(driver.command_prompt(), b"\r\nmx1>"));
    }

    #[test]
    fn test_fingerprint_and_failures() {
        let driver = driver().unwrap();
        assert_eq!(driver.score(b"--- JUNOS 21.4R3 built 2022-12-01"), 80);
        assert!(driver.detect_failure("\r\nerror: syntax error, expecting <command>").is_some());
    }
}
