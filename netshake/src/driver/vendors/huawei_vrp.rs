//! Huawei VRP driver.
//!
//! # Prompt Examples
//!
//! ```text
//! <HUAWEI>                           # user view
//! [HUAWEI]                           # system view
//! [~HUAWEI-GigabitEthernet0/0/1]     # two-stage commit mode
//! ```
//!
//! `super` raises the user level without changing the prompt, so elevation
//! is not verified by prompt.

use crate::driver::{Driver, Elevation};
use crate::error::DriverError;

pub const NAME: &str = "huawei_vrp";

/// Create the Huawei VRP driver.
pub fn driver() -> Result<Driver, DriverError> {
    Ok(Driver::new(NAME)
        .with_user_prompt(&[r"(?i)[\r\n]user ?name: ?$"])?
        .with_password_prompt(&[r"(?i)[\r\n]password: ?$"])?
        .with_command_prompt(&[r"[\r\n][<\[]~?[\-\w+\.:/]+[>\]] ?$"])?
        .with_login_error(&[
            r"(?i)username or password error",
            r"(?i)local authentication is rejected",
        ])?
        .with_error_patterns(&[r"(?m)^Error:"])?
        .with_head_signature(r"(?i)huawei", 80)?
        .with_head_signature(r"Info: The max number of VTY users", 70)?
        .with_init_command("screen-length 0 temporary")
        .with_elevation(Elevation::new("super")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::vendors::at_tail;

    #[test]
    fn test_prompts() {
        let driver = driver().unwrap();
        assert!(at_tail(driver.command_prompt(), b"\r\n<HUAWEI>"));
        assert!(at_tail(driver.command_prompt(), b"\r\n[~HUAWEI-GigabitEthernet0/0/1]"));
        assert!(at_tail(driver.user_prompt(), b"\r\nUsername:"));
    }

    #[test]
    fn test_fingerprint() {
        let driver = driver().unwrap();
        assert_eq!(driver.score(b"Info: The max number of VTY users is 10"), 70);
        assert_eq!(driver.score(b"Huawei Versatile Routing Platform"), 80);
        assert_eq!(driver.score(b"\n\nrouter1>"), 0);
    }
}
