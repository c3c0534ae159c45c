//! Cisco IOS XR driver.
//!
//! # Prompt Examples
//!
//! ```text
//! RP/0/RP0/CPU0:xr1#
//! RP/0/RSP0/CPU0:asr9k(config)#
//! ```

use crate::driver::Driver;
use crate::error::DriverError;

pub const NAME: &str = "cisco_iosxr";

const PROMPT: &str = r"[\r\n]RP/\d+/(?:RS?P)?\d+/CPU\d+:[\-\w+\.:/]+(?:\([^\)]+\))?# ?$";

/// Create the Cisco IOS XR driver.
pub fn driver() -> Result<Driver, DriverError> {
    Ok(Driver::new(NAME)
        .with_user_prompt(&[r"(?i)[\r\n]user ?name: ?$"])?
        .with_password_prompt(&[r"(?i)[\r\n]password: ?$"])?
        .with_command_prompt(&[PROMPT])?
        .with_login_error(&[r"[\r\n]% (?:Authentication failed|Bad passwords)"])?
        .with_error_patterns(&[r"(?m)^% ?(?:Invalid input|Incomplete command|Ambiguous command)"])?
        .with_head_signature(PROMPT, 95)?
        .with_head_signature(r"Cisco IOS XR Software", 90)?
        .with_init_command("terminal length 0")
        .with_init_command("terminal width 0"))
}
