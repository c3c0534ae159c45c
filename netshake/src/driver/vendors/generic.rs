//! Generic fallback driver.
//!
//! Used when no dialect recognises the stream head. Its prompts are
//! deliberately broad and it has no fingerprint, so it never wins detection
//! on its own merit.

use crate::driver::Driver;
use crate::error::DriverError;

pub const NAME: &str = "generic";

/// Create the generic driver.
pub fn driver() -> Result<Driver, DriverError> {
    Driver::new(NAME)
        .with_user_prompt(&[r"(?i)(?:user ?name|login|user): ?$"])?
        .with_password_prompt(&[r"(?i)(?:pass ?word|passcode)(?: for [\w\-\.@]+)?: ?$"])?
        .with_command_prompt(&[r"[\r\n][\-\w+\.:/@~\[\]]+(?:\([^\)]+\))?[>#$%] ?$"])?
        .with_login_error(&[
            r"(?i)login incorrect",
            r"(?i)login invalid",
            r"(?i)authentication failed",
        ])
}
