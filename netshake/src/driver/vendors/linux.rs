//! Linux/Unix shell driver.
//!
//! Supports standard shells with `$` (user) and `#` (root) prompts.
//! Elevation runs `sudo -i`; the root prompt confirms it.

use crate::driver::{Driver, Elevation};
use crate::error::DriverError;

pub const NAME: &str = "linux";

/// Create the Linux driver.
pub fn driver() -> Result<Driver, DriverError> {
    let elevation = Elevation::new("sudo -i")
        .with_password_prompt(&[r"(?i)\[sudo\] password for [^:\r\n]+: ?$", r"(?i)password: ?$"])
        .and_then(|e| e.with_elevated_prompt(&[r"# ?$"]))
        .map_err(|e| DriverError::invalid_pattern(NAME, "elevated", e))?;

    Ok(Driver::new(NAME)
        .with_user_prompt(&[r"(?i)[\w\-\. ]*login: ?$"])?
        .with_password_prompt(&[r"(?i)password(?: for [\w\-\.]+)?: ?$"])?
        .with_command_prompt(&[r"[\r\n][^\r\n]*[\$#%] ?$"])?
        .with_login_error(&[r"[\r\n]Login incorrect", r"Permission denied, please try again"])?
        .with_error_patterns(&[
            "command not found",
            "No such file or directory",
            "Permission denied",
            "Operation not permitted",
        ])?
        .with_head_signature(r"(?i)ubuntu|debian|centos|red hat|fedora|rocky linux", 80)?
        .with_head_signature(r"Linux|GNU", 70)?
        .with_head_signature(r"FreeBSD|OpenBSD|NetBSD", 60)?
        .with_head_signature(r"[\r\n][\w\-\.]+@[\w\-\.]+:[^\r\n]*[\$#] ?$", 60)?
        .with_elevation(elevation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::vendors::at_tail;

    #[test]
    fn test_prompts() {
        let driver = driver().unwrap();
        assert!(at_tail(driver.command_prompt(), b"\r\nuser@host:~$ "));
        assert!(at_tail(driver.command_prompt(), b"\r\nroot@host:/etc# "));
        assert!(at_tail(driver.user_prompt(), b"\r\nbuildhost login: "));
        assert!(at_tail(driver.password_prompt(), b"\r\n[sudo] password for admin: "));
    }

    #[test]
    fn test_fingerprint() {
        let driver = driver().unwrap();
        assert_eq!(driver.score(b"Welcome to Ubuntu 22.04.3 LTS"), 80);
        assert_eq!(driver.score(b"\r\nuser@host:~$ "), 60);
        assert_eq!(driver.score(b"\n\nrouter1>"), 0);
    }

    #[test]
    fn test_elevation_prompt() {
        let driver = driver().unwrap();
        let elevation = driver.elevation().unwrap();
        assert_eq!(elevation.command, "sudo -i");
        assert!(elevation.confirms(b"\r\nroot@host:~# "));
        assert!(!elevation.confirms(b"\r\nuser@host:~$ "));
    }
}
