//! Nokia SR OS driver.
//!
//! Handles both the classic CLI and MD-CLI.
//!
//! # Prompt Examples
//!
//! ```text
//! A:router1#                         # classic CLI
//! *A:router1>config>router#          # classic, unsaved changes
//! [/]
//! A:admin@router1#                   # MD-CLI
//! ```
//!
//! The two CLIs disable paging with different commands, so session
//! preparation tries the MD-CLI form first and falls back to the classic
//! one.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::driver::{Driver, DriverBehavior};
use crate::error::{DriverError, Result, SessionError};
use crate::session::Session;

pub const NAME: &str = "nokia_sros";

const MD_CLI_PROMPT: &str = r"[\r\n]\*?[ABCD]:[\w\._\-]+@[\w\._\-]+# ?$";
const CLASSIC_PROMPT: &str = r"[\r\n]\*?[ABCD]:[\-\w\.>]+[#\$] ?$";

const MD_CLI_NO_MORE: &str = "environment more false";
const CLASSIC_NO_MORE: &str = "environment no more";

/// Create the SR OS driver.
pub fn driver() -> std::result::Result<Driver, DriverError> {
    Ok(Driver::new(NAME)
        .with_user_prompt(&[r"[\r\n]Login: ?$"])?
        .with_password_prompt(&[r"[\r\n]Password: ?$"])?
        .with_command_prompt(&[MD_CLI_PROMPT, CLASSIC_PROMPT])?
        .with_login_error(&[r"[\r\n]Login incorrect"])?
        .with_error_patterns(&[r"(?m)^(?:MINOR|MAJOR|CRITICAL|Error):"])?
        .with_head_signature(r"TiMOS", 90)?
        .with_head_signature(MD_CLI_PROMPT, 85)?
        .with_head_signature(CLASSIC_PROMPT, 85)?
        .with_head_signature(r"Nokia|Alcatel-Lucent", 60)?
        .with_behavior(Arc::new(SrosBehavior)))
}

/// Paging setup for whichever CLI the router runs.
struct SrosBehavior;

#[async_trait]
impl DriverBehavior for SrosBehavior {
    async fn prepare_session(&self, driver: &Driver, session: &mut Session) -> Result<()> {
        let response = session.execute(MD_CLI_NO_MORE).await?;
        if response.is_success() {
            return Ok(());
        }
        debug!("{}: not MD-CLI, trying classic paging command", driver.name());

        let response = session.execute(CLASSIC_NO_MORE).await?;
        match response.failure_message {
            Some(message) => Err(SessionError::CommandFailed {
                command: CLASSIC_NO_MORE.to_string(),
                message,
            }
            .into()),
            None => Ok(()),
        }
    }
}
