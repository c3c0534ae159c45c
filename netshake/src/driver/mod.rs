//! Dialect drivers for multi-vendor support.
//!
//! A [`Driver`] describes one vendor/OS CLI dialect: its prompt patterns, a
//! fingerprint that scores how likely a stream head belongs to it, and the
//! hooks that run once a login succeeded. Drivers are built once, validated,
//! and then shared read-only as `Arc<Driver>` by every session that uses
//! them.

mod definition;
mod elevation;
mod fingerprint;
mod registry;
mod spec;
pub mod vendors;

pub use definition::Driver;
pub use elevation::Elevation;
pub use fingerprint::{Fingerprint, HeadSignature};
pub use registry::DriverRegistry;
pub use spec::{DriverSpec, ElevationSpec, HeadSignatureSpec};

use async_trait::async_trait;
use log::debug;

use crate::error::{AuthError, Result, SessionError};
use crate::session::{Account, Session};

/// Dialect-specific behavior layered on top of a [`Driver`]'s data.
///
/// Every method has a default that works from the driver's tables, so a
/// custom behavior only overrides what its dialect does differently.
#[async_trait]
pub trait DriverBehavior: Send + Sync {
    /// Custom fingerprint. `None` falls back to the driver's head signatures.
    fn score(&self, _driver: &Driver, _head: &[u8]) -> Option<u8> {
        None
    }

    /// Prepare an authenticated session, e.g. disable paging.
    async fn prepare_session(&self, driver: &Driver, session: &mut Session) -> Result<()> {
        run_init_commands(driver, session).await
    }

    /// Enter privileged mode.
    async fn authorize_elevated(
        &self,
        driver: &Driver,
        session: &mut Session,
        account: &Account,
    ) -> std::result::Result<(), AuthError> {
        session.elevation_exchange(driver, account).await
    }
}

/// Behavior used by drivers that do not install their own.
#[derive(Debug, Default)]
pub struct DefaultBehavior;

#[async_trait]
impl DriverBehavior for DefaultBehavior {}

/// Run each of the driver's init commands, stopping at the first one whose
/// output matches an error pattern.
pub async fn run_init_commands(driver: &Driver, session: &mut Session) -> Result<()> {
    for command in driver.init_commands() {
        let response = session.execute(command).await?;
        if let Some(message) = response.failure_message {
            return Err(SessionError::CommandFailed {
                command: command.clone(),
                message,
            }
            .into());
        }
        debug!("{}: '{}' done", driver.name(), command);
    }
    Ok(())
}
