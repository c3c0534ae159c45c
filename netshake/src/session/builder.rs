//! Builder for creating sessions.

use std::sync::Arc;
use std::time::Duration;

use super::{Session, SessionConfig};
use crate::driver::{Driver, DriverRegistry};
use crate::error::{Result, SessionError};
use crate::transport::{SshConfig, SshTransport, Transport};

/// Builder for constructing sessions.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use netshake::{Account, SessionBuilder};
/// use netshake::transport::SshConfig;
///
/// # async fn example() -> Result<(), netshake::Error> {
/// let mut session = SessionBuilder::new()
///     .ssh(SshConfig::new("192.0.2.1", "admin"))
///     .timeout(Duration::from_secs(10))
///     .elevate(true)
///     .open()
///     .await?;
///
/// session.authenticate(&Account::new("admin", "secret")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SessionBuilder {
    config: SessionConfig,
    transport: Option<Box<dyn Transport>>,
    ssh: Option<SshConfig>,
    driver: Option<Arc<Driver>>,
    driver_name: Option<String>,
    registry: Option<Arc<DriverRegistry>>,
}

impl SessionBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already connected transport.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Connect over SSH when opened.
    pub fn ssh(mut self, config: SshConfig) -> Self {
        self.ssh = Some(config);
        self
    }

    /// Bind this driver, skipping detection.
    pub fn driver(mut self, driver: Arc<Driver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Use the registered driver with this name, skipping detection.
    pub fn driver_name(mut self, name: impl Into<String>) -> Self {
        self.driver_name = Some(name.into());
        self
    }

    /// Detect against this registry instead of the built-in one.
    pub fn registry(mut self, registry: Arc<DriverRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the per-prompt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set how many trailing bytes are searched for prompts.
    pub fn search_depth(mut self, depth: usize) -> Self {
        self.config.search_depth = depth;
        self
    }

    /// Set the trailing whitespace tolerated after a prompt.
    pub fn trailing_tolerance(mut self, bytes: usize) -> Self {
        self.config.trailing_tolerance = bytes;
        self
    }

    /// Set the head snapshot size used for fingerprinting.
    pub fn head_size(mut self, bytes: usize) -> Self {
        self.config.head_size = bytes;
        self
    }

    /// Set how long head collection waits without seeing a prompt.
    pub fn head_settle(mut self, settle: Duration) -> Self {
        self.config.head_settle = settle;
        self
    }

    /// Set the password submission budget.
    pub fn max_password_attempts(mut self, attempts: u32) -> Self {
        self.config.max_password_attempts = attempts;
        self
    }

    /// Elevate as part of `authenticate`.
    pub fn elevate(mut self, elevate: bool) -> Self {
        self.config.elevate = elevate;
        self
    }

    /// Run session preparation after login (default: on).
    pub fn prepare(mut self, prepare: bool) -> Self {
        self.config.prepare = prepare;
        self
    }

    /// Replace the whole session config.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Build a session over the given transport without resolving a
    /// driver. A driver or driver name set on the builder is applied.
    pub fn build(self) -> Result<Session> {
        let transport = self.transport.ok_or(SessionError::NoTransport)?;
        let mut session = Session::new(transport, self.config);
        if let Some(driver) = self.driver {
            session.bind(driver)?;
        }
        if let Some(name) = self.driver_name {
            session.set_driver_override(name);
        }
        Ok(session)
    }

    /// Connect if needed, then resolve the session's driver.
    pub async fn open(mut self) -> Result<Session> {
        if self.transport.is_none() {
            let ssh = self.ssh.take().ok_or(SessionError::NoTransport)?;
            self.transport = Some(Box::new(SshTransport::connect(ssh).await?));
        }
        let registry = self.registry.take();

        let mut session = self.build()?;
        match registry {
            Some(registry) => session.resolve_driver(&registry).await?,
            None => session.resolve_driver(DriverRegistry::global()?).await?,
        };
        Ok(session)
    }
}
