//! Sessions: one connection, one bound driver, one login handshake.
//!
//! A [`Session`] owns the stream channel for a connection. It picks a
//! driver (by override or by fingerprinting the stream head), runs the
//! login handshake with that driver's prompts, and afterwards executes
//! commands delimited by the driver's command prompt.

mod account;
mod builder;
mod config;
mod handshake;
mod response;

pub use account::Account;
pub use builder::SessionBuilder;
pub use config::SessionConfig;
pub use handshake::{Credential, Handshake, HandshakeOutcome, HandshakeState, Step};
pub use response::Response;

use std::sync::Arc;
use std::time::Instant;

use log::{debug, trace, warn};

use crate::channel::{CloseHandle, PatternSet, PromptRole, StreamChannel};
use crate::driver::{Driver, DriverRegistry};
use crate::error::{
    AuthError, ChannelError, DriverError, Error, Result, SessionError, TransportError,
};
use crate::transport::Transport;

/// One connection to a device.
///
/// # Example
///
/// ```rust,no_run
/// use netshake::{Account, DriverRegistry, Session, SessionConfig};
/// use netshake::transport::{AuthMethod, SshConfig, SshTransport};
///
/// # async fn example() -> Result<(), netshake::Error> {
/// let ssh = SshConfig::new("192.0.2.1", "admin").with_auth(AuthMethod::None);
/// let transport = SshTransport::connect(ssh).await?;
/// let mut session = Session::new(Box::new(transport), SessionConfig::default());
///
/// let driver = session.resolve_driver(DriverRegistry::global()?).await?;
/// println!("detected {}", driver.name());
///
/// let account = Account::new("admin", "secret").with_elevation_secret("enable-secret");
/// session.login(&account).await?;
/// let response = session.execute("show version").await?;
/// println!("{}", response);
/// # Ok(())
/// # }
/// ```
pub struct Session {
    channel: StreamChannel,
    config: SessionConfig,
    driver: Option<Arc<Driver>>,
    driver_override: Option<String>,
    handshake: Handshake,
    prepared: bool,
}

impl Session {
    /// Create a session over a connected transport.
    pub fn new(transport: Box<dyn Transport>, config: SessionConfig) -> Self {
        let channel = StreamChannel::new(transport, &config.channel_config());
        let handshake = Handshake::new(String::new(), config.max_password_attempts);
        Self {
            channel,
            config,
            driver: None,
            driver_override: None,
            handshake,
            prepared: false,
        }
    }

    /// Start building a session.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current handshake state.
    pub fn state(&self) -> HandshakeState {
        self.handshake.state()
    }

    /// The bound driver, if resolved.
    pub fn driver(&self) -> Option<&Arc<Driver>> {
        self.driver.as_ref()
    }

    /// The stream head collected for fingerprinting.
    pub fn head(&self) -> &[u8] {
        self.channel.buffer().head()
    }

    /// Force the driver named `name` instead of fingerprinting.
    pub fn set_driver_override(&mut self, name: impl Into<String>) {
        self.driver_override = Some(name.into());
    }

    /// Bind a driver. A session keeps its driver for life; binding any
    /// other driver instance, even one with the same name, is an error.
    pub fn bind(&mut self, driver: Arc<Driver>) -> std::result::Result<(), DriverError> {
        match &self.driver {
            Some(bound) if Arc::ptr_eq(bound, &driver) => Ok(()),
            Some(bound) => Err(DriverError::AlreadyBound {
                bound: bound.name().to_string(),
                requested: driver.name().to_string(),
            }),
            None => {
                debug!("session bound to driver '{}'", driver.name());
                self.driver = Some(driver);
                Ok(())
            }
        }
    }

    /// Pick and bind the driver for this session.
    ///
    /// A manual override is looked up by name and bypasses fingerprinting.
    /// Otherwise the stream head is collected and scored by `registry`.
    /// Returns the already bound driver when called again.
    pub async fn resolve_driver(&mut self, registry: &DriverRegistry) -> Result<Arc<Driver>> {
        if let Some(driver) = &self.driver {
            return Ok(driver.clone());
        }

        let driver = match self.driver_override.clone() {
            Some(name) => {
                debug!("using driver '{}' by override", name);
                registry
                    .get(&name)
                    .ok_or(DriverError::UnknownDriver { name })?
            }
            None => {
                let settle = self.config.head_settle;
                let filled = self
                    .channel
                    .fill_head(settle, |buffer, anchor| {
                        registry.matches_any_prompt(buffer, anchor)
                    })
                    .await;
                if let Err(e) = filled {
                    self.handshake.fail();
                    return Err(e.into());
                }
                trace!("head: {:?}", String::from_utf8_lossy(self.head()));
                registry.detect(self.head())
            }
        };

        self.bind(driver.clone())?;
        Ok(driver)
    }

    /// Log in with the bound driver.
    ///
    /// Elevation runs too when [`SessionConfig::elevate`] is set. Session
    /// preparation runs once afterwards. Calling this again after success
    /// returns the outcome reached; after failure it returns
    /// [`AuthError::SessionFailed`].
    pub async fn authenticate(
        &mut self,
        account: &Account,
    ) -> std::result::Result<HandshakeOutcome, AuthError> {
        self.authenticate_with(account, true).await
    }

    async fn authenticate_with(
        &mut self,
        account: &Account,
        prepare: bool,
    ) -> std::result::Result<HandshakeOutcome, AuthError> {
        if self.handshake.state() == HandshakeState::Failed {
            return Err(AuthError::SessionFailed);
        }
        let driver = self.driver.clone().ok_or(AuthError::Unbound)?;

        if self.handshake.outcome().is_none() {
            self.handshake.set_user(account.username());
            let result = self.login_exchange(&driver, account).await;
            self.fail_on_error(result)?;
        }
        if self.config.elevate {
            self.elevate(&driver, account).await?;
        }
        if prepare {
            self.prepare(&driver).await?;
        }

        self.handshake.outcome().ok_or(AuthError::InvalidState {
            state: self.handshake.state(),
            action: "authenticate",
        })
    }

    /// Enter privileged mode on an authenticated session.
    pub async fn authorize(
        &mut self,
        account: &Account,
    ) -> std::result::Result<HandshakeOutcome, AuthError> {
        let driver = self.driver.clone().ok_or(AuthError::Unbound)?;
        let outcome = self.elevate(&driver, account).await?;
        self.prepare(&driver).await?;
        Ok(outcome)
    }

    /// Authenticate and then elevate, whatever the configuration says.
    /// Session preparation runs once elevation is done.
    pub async fn login(
        &mut self,
        account: &Account,
    ) -> std::result::Result<HandshakeOutcome, AuthError> {
        self.authenticate_with(account, false).await?;
        self.authorize(account).await
    }

    fn fail_on_error<T>(
        &mut self,
        result: std::result::Result<T, AuthError>,
    ) -> std::result::Result<T, AuthError> {
        if result.is_err() {
            self.handshake.fail();
        }
        result
    }

    /// Wait for one of `sets` and consume through the match. Returns the
    /// role, the consumed bytes and the offset where the prompt starts.
    async fn next_prompt(
        &mut self,
        sets: &[(PromptRole, &PatternSet)],
    ) -> std::result::Result<(PromptRole, Vec<u8>, usize), AuthError> {
        let state = self.handshake.state();
        let (role, span) = self
            .channel
            .read_until(sets, self.config.timeout)
            .await
            .map_err(|e| AuthError::from_transport(state, e))?;
        let consumed = self.channel.buffer_mut().consume(span.end);
        trace!(
            "{} prompt {:?}",
            role,
            String::from_utf8_lossy(&consumed[span.start..])
        );
        Ok((role, consumed, span.start))
    }

    async fn login_exchange(
        &mut self,
        driver: &Driver,
        account: &Account,
    ) -> std::result::Result<HandshakeOutcome, AuthError> {
        loop {
            let sets: Vec<(PromptRole, &PatternSet)> = self
                .handshake
                .expected_roles()
                .iter()
                .map(|role| (*role, driver.patterns(*role)))
                .collect();
            let (role, _, _) = self.next_prompt(&sets).await?;

            match self.handshake.on_prompt(role)? {
                Step::Send(credential) => self.send_credential(driver, account, credential).await?,
                Step::Done(outcome) => return Ok(outcome),
            }
        }
    }

    async fn send_credential(
        &mut self,
        driver: &Driver,
        account: &Account,
        credential: Credential,
    ) -> std::result::Result<(), AuthError> {
        let state = self.handshake.state();
        let text = match credential {
            Credential::Username => {
                debug!("sending username '{}'", account.username());
                account.username()
            }
            Credential::Password => {
                debug!("sending password (hidden)");
                account.expose_password()
            }
            Credential::ElevationSecret => {
                debug!("sending elevation secret (hidden)");
                account.expose_elevation_secret()
            }
        };
        self.channel
            .send_line(text, driver.line_terminator(), self.config.timeout)
            .await
            .map_err(|e| AuthError::from_transport(state, e))
    }

    async fn elevate(
        &mut self,
        driver: &Arc<Driver>,
        account: &Account,
    ) -> std::result::Result<HandshakeOutcome, AuthError> {
        if self.handshake.state() == HandshakeState::Elevated {
            return Ok(HandshakeOutcome::Elevated);
        }
        self.handshake.begin_elevation()?;

        let behavior = driver.behavior();
        let result = behavior
            .authorize_elevated(driver, self, account)
            .await
            .and_then(|()| self.handshake.finish_elevation());
        self.fail_on_error(result)
    }

    /// Send the driver's elevation command and answer its password prompt.
    ///
    /// This is the default elevation hook; custom hooks may call it after
    /// their own preliminaries. Dialects without an elevation step are
    /// already privileged, so nothing is sent for them.
    pub async fn elevation_exchange(
        &mut self,
        driver: &Driver,
        account: &Account,
    ) -> std::result::Result<(), AuthError> {
        let Some(elevation) = driver.elevation() else {
            debug!("driver '{}' has no elevation step", driver.name());
            return Ok(());
        };
        let state = self.handshake.state();
        if state != HandshakeState::AwaitingElevationPassword {
            return Err(AuthError::InvalidState {
                state,
                action: "elevate",
            });
        }

        debug!("sending elevation command '{}'", elevation.command);
        self.channel
            .send_line(&elevation.command, driver.line_terminator(), self.config.timeout)
            .await
            .map_err(|e| AuthError::from_transport(state, e))?;

        let password_prompt = elevation
            .password_prompt
            .as_ref()
            .unwrap_or(driver.password_prompt());
        loop {
            let sets: Vec<(PromptRole, &PatternSet)> = self
                .handshake
                .expected_roles()
                .iter()
                .map(|role| match role {
                    PromptRole::Password => (*role, password_prompt),
                    other => (*other, driver.patterns(*other)),
                })
                .collect();
            let (role, consumed, start) = self.next_prompt(&sets).await?;

            if role == PromptRole::Command && !elevation.confirms(&consumed[start..]) {
                return Err(self.handshake.rejected("device did not enter privileged mode"));
            }
            match self.handshake.on_prompt(role)? {
                Step::Send(credential) => self.send_credential(driver, account, credential).await?,
                Step::Done(_) => return Ok(()),
            }
        }
    }

    async fn prepare(&mut self, driver: &Arc<Driver>) -> std::result::Result<(), AuthError> {
        if self.prepared || !self.config.prepare {
            return Ok(());
        }
        self.prepared = true;

        let behavior = driver.behavior();
        match behavior.prepare_session(driver, self).await {
            Ok(()) => Ok(()),
            Err(e) if driver.prepare_mandatory() => {
                self.handshake.fail();
                Err(AuthError::PrepareFailed {
                    driver: driver.name().to_string(),
                    message: e.to_string(),
                })
            }
            Err(e) => {
                warn!("preparing session for driver '{}' failed: {}", driver.name(), e);
                Ok(())
            }
        }
    }

    /// Send a line using the bound driver's terminator.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let terminator = self
            .driver
            .as_ref()
            .map(|d| d.line_terminator().to_string())
            .unwrap_or_else(|| "\r".to_string());
        Ok(self
            .channel
            .send_line(line, &terminator, self.config.timeout)
            .await?)
    }

    /// Run a command and collect its output up to the next command prompt.
    ///
    /// Output matching one of the driver's error patterns is flagged in
    /// [`Response::failure_message`]; the call itself still succeeds.
    pub async fn execute(&mut self, command: &str) -> Result<Response> {
        let driver = self.driver.clone().ok_or(SessionError::NoDriver)?;
        match self.handshake.state() {
            HandshakeState::Authenticated
            | HandshakeState::Elevated
            | HandshakeState::AwaitingElevationPassword => {}
            _ => return Err(SessionError::NotAuthenticated.into()),
        }

        let start = Instant::now();
        self.channel
            .send_line(command, driver.line_terminator(), self.config.timeout)
            .await?;
        let (_, span) = self
            .channel
            .read_until(&[((), driver.command_prompt())], self.config.timeout)
            .await
            .map_err(|e| match e {
                TransportError::Timeout(after) => Error::from(ChannelError::PatternTimeout(after)),
                other => Error::from(other),
            })?;
        let raw = self.channel.buffer_mut().consume(span.end);

        let response = Response::from_raw(command, &raw, span.start, start.elapsed());
        debug!("'{}' completed in {:?}", command, response.elapsed);
        Ok(match driver.detect_failure(&response.result) {
            Some(marker) => response.with_failure(marker),
            None => response,
        })
    }

    /// Handle that aborts pending waits from another task.
    pub fn close_handle(&self) -> CloseHandle {
        self.channel.close_handle()
    }

    /// Whether the connection is still usable.
    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    /// Close the connection.
    pub async fn close(&mut self) -> Result<()> {
        Ok(self.channel.close().await?)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("driver", &self.driver.as_ref().map(|d| d.name()))
            .field("state", &self.handshake.state())
            .field("config", &self.config)
            .finish()
    }
}
