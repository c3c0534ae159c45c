//! Driver definition for one CLI dialect.

use std::fmt;
use std::sync::Arc;

use log::debug;

use super::elevation::Elevation;
use super::fingerprint::{Fingerprint, HeadSignature};
use super::{DefaultBehavior, DriverBehavior};
use crate::channel::{PatternSet, PromptRole};
use crate::error::{DriverError, Result};
use crate::session::{Account, HandshakeOutcome, Session};

/// Everything the session engine needs to know about one vendor/OS dialect.
///
/// Built with the `with_*` methods, which compile patterns as they go and
/// report malformed ones as [`DriverError::InvalidPattern`]. A finished
/// driver is immutable; registries hand it out as `Arc<Driver>`.
#[derive(Clone)]
pub struct Driver {
    name: String,
    user_prompt: PatternSet,
    password_prompt: PatternSet,
    command_prompt: PatternSet,
    login_error: PatternSet,
    fingerprint: Fingerprint,
    init_commands: Vec<String>,
    elevation: Option<Elevation>,
    error_patterns: PatternSet,
    prepare_mandatory: bool,
    line_terminator: String,
    behavior: Option<Arc<dyn DriverBehavior>>,
}

impl Driver {
    /// Create an empty driver. At least a command prompt must be added
    /// before it validates.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_prompt: PatternSet::empty(),
            password_prompt: PatternSet::empty(),
            command_prompt: PatternSet::empty(),
            login_error: PatternSet::empty(),
            fingerprint: Fingerprint::new(),
            init_commands: vec![],
            elevation: None,
            error_patterns: PatternSet::empty(),
            prepare_mandatory: false,
            line_terminator: "\r".to_string(),
            behavior: None,
        }
    }

    fn compile(
        &self,
        role: &str,
        patterns: &[&str],
    ) -> std::result::Result<PatternSet, DriverError> {
        PatternSet::compile(patterns)
            .map_err(|e| DriverError::invalid_pattern(&self.name, role, e))
    }

    fn compile_unanchored(
        &self,
        role: &str,
        patterns: &[&str],
    ) -> std::result::Result<PatternSet, DriverError> {
        PatternSet::compile_unanchored(patterns)
            .map_err(|e| DriverError::invalid_pattern(&self.name, role, e))
    }

    /// Set the username prompt patterns.
    pub fn with_user_prompt(mut self, patterns: &[&str]) -> std::result::Result<Self, DriverError> {
        self.user_prompt = self.compile("user", patterns)?;
        Ok(self)
    }

    /// Set the password prompt patterns.
    pub fn with_password_prompt(
        mut self,
        patterns: &[&str],
    ) -> std::result::Result<Self, DriverError> {
        self.password_prompt = self.compile("password", patterns)?;
        Ok(self)
    }

    /// Set the command prompt patterns.
    pub fn with_command_prompt(
        mut self,
        patterns: &[&str],
    ) -> std::result::Result<Self, DriverError> {
        self.command_prompt = self.compile("command", patterns)?;
        Ok(self)
    }

    /// Set the login failure messages. These match anywhere in the text
    /// received since the last credential was sent.
    pub fn with_login_error(mut self, patterns: &[&str]) -> std::result::Result<Self, DriverError> {
        self.login_error = self.compile_unanchored("login-error", patterns)?;
        Ok(self)
    }

    /// Set the markers that flag a failed command in its output.
    pub fn with_error_patterns(
        mut self,
        patterns: &[&str],
    ) -> std::result::Result<Self, DriverError> {
        self.error_patterns = self.compile_unanchored("error", patterns)?;
        Ok(self)
    }

    /// Add a head signature worth `score` (at most 100).
    pub fn with_head_signature(
        mut self,
        pattern: &str,
        score: u8,
    ) -> std::result::Result<Self, DriverError> {
        if score > 100 {
            return Err(DriverError::ScoreOutOfRange {
                driver: self.name.clone(),
                score,
            });
        }
        let signature = HeadSignature::new(pattern, score)
            .map_err(|e| DriverError::invalid_pattern(&self.name, "head", e))?;
        self.fingerprint.push(signature);
        Ok(self)
    }

    /// Add a command run once the session is authenticated.
    pub fn with_init_command(mut self, command: impl Into<String>) -> Self {
        self.init_commands.push(command.into());
        self
    }

    /// Set how the dialect enters privileged mode.
    pub fn with_elevation(mut self, elevation: Elevation) -> Self {
        self.elevation = Some(elevation);
        self
    }

    /// Make a failed session preparation fail the login.
    pub fn with_prepare_mandatory(mut self, mandatory: bool) -> Self {
        self.prepare_mandatory = mandatory;
        self
    }

    /// Set the bytes appended to every line sent (default `"\r"`).
    pub fn with_line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.line_terminator = terminator.into();
        self
    }

    /// Install custom behavior hooks.
    pub fn with_behavior(mut self, behavior: Arc<dyn DriverBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Check the driver is usable: a login can only complete on a command
    /// prompt, so one must be defined.
    pub fn validate(&self) -> std::result::Result<(), DriverError> {
        if self.name.is_empty() {
            return Err(DriverError::InvalidDefinition {
                message: "driver name is empty".to_string(),
            });
        }
        if self.command_prompt.is_empty() {
            return Err(DriverError::MissingCommandPrompt {
                driver: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Driver name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Username prompt patterns.
    pub fn user_prompt(&self) -> &PatternSet {
        &self.user_prompt
    }

    /// Password prompt patterns.
    pub fn password_prompt(&self) -> &PatternSet {
        &self.password_prompt
    }

    /// Command prompt patterns.
    pub fn command_prompt(&self) -> &PatternSet {
        &self.command_prompt
    }

    /// Login failure patterns.
    pub fn login_error(&self) -> &PatternSet {
        &self.login_error
    }

    /// Patterns for a prompt role.
    pub fn patterns(&self, role: PromptRole) -> &PatternSet {
        match role {
            PromptRole::User => &self.user_prompt,
            PromptRole::Password => &self.password_prompt,
            PromptRole::Command => &self.command_prompt,
            PromptRole::LoginError => &self.login_error,
        }
    }

    /// The data-driven fingerprint.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Commands run by the default session preparation.
    pub fn init_commands(&self) -> &[String] {
        &self.init_commands
    }

    /// Elevation step, if the dialect has one.
    pub fn elevation(&self) -> Option<&Elevation> {
        self.elevation.as_ref()
    }

    /// Command failure markers.
    pub fn error_patterns(&self) -> &PatternSet {
        &self.error_patterns
    }

    /// Whether session preparation failures fail the login.
    pub fn prepare_mandatory(&self) -> bool {
        self.prepare_mandatory
    }

    /// Line terminator.
    pub fn line_terminator(&self) -> &str {
        &self.line_terminator
    }

    /// Behavior hooks; [`DefaultBehavior`] unless custom ones are installed.
    pub fn behavior(&self) -> Arc<dyn DriverBehavior> {
        match &self.behavior {
            Some(behavior) => behavior.clone(),
            None => Arc::new(DefaultBehavior),
        }
    }

    /// Confidence in `0..=100` that `head` was produced by this dialect.
    pub fn score(&self, head: &[u8]) -> u8 {
        let custom = self.behavior.as_ref().and_then(|b| b.score(self, head));
        custom.unwrap_or_else(|| self.fingerprint.score(head)).min(100)
    }

    /// First error marker found in command output.
    pub fn detect_failure(&self, output: &str) -> Option<String> {
        self.error_patterns
            .find_anywhere(output.as_bytes())
            .map(|span| {
                let marker = &output.as_bytes()[span.start..span.end];
                String::from_utf8_lossy(marker).into_owned()
            })
    }

    /// Bind `session` to this driver and run the login handshake.
    pub async fn authenticate(
        self: &Arc<Self>,
        session: &mut Session,
        account: &Account,
    ) -> Result<HandshakeOutcome> {
        session.bind(self.clone())?;
        debug!("authenticating with driver '{}'", self.name);
        Ok(session.authenticate(account).await?)
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("name", &self.name)
            .field("user_prompt", &self.user_prompt.sources())
            .field("password_prompt", &self.password_prompt.sources())
            .field("command_prompt", &self.command_prompt.sources())
            .field("login_error", &self.login_error.sources())
            .field("fingerprint", &self.fingerprint)
            .field("init_commands", &self.init_commands)
            .field("elevation", &self.elevation.as_ref().map(|e| &e.command))
            .field("prepare_mandatory", &self.prepare_mandatory)
            .field("behavior", &self.behavior.as_ref().map(|_| "<DriverBehavior>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedScore(u8);

    #[async_trait::async_trait]
    impl DriverBehavior for FixedScore {
        fn score(&self, _driver: &Driver, _head: &[u8]) -> Option<u8> {
            Some(self.0)
        }
    }

    fn minimal() -> Driver {
        Driver::new("test")
            .with_command_prompt(&[r"[\r\n]\w+[>#]$"])
            .unwrap()
    }

    #[test]
    fn test_validate_requires_command_prompt() {
        let err = Driver::new("bare").validate().unwrap_err();
        assert!(matches!(err, DriverError::MissingCommandPrompt { .. }));
        assert!(minimal().validate().is_ok());
    }

    #[test]
    fn test_invalid_pattern_names_role() {
        let err = Driver::new("broken")
            .with_password_prompt(&["(unclosed"])
            .unwrap_err();
        match err {
            DriverError::InvalidPattern { driver, role, .. } => {
                assert_eq!(driver, "broken");
                assert_eq!(role, "password");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_score_out_of_range() {
        let err = minimal().with_head_signature("x", 101).unwrap_err();
        assert!(matches!(err, DriverError::ScoreOutOfRange { score: 101, .. }));
    }

    #[test]
    fn test_custom_score_is_clamped() {
        let driver = minimal().with_behavior(Arc::new(FixedScore(250)));
        assert_eq!(driver.score(b""), 100);
    }

    #[test]
    fn test_detect_failure() {
        let driver = minimal()
            .with_error_patterns(&[r"% Invalid input"])
            .unwrap();
        assert_eq!(
            driver.detect_failure("show foo\n     ^\n% Invalid input detected at '^' marker."),
            Some("% Invalid input".to_string())
        );
        assert_eq!(driver.detect_failure("all good"), None);
    }
}
