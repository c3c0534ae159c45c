//! Login handshake state machine.
//!
//! [`Handshake`] decides what to send for each prompt the device shows. It
//! does no I/O, so every transition can be exercised directly in tests; the
//! [`Session`](super::Session) feeds it prompts and performs the writes.

use std::fmt;

use log::debug;

use crate::channel::PromptRole;
use crate::error::AuthError;

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    /// Nothing sent yet; a user, password or command prompt may come first.
    AwaitingUser,
    /// Username sent, or the device asked for a password straight away.
    AwaitingPassword,
    /// Command prompt reached with normal privileges.
    Authenticated,
    /// Elevation command sent; waiting for its password or the new prompt.
    AwaitingElevationPassword,
    /// Command prompt reached in privileged mode.
    Elevated,
    /// Terminal; the session must reconnect.
    Failed,
}

impl HandshakeState {
    /// Human-readable name, used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            HandshakeState::AwaitingUser => "awaiting user",
            HandshakeState::AwaitingPassword => "awaiting password",
            HandshakeState::Authenticated => "authenticated",
            HandshakeState::AwaitingElevationPassword => "awaiting elevation password",
            HandshakeState::Elevated => "elevated",
            HandshakeState::Failed => "failed",
        }
    }

    /// Position along the login sequence; `Failed` sorts last.
    pub fn rank(&self) -> u8 {
        match self {
            HandshakeState::AwaitingUser => 0,
            HandshakeState::AwaitingPassword => 1,
            HandshakeState::Authenticated => 2,
            HandshakeState::AwaitingElevationPassword => 3,
            HandshakeState::Elevated => 4,
            HandshakeState::Failed => 5,
        }
    }

    /// Whether the state is a login success.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, HandshakeState::Authenticated | HandshakeState::Elevated)
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful end of a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeOutcome {
    /// Logged in at the normal privilege level.
    Authenticated,
    /// Logged in and elevated.
    Elevated,
}

/// Which secret the session must send next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    /// The account's username.
    Username,
    /// The login password.
    Password,
    /// The elevation secret, or the password when none is set.
    ElevationSecret,
}

/// What to do after a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Send a credential and keep waiting.
    Send(Credential),
    /// The exchange is complete.
    Done(HandshakeOutcome),
}

/// Pure handshake state machine.
///
/// States only move forward. The one exception is the retry path: with a
/// password budget above one, a repeated user or password prompt resends
/// the credentials instead of failing, without leaving the login states.
#[derive(Debug, Clone)]
pub struct Handshake {
    state: HandshakeState,
    user: String,
    max_attempts: u32,
    username_attempts: u32,
    password_attempts: u32,
    elevation_attempts: u32,
}

const LOGIN_ROLES: [PromptRole; 3] = [PromptRole::User, PromptRole::Password, PromptRole::Command];
const LOGIN_RETRY_ROLES: [PromptRole; 4] = [
    PromptRole::LoginError,
    PromptRole::User,
    PromptRole::Password,
    PromptRole::Command,
];
const ELEVATION_ROLES: [PromptRole; 3] = [
    PromptRole::LoginError,
    PromptRole::Password,
    PromptRole::Command,
];

impl Handshake {
    /// Start a handshake for `user` allowing `max_attempts` password
    /// submissions (at least one).
    pub fn new(user: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            state: HandshakeState::AwaitingUser,
            user: user.into(),
            max_attempts: max_attempts.max(1),
            username_attempts: 0,
            password_attempts: 0,
            elevation_attempts: 0,
        }
    }

    /// Name the user in rejection errors.
    pub fn set_user(&mut self, user: impl Into<String>) {
        self.user = user.into();
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// The success reached so far, if any.
    pub fn outcome(&self) -> Option<HandshakeOutcome> {
        match self.state {
            HandshakeState::Authenticated => Some(HandshakeOutcome::Authenticated),
            HandshakeState::Elevated => Some(HandshakeOutcome::Elevated),
            _ => None,
        }
    }

    /// Prompt roles worth waiting for in the current state, in priority
    /// order. Login errors are only watched once a credential went out, so
    /// banner text cannot fail a login that has not started.
    pub fn expected_roles(&self) -> &'static [PromptRole] {
        match self.state {
            HandshakeState::AwaitingUser | HandshakeState::AwaitingPassword => {
                if self.username_attempts + self.password_attempts == 0 {
                    &LOGIN_ROLES
                } else {
                    &LOGIN_RETRY_ROLES
                }
            }
            HandshakeState::AwaitingElevationPassword => &ELEVATION_ROLES,
            _ => &[],
        }
    }

    /// Advance on a matched prompt. Any error moves the handshake to
    /// [`HandshakeState::Failed`].
    pub fn on_prompt(&mut self, role: PromptRole) -> Result<Step, AuthError> {
        let before = self.state;
        let result = self.transition(role);
        match &result {
            Ok(step) => debug!("{} prompt while {}: {:?}, now {}", role, before, step, self.state),
            Err(e) => {
                debug!("{} prompt while {}: {}", role, before, e);
                self.state = HandshakeState::Failed;
            }
        }
        result
    }

    fn transition(&mut self, role: PromptRole) -> Result<Step, AuthError> {
        use HandshakeState::*;

        match (self.state, role) {
            (Failed, _) => Err(AuthError::SessionFailed),

            (AwaitingUser | AwaitingPassword, PromptRole::LoginError) => {
                Err(self.rejected("device reported a login failure"))
            }
            (AwaitingElevationPassword, PromptRole::LoginError) => {
                Err(self.rejected("device refused elevation"))
            }

            (AwaitingUser | AwaitingPassword, PromptRole::User) => {
                if self.username_attempts >= self.max_attempts {
                    return Err(self.rejected("login prompt repeated"));
                }
                self.username_attempts += 1;
                self.state = AwaitingPassword;
                Ok(Step::Send(Credential::Username))
            }

            (AwaitingUser | AwaitingPassword, PromptRole::Password) => {
                if self.password_attempts >= self.max_attempts {
                    return Err(self.rejected("password prompt repeated"));
                }
                self.password_attempts += 1;
                self.state = AwaitingPassword;
                Ok(Step::Send(Credential::Password))
            }

            (AwaitingUser | AwaitingPassword, PromptRole::Command) => {
                self.state = Authenticated;
                Ok(Step::Done(HandshakeOutcome::Authenticated))
            }

            (AwaitingElevationPassword, PromptRole::Password) => {
                if self.elevation_attempts >= self.max_attempts {
                    return Err(self.rejected("elevation password refused"));
                }
                self.elevation_attempts += 1;
                Ok(Step::Send(Credential::ElevationSecret))
            }

            (AwaitingElevationPassword, PromptRole::Command) => {
                self.state = Elevated;
                Ok(Step::Done(HandshakeOutcome::Elevated))
            }

            (state, role) => Err(AuthError::UnexpectedPrompt { state, role }),
        }
    }

    /// Enter the elevation exchange. Only valid once authenticated.
    pub fn begin_elevation(&mut self) -> Result<(), AuthError> {
        match self.state {
            HandshakeState::Authenticated => {
                self.state = HandshakeState::AwaitingElevationPassword;
                Ok(())
            }
            HandshakeState::Failed => Err(AuthError::SessionFailed),
            state => Err(AuthError::InvalidState {
                state,
                action: "begin elevation",
            }),
        }
    }

    /// Mark elevation complete when the exchange ended without a final
    /// prompt, e.g. for dialects that need no elevation.
    pub fn finish_elevation(&mut self) -> Result<HandshakeOutcome, AuthError> {
        match self.state {
            HandshakeState::AwaitingElevationPassword | HandshakeState::Elevated => {
                self.state = HandshakeState::Elevated;
                Ok(HandshakeOutcome::Elevated)
            }
            HandshakeState::Failed => Err(AuthError::SessionFailed),
            state => Err(AuthError::InvalidState {
                state,
                action: "finish elevation",
            }),
        }
    }

    /// Fail the handshake. Terminal.
    pub fn fail(&mut self) {
        self.state = HandshakeState::Failed;
    }

    /// Build a rejection for the handshake's user.
    pub fn rejected(&self, reason: &str) -> AuthError {
        AuthError::Rejected {
            user: self.user.clone(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(handshake: &mut Handshake, roles: &[PromptRole]) -> Vec<Result<Step, AuthError>> {
        roles.iter().map(|role| handshake.on_prompt(*role)).collect()
    }

    #[test]
    fn test_full_login() {
        let mut handshake = Handshake::new("admin", 1);
        assert_eq!(
            handshake.on_prompt(PromptRole::User).unwrap(),
            Step::Send(Credential::Username)
        );
        assert_eq!(handshake.state(), HandshakeState::AwaitingPassword);
        assert_eq!(
            handshake.on_prompt(PromptRole::Password).unwrap(),
            Step::Send(Credential::Password)
        );
        assert_eq!(
            handshake.on_prompt(PromptRole::Command).unwrap(),
            Step::Done(HandshakeOutcome::Authenticated)
        );
        assert_eq!(handshake.outcome(), Some(HandshakeOutcome::Authenticated));
    }

    #[test]
    fn test_command_prompt_skips_login() {
        let mut handshake = Handshake::new("admin", 1);
        assert_eq!(
            handshake.on_prompt(PromptRole::Command).unwrap(),
            Step::Done(HandshakeOutcome::Authenticated)
        );
    }

    #[test]
    fn test_password_only_login() {
        let mut handshake = Handshake::new("admin", 1);
        assert_eq!(
            handshake.on_prompt(PromptRole::Password).unwrap(),
            Step::Send(Credential::Password)
        );
        assert_eq!(handshake.state(), HandshakeState::AwaitingPassword);
    }

    #[test]
    fn test_repeated_password_prompt_is_rejected() {
        let mut handshake = Handshake::new("admin", 1);
        handshake.on_prompt(PromptRole::Password).unwrap();
        let err = handshake.on_prompt(PromptRole::Password).unwrap_err();
        assert!(matches!(err, AuthError::Rejected { .. }));
        assert!(!err.is_retryable());
        assert_eq!(handshake.state(), HandshakeState::Failed);
    }

    #[test]
    fn test_retry_budget_allows_one_retry() {
        let mut handshake = Handshake::new("admin", 2);
        let steps = drive(
            &mut handshake,
            &[
                PromptRole::User,
                PromptRole::Password,
                PromptRole::User,
                PromptRole::Password,
            ],
        );
        assert!(steps.iter().all(|s| s.is_ok()));
        assert_eq!(handshake.state(), HandshakeState::AwaitingPassword);

        let err = handshake.on_prompt(PromptRole::Password).unwrap_err();
        assert!(matches!(err, AuthError::Rejected { .. }));
    }

    #[test]
    fn test_login_error_only_watched_after_sending() {
        let mut handshake = Handshake::new("admin", 1);
        assert!(!handshake.expected_roles().contains(&PromptRole::LoginError));
        handshake.on_prompt(PromptRole::User).unwrap();
        assert!(handshake.expected_roles().contains(&PromptRole::LoginError));
        let err = handshake.on_prompt(PromptRole::LoginError).unwrap_err();
        assert!(matches!(err, AuthError::Rejected { .. }));
    }

    #[test]
    fn test_elevation() {
        let mut handshake = Handshake::new("admin", 1);
        handshake.on_prompt(PromptRole::Command).unwrap();
        handshake.begin_elevation().unwrap();
        assert_eq!(handshake.state(), HandshakeState::AwaitingElevationPassword);
        assert_eq!(
            handshake.on_prompt(PromptRole::Password).unwrap(),
            Step::Send(Credential::ElevationSecret)
        );
        assert_eq!(
            handshake.on_prompt(PromptRole::Command).unwrap(),
            Step::Done(HandshakeOutcome::Elevated)
        );
    }

    #[test]
    fn test_no_regression_after_elevated() {
        let mut handshake = Handshake::new("admin", 1);
        handshake.on_prompt(PromptRole::Command).unwrap();
        handshake.begin_elevation().unwrap();
        handshake.on_prompt(PromptRole::Command).unwrap();
        assert_eq!(handshake.state(), HandshakeState::Elevated);

        let mut highest = handshake.state().rank();
        for role in [PromptRole::User, PromptRole::Password, PromptRole::Command] {
            let mut next = handshake.clone();
            let _ = next.on_prompt(role);
            assert_ne!(next.state(), HandshakeState::Authenticated);
            assert!(next.state().rank() >= highest);
            highest = highest.max(next.state().rank());
        }
        assert!(matches!(
            handshake.begin_elevation(),
            Err(AuthError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut handshake = Handshake::new("admin", 1);
        handshake.fail();
        assert!(matches!(
            handshake.on_prompt(PromptRole::Command),
            Err(AuthError::SessionFailed)
        ));
        assert!(matches!(
            handshake.begin_elevation(),
            Err(AuthError::SessionFailed)
        ));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(
            HandshakeState::AwaitingElevationPassword.to_string(),
            "awaiting elevation password"
        );
    }
}
