//! Error types for netshake.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::channel::PromptRole;
use crate::session::HandshakeState;

/// Main error type for netshake operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver definition errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Login handshake errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Session usage errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Transport layer errors (connection, SSH protocol, reads and writes).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// SSH-level authentication failed
    #[error("SSH authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key not present in known_hosts (strict mode)
    #[error("Unknown host key for {host}:{port}")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed, locally or by the peer
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Scripted peer received something it did not expect
    #[error("Replay mismatch: {0}")]
    ReplayMismatch(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern waits, channel setup).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Failed to open PTY channel
    #[error("Failed to open PTY channel")]
    PtyOpenFailed,

    /// Failed to request shell
    #[error("Failed to request shell")]
    ShellRequestFailed,

    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),
}

/// Driver definition errors. These are configuration errors raised when a
/// driver is built or registered, never while matching.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A pattern in a driver definition does not compile
    #[error("Invalid {role} pattern in driver '{driver}': {source}")]
    InvalidPattern {
        driver: String,
        role: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// A driver has no command prompt pattern
    #[error("Driver '{driver}' defines no command prompt pattern")]
    MissingCommandPrompt { driver: String },

    /// Fingerprint score outside 0..=100
    #[error("Driver '{driver}' uses head score {score}, must be at most 100")]
    ScoreOutOfRange { driver: String, score: u8 },

    /// A driver with the same name is already registered
    #[error("Driver '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// Lookup of a driver name that is not registered
    #[error("Unknown driver '{name}'")]
    UnknownDriver { name: String },

    /// The session is already bound to another driver
    #[error("Session already bound to driver '{bound}', cannot rebind to '{requested}'")]
    AlreadyBound { bound: String, requested: String },

    /// Structurally invalid definition
    #[error("Invalid driver definition: {message}")]
    InvalidDefinition { message: String },
}

impl DriverError {
    /// Wrap a regex compile failure for the given driver and pattern role.
    pub fn invalid_pattern(driver: &str, role: &str, source: regex::Error) -> Self {
        DriverError::InvalidPattern {
            driver: driver.to_string(),
            role: role.to_string(),
            source: Box::new(source),
        }
    }
}

/// Handshake failures. All of them are terminal for the session.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Credentials were refused by the device
    #[error("Authentication rejected for user '{user}': {reason}")]
    Rejected { user: String, reason: String },

    /// No expected prompt appeared in time
    #[error("Timed out after {after:?} while {state}")]
    Timeout {
        state: HandshakeState,
        after: Duration,
    },

    /// Transport closed mid-handshake
    #[error("Disconnected while {state}")]
    Disconnected { state: HandshakeState },

    /// Any other transport failure
    #[error("Transport failed while {state}: {source}")]
    Transport {
        state: HandshakeState,
        #[source]
        source: TransportError,
    },

    /// A prompt arrived that is not valid in the current state
    #[error("Unexpected {role} prompt while {state}")]
    UnexpectedPrompt {
        state: HandshakeState,
        role: PromptRole,
    },

    /// The operation is not valid in the current state
    #[error("Cannot {action} while {state}")]
    InvalidState {
        state: HandshakeState,
        action: &'static str,
    },

    /// A driver marked its session preparation mandatory and it failed
    #[error("Session preparation failed for driver '{driver}': {message}")]
    PrepareFailed { driver: String, message: String },

    /// The session already failed and cannot be resumed
    #[error("Session has failed; reconnect to retry")]
    SessionFailed,

    /// No driver is bound to the session
    #[error("No driver bound to session")]
    Unbound,
}

impl AuthError {
    /// Build the error for a failed wait in the given state.
    pub(crate) fn from_transport(state: HandshakeState, err: TransportError) -> Self {
        match err {
            TransportError::Timeout(after) => AuthError::Timeout { state, after },
            TransportError::Disconnected => AuthError::Disconnected { state },
            source => AuthError::Transport { state, source },
        }
    }

    /// Whether reconnecting and retrying may succeed.
    ///
    /// Timeouts and disconnects are transport conditions; rejected
    /// credentials will be rejected again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::Timeout { .. } | AuthError::Disconnected { .. } | AuthError::Transport { .. }
        )
    }
}

/// Session usage errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Operation requires a completed handshake
    #[error("Session not authenticated - call authenticate() first")]
    NotAuthenticated,

    /// Neither a transport nor SSH settings were given
    #[error("No transport configured - call transport() or ssh()")]
    NoTransport,

    /// Operation requires a bound driver
    #[error("No driver bound - call resolve_driver() first")]
    NoDriver,

    /// A command completed but its output matched a failure pattern
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },
}

/// Result type alias using netshake's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let timeout = AuthError::from_transport(
            HandshakeState::AwaitingUser,
            TransportError::Timeout(Duration::from_secs(1)),
        );
        assert!(matches!(timeout, AuthError::Timeout { .. }));
        assert!(timeout.is_retryable());

        let gone = AuthError::from_transport(
            HandshakeState::AwaitingPassword,
            TransportError::Disconnected,
        );
        assert!(matches!(gone, AuthError::Disconnected { .. }));
        assert!(gone.is_retryable());

        let rejected = AuthError::Rejected {
            user: "admin".into(),
            reason: "password prompt repeated".into(),
        };
        assert!(!rejected.is_retryable());
    }

    #[test]
    fn test_error_display_names_state() {
        let err = AuthError::Timeout {
            state: HandshakeState::AwaitingPassword,
            after: Duration::from_millis(50),
        };
        assert_eq!(err.to_string(), "Timed out after 50ms while awaiting password");
    }
}
