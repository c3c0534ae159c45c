//! # Netshake
//!
//! Async dialect detection and login handshake engine for network device
//! CLIs.
//!
//! Netshake looks at the first bytes a device prints, decides which vendor
//! dialect it is talking to, and then drives the interactive login:
//! username, password and optionally the privileged-mode password, all by
//! matching prompts at the end of the received stream.
//!
//! ## Features
//!
//! - Fingerprint scoring over the stream head with a deterministic winner
//! - Built-in dialects (Cisco IOS/NX-OS/IOS-XR, Arista, Juniper, Nokia, Huawei, OneOS, Linux)
//! - Dialects loadable from data via [`driver::DriverSpec`]
//! - End-anchored prompt matching that tolerates trailing whitespace
//! - Async SSH transport via russh, and a scripted transport for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netshake::{Account, HandshakeOutcome, SessionBuilder};
//! use netshake::transport::SshConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netshake::Error> {
//!     let mut session = SessionBuilder::new()
//!         .ssh(SshConfig::new("192.0.2.1", "admin"))
//!         .open()
//!         .await?;
//!
//!     let account = Account::new("admin", "secret");
//!     let outcome = session.login(&account).await?;
//!     assert_eq!(outcome, HandshakeOutcome::Elevated);
//!
//!     let response = session.execute("show version").await?;
//!     println!("{}", response.result);
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use driver::{Driver, DriverBehavior, DriverRegistry, DriverSpec, Elevation};
pub use error::{AuthError, Error, Result};
pub use session::{
    Account, HandshakeOutcome, HandshakeState, Response, Session, SessionBuilder, SessionConfig,
};
pub use transport::{AuthMethod, SshConfig};
