//! Remote-shell transport for boomerang.
//!
//! The [`Connector`] and [`RemoteSession`] traits are the seam between the
//! execution engine and the wire: [`Ssh2Connector`] speaks SSH through
//! libssh2, while tests substitute scripted doubles.

mod auth;
mod error;
mod known_hosts;
mod session;

pub use auth::Credential;
pub use error::{ConnectError, CredentialError, ExecError, TrustError};
pub use known_hosts::{HostKey, KnownHostsFile, TrustStore, fingerprint};
pub use session::{Ssh2Connector, Ssh2Session};

use std::time::Duration;

/// Address and login of one remote machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub hostname: String,
    pub port: u16,
    pub username: String,
}

impl Target {
    /// `hostname:port`, the form used for dialing.
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

/// How the server's identity key is verified during the handshake.
#[derive(Debug, Clone)]
pub enum HostKeyCheck {
    /// Only the given previously trusted key is accepted.
    Trusted(HostKey),
    /// Any key is accepted. Insecure: a man in the middle goes unnoticed.
    AcceptAny,
}

/// How a remote process finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The process reported an exit status.
    Code(i32),
    /// The process ended without an exit status, e.g. killed by a signal.
    Missing,
}

/// Captured output of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit: ExitStatus,
    /// Signal name reported by the server when the process was killed.
    pub signal: Option<String>,
}

/// Opens authenticated, verified sessions to remote machines.
///
/// Implementations block; callers run them on a blocking-capable thread.
pub trait Connector: Send + Sync + 'static {
    type Session: RemoteSession;

    /// Makes a single connection attempt.
    ///
    /// When `timeout` is `Some`, both the TCP dial and the handshake are
    /// bounded by it. Commands run later on the session are never bounded.
    ///
    /// # Errors
    ///
    /// Returns an error if the machine cannot be reached, its host key is
    /// not the trusted one, or authentication is rejected.
    fn connect(
        &self,
        target: &Target,
        credential: &Credential,
        host_key: &HostKeyCheck,
        timeout: Option<Duration>,
    ) -> Result<Self::Session, ConnectError>;
}

/// An open session able to run commands.
///
/// Dropping the session closes it.
pub trait RemoteSession: Send + 'static {
    /// Runs one command line in a fresh execution context and waits for it
    /// to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the execution context cannot be created or the
    /// command's output cannot be collected.
    fn exec(&mut self, command_line: &str) -> Result<ExecOutput, ExecError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_address() {
        let target = Target {
            hostname: "db-1.example.com".into(),
            port: 2222,
            username: "ops".into(),
        };
        assert_eq!(target.address(), "db-1.example.com:2222");
    }
}
