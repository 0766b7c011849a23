use std::io;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Connection Errors
// ============================================================================

/// A failed connection attempt.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Hostname did not resolve to any address.
    #[error("could not resolve [{address}]")]
    Resolve {
        address: String,
        #[source]
        source: io::Error,
    },

    /// TCP connection could not be established.
    #[error("could not dial [{address}]")]
    Dial {
        address: String,
        #[source]
        source: io::Error,
    },

    /// SSH protocol failure during session setup.
    #[error("ssh handshake with [{address}] failed")]
    Handshake {
        address: String,
        #[source]
        source: ssh2::Error,
    },

    /// The server presented no host key.
    #[error("server did not present a host key")]
    MissingHostKey,

    /// The server's key is not the trusted one.
    #[error("host key mismatch: expected {expected}, server presented {presented}")]
    HostKeyMismatch { expected: String, presented: String },

    /// The server refused the credential.
    #[error("authentication as [{username}] rejected")]
    AuthRejected {
        username: String,
        #[source]
        source: Option<ssh2::Error>,
    },

    /// The ssh agent could not be used or none of its identities was accepted.
    #[error("ssh agent authentication failed")]
    Agent(#[source] ssh2::Error),

    /// Transport-level failure not covered above.
    #[error("ssh session error")]
    Session(#[source] ssh2::Error),

    /// Failure reported by a non-libssh2 transport.
    #[error("{0}")]
    Other(String),
}

// ============================================================================
// Execution Errors
// ============================================================================

/// Failure to run a command on an open session.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The execution context could not be created or started.
    #[error("failed to start command")]
    Start(#[source] ssh2::Error),

    /// Output could not be collected after the command started.
    #[error("failed to read command output")]
    Io(#[source] io::Error),

    /// Failure reported by a non-libssh2 transport.
    #[error("{0}")]
    Other(String),
}

// ============================================================================
// Trust Store Errors
// ============================================================================

/// Failure to resolve a trusted host key.
#[derive(Error, Debug)]
pub enum TrustError {
    /// Known-hosts file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Matching entry could not be decoded.
    #[error("malformed entry for [{host}] at {}:{line}", path.display())]
    Malformed {
        host: String,
        path: PathBuf,
        line: usize,
    },

    /// No trusted key recorded for the host.
    #[error("no hostkey for [{host}]")]
    NotFound { host: String },
}

// ============================================================================
// Credential Errors
// ============================================================================

/// Failure to resolve the run's authentication credential.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Private key file could not be read.
    #[error("unable to read private key [{}]", path.display())]
    KeyUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File does not contain a private key.
    #[error("[{}] is not a private key", path.display())]
    NotAPrivateKey { path: PathBuf },

    /// Password authentication selected without a password.
    #[error("password authentication requires a non-empty password")]
    EmptyPassword,

    /// SSH_AUTH_SOCK is not set.
    #[error("SSH_AUTH_SOCK is not set; start an ssh agent first")]
    AgentSocketUnset,

    /// Agent could not be reached or queried.
    #[error("could not query ssh agent")]
    Agent(#[source] ssh2::Error),

    /// Agent has no identities loaded.
    #[error(
        "ssh agent holds no identities. Either no key is loaded or it has a passphrase, confirm with ssh-add -l and load with ssh-add"
    )]
    AgentEmpty,
}
