use crate::worker::WorkerError;
use ssh::{ConnectError, TrustError};
use std::error::Error;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Host Errors
// ============================================================================

/// Why a host could not be connected. Recorded in its result, never
/// propagated past the host's task.
#[derive(Error, Debug)]
pub enum HostError {
    /// A mandatory descriptor field is empty.
    #[error("host is missing mandatory field [{0}]")]
    MissingField(&'static str),

    #[error("invalid ssh port")]
    InvalidPort(#[source] PortError),

    /// Connecting to the local machine is not supported.
    #[error("connection to [{0}] is unsupported")]
    Unsupported(String),

    #[error("failed host key check")]
    HostKey(#[source] TrustError),

    /// The single unbounded attempt failed.
    #[error("failed client connection")]
    Connect(#[source] ConnectError),

    /// Every attempt failed before the deadline.
    #[error("failed client connection after {attempts} {}", attempt_noun(.attempts))]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: ConnectError,
    },

    /// The deadline elapsed while attempts were still possible.
    #[error(
        "connection deadline of {deadline:?} exceeded ({retries} retries, {wait:?} wait)"
    )]
    DeadlineExceeded {
        retries: u32,
        wait: Duration,
        deadline: Duration,
        #[source]
        last: Option<ConnectError>,
    },

    /// A blocking step could not be run off the runtime.
    #[error("host worker failed")]
    Worker(#[source] WorkerError),
}

#[allow(
    clippy::trivially_copy_pass_by_ref,
    reason = "error format arguments receive fields by reference"
)]
fn attempt_noun(attempts: &u32) -> &'static str {
    if *attempts == 1 { "attempt" } else { "attempts" }
}

/// Malformed `ssh_port` value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("[{0}] is not a number")]
    NotANumber(String),

    #[error("{0} is outside 1..=65535")]
    OutOfRange(i64),
}

// ============================================================================
// Fleet Errors
// ============================================================================

/// Conditions that make the whole run meaningless.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FleetError {
    #[error("inventory is empty")]
    EmptyInventory,

    #[error("no commands to run")]
    NoCommands,
}

/// Flattens an error and its `source()` chain, outermost first.
pub fn error_chain(error: &dyn Error) -> Vec<String> {
    let mut chain = vec![error.to_string()];
    let mut current = error.source();
    while let Some(source) = current {
        chain.push(source.to_string());
        current = source.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_outermost_first() {
        let error = HostError::InvalidPort(PortError::OutOfRange(70000));
        assert_eq!(
            error_chain(&error),
            vec!["invalid ssh port", "70000 is outside 1..=65535"]
        );
    }

    #[test]
    fn test_error_chain_single() {
        let error = HostError::Unsupported("localhost".into());
        assert_eq!(
            error_chain(&error),
            vec!["connection to [localhost] is unsupported"]
        );
    }

    #[test]
    fn test_error_chain_nested_transport() {
        let error = HostError::RetriesExhausted {
            attempts: 3,
            source: ConnectError::Dial {
                address: "web-1:22".into(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            },
        };
        let chain = error_chain(&error);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0], "failed client connection after 3 attempts");
        assert_eq!(chain[1], "could not dial [web-1:22]");
        assert_eq!(chain[2], "refused");
    }

    #[test]
    fn test_single_attempt_is_singular() {
        let error = HostError::RetriesExhausted {
            attempts: 1,
            source: ConnectError::Other("refused".into()),
        };
        assert_eq!(error.to_string(), "failed client connection after 1 attempt");
    }

    #[test]
    fn test_deadline_without_last_error() {
        let error = HostError::DeadlineExceeded {
            retries: 1,
            wait: Duration::from_secs(2),
            deadline: Duration::from_secs(5),
            last: None,
        };
        assert_eq!(error_chain(&error).len(), 1);
    }
}
