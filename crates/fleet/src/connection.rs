use crate::error::HostError;
use crate::types::{ConnectionPolicy, HostDescriptor};
use crate::worker;
use ssh::{ConnectError, Connector, HostKeyCheck, Target, TrustStore};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Slack added to the computed connection deadline.
pub const DEADLINE_MARGIN: Duration = Duration::from_secs(1);

impl ConnectionPolicy {
    /// Bound on the whole retry loop, or `None` when the timeout is zero.
    ///
    /// `connect_timeout × (retry_count + 1) + retry_wait × retry_count`,
    /// plus [`DEADLINE_MARGIN`].
    pub fn deadline(&self) -> Option<Duration> {
        if self.connect_timeout.is_zero() {
            return None;
        }

        let attempts = self.retry_count.saturating_add(1);
        Some(
            self.connect_timeout
                .saturating_mul(attempts)
                .saturating_add(self.retry_wait.saturating_mul(self.retry_count))
                .saturating_add(DEADLINE_MARGIN),
        )
    }
}

/// Turns host descriptors into authenticated, verified sessions.
pub struct ConnectionManager<C, T> {
    connector: Arc<C>,
    trust: Arc<T>,
    policy: Arc<ConnectionPolicy>,
}

impl<C, T> Clone for ConnectionManager<C, T> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
            trust: Arc::clone(&self.trust),
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<C, T> fmt::Debug for ConnectionManager<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<C: Connector, T: TrustStore> ConnectionManager<C, T> {
    pub fn new(connector: Arc<C>, trust: Arc<T>, policy: Arc<ConnectionPolicy>) -> Self {
        Self {
            connector,
            trust,
            policy,
        }
    }

    /// Opens a session to `host`.
    ///
    /// The descriptor is validated and the trusted key resolved before any
    /// network activity; only connection failures are retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor is invalid, names the local
    /// machine, has no trusted key, or every attempt fails.
    pub async fn connect(&self, host: &HostDescriptor) -> Result<C::Session, HostError> {
        let target = validate(host)?;
        let host_key = self.host_key(&target).await?;

        let Some(deadline) = self.policy.deadline() else {
            return self
                .attempt(&target, &host_key, None)
                .await
                .map_err(HostError::Connect);
        };

        let mut last = None;
        let outcome = tokio::time::timeout(
            deadline,
            self.retry(&target, &host_key, &mut last),
        )
        .await;

        outcome.unwrap_or_else(|_| {
            Err(HostError::DeadlineExceeded {
                retries: self.policy.retry_count,
                wait: self.policy.retry_wait,
                deadline,
                last,
            })
        })
    }

    /// Resolves the trusted key on a worker thread; stores may read files.
    async fn host_key(&self, target: &Target) -> Result<HostKeyCheck, HostError> {
        if !self.policy.host_key_verification {
            return Ok(HostKeyCheck::AcceptAny);
        }

        let trust = Arc::clone(&self.trust);
        let hostname = target.hostname.clone();
        let port = target.port;

        worker::run("boomerang-trust", move || trust.lookup(&hostname, port))
            .await
            .map_err(HostError::Worker)?
            .map(HostKeyCheck::Trusted)
            .map_err(HostError::HostKey)
    }

    async fn retry(
        &self,
        target: &Target,
        host_key: &HostKeyCheck,
        last: &mut Option<ConnectError>,
    ) -> Result<C::Session, HostError> {
        let timeout = Some(self.policy.connect_timeout);
        let mut remaining = self.policy.retry_count;
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.attempt(target, host_key, timeout).await {
                Ok(session) => return Ok(session),
                Err(error) if remaining > 0 => {
                    *last = Some(error);
                    remaining -= 1;
                    tokio::time::sleep(self.policy.retry_wait).await;
                }
                Err(source) => return Err(HostError::RetriesExhausted { attempts, source }),
            }
        }
    }

    /// One blocking connection attempt on its own thread.
    async fn attempt(
        &self,
        target: &Target,
        host_key: &HostKeyCheck,
        timeout: Option<Duration>,
    ) -> Result<C::Session, ConnectError> {
        let connector = Arc::clone(&self.connector);
        let policy = Arc::clone(&self.policy);
        let target = target.clone();
        let host_key = host_key.clone();

        worker::run("boomerang-connect", move || {
            connector.connect(&target, &policy.credential, &host_key, timeout)
        })
        .await
        .map_err(|e| ConnectError::Other(format!("connection attempt aborted: {e}")))?
    }
}

fn validate(host: &HostDescriptor) -> Result<Target, HostError> {
    if is_local(&host.hostname) {
        return Err(HostError::Unsupported(host.hostname.clone()));
    }
    if host.hostname.trim().is_empty() {
        return Err(HostError::MissingField("hostname"));
    }
    if host.username.trim().is_empty() {
        return Err(HostError::MissingField("username"));
    }

    let port = host.normalized_port().map_err(HostError::InvalidPort)?;

    Ok(Target {
        hostname: host.hostname.clone(),
        port,
        username: host.username.clone(),
    })
}

fn is_local(hostname: &str) -> bool {
    hostname == "127.0.0.1" || hostname.eq_ignore_ascii_case("localhost")
}
