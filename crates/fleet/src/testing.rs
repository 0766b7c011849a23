//! Scripted transport doubles for exercising the engine without a network.

use crate::types::{Command, ConnectionPolicy, HostDescriptor};
use ssh::{
    ConnectError, Connector, Credential, ExecError, ExecOutput, ExitStatus, HostKey,
    HostKeyCheck, RemoteSession, Target, TrustError, TrustStore,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// How a scripted host answers connection attempts.
#[derive(Debug, Clone)]
pub(crate) enum Behaviour {
    /// Every attempt fails at dial time.
    Refuse,
    /// Every attempt is rejected at authentication.
    RejectAuth,
    /// Every attempt blocks for the given time, ignoring its timeout, then fails.
    Hang(Duration),
    /// The first `failures` attempts are refused, then the host accepts.
    Flaky { failures: u32, outcomes: Vec<Outcome> },
    /// Connects; commands answer with `outcomes` in order.
    Accept(Vec<Outcome>),
}

/// How one scripted command finishes.
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    Exit {
        code: i32,
        stdout: &'static str,
        stderr: &'static str,
    },
    /// Killed by a signal, no exit status.
    Killed(&'static str),
    /// The execution context cannot be opened.
    StartFails,
    /// Blocks for the given time, then exits 0.
    Sleep(Duration),
}

impl Outcome {
    pub(crate) fn ok(stdout: &'static str) -> Self {
        Self::Exit {
            code: 0,
            stdout,
            stderr: "",
        }
    }

    pub(crate) fn exit(code: i32, stderr: &'static str) -> Self {
        Self::Exit {
            code,
            stdout: "",
            stderr,
        }
    }
}

#[derive(Debug, Default)]
struct Ledger {
    attempts: HashMap<String, u32>,
    executed: HashMap<String, Vec<String>>,
    checks: HashMap<String, bool>,
}

/// Connector answering per hostname. Unknown hosts refuse.
#[derive(Debug, Default)]
pub(crate) struct MockConnector {
    hosts: HashMap<String, Behaviour>,
    ledger: Arc<Mutex<Ledger>>,
}

impl MockConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub(crate) fn host(mut self, hostname: &str, behaviour: Behaviour) -> Self {
        self.hosts.insert(hostname.to_string(), behaviour);
        self
    }

    /// Handle to the attempt and execution records, usable after the
    /// connector has been moved into the engine.
    pub(crate) fn observed(&self) -> Observed {
        Observed(Arc::clone(&self.ledger))
    }
}

/// Read access to what a [`MockConnector`] observed.
#[derive(Debug, Clone)]
pub(crate) struct Observed(Arc<Mutex<Ledger>>);

impl Observed {
    pub(crate) fn attempts(&self, hostname: &str) -> u32 {
        self.0.lock().unwrap().attempts.get(hostname).copied().unwrap_or(0)
    }

    pub(crate) fn executed(&self, hostname: &str) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .executed
            .get(hostname)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the last attempt for `hostname` carried a trusted key.
    pub(crate) fn verified(&self, hostname: &str) -> Option<bool> {
        self.0.lock().unwrap().checks.get(hostname).copied()
    }
}

impl Connector for MockConnector {
    type Session = MockSession;

    fn connect(
        &self,
        target: &Target,
        _credential: &Credential,
        host_key: &HostKeyCheck,
        _timeout: Option<Duration>,
    ) -> Result<MockSession, ConnectError> {
        let attempt = {
            let mut ledger = self.ledger.lock().unwrap();
            ledger.checks.insert(
                target.hostname.clone(),
                matches!(host_key, HostKeyCheck::Trusted(_)),
            );
            let attempts = ledger.attempts.entry(target.hostname.clone()).or_insert(0);
            *attempts += 1;
            *attempts
        };

        let refused = || ConnectError::Dial {
            address: target.address(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
        };

        let outcomes = match self.hosts.get(&target.hostname) {
            None | Some(Behaviour::Refuse) => return Err(refused()),
            Some(Behaviour::RejectAuth) => {
                return Err(ConnectError::AuthRejected {
                    username: target.username.clone(),
                    source: None,
                });
            }
            Some(Behaviour::Hang(duration)) => {
                thread::sleep(*duration);
                return Err(refused());
            }
            Some(Behaviour::Flaky { failures, .. }) if attempt <= *failures => {
                return Err(refused());
            }
            Some(Behaviour::Flaky { outcomes, .. } | Behaviour::Accept(outcomes)) => outcomes,
        };

        Ok(MockSession {
            hostname: target.hostname.clone(),
            outcomes: outcomes.iter().cloned().collect(),
            ledger: Arc::clone(&self.ledger),
        })
    }
}

/// Session replaying scripted outcomes. Unscripted commands exit 0.
#[derive(Debug)]
pub(crate) struct MockSession {
    hostname: String,
    outcomes: VecDeque<Outcome>,
    ledger: Arc<Mutex<Ledger>>,
}

impl RemoteSession for MockSession {
    fn exec(&mut self, command_line: &str) -> Result<ExecOutput, ExecError> {
        self.ledger
            .lock()
            .unwrap()
            .executed
            .entry(self.hostname.clone())
            .or_default()
            .push(command_line.to_string());

        let output = |code, stdout: &str, stderr: &str| ExecOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit: ExitStatus::Code(code),
            signal: None,
        };

        match self.outcomes.pop_front() {
            None => Ok(output(0, "", "")),
            Some(Outcome::Exit {
                code,
                stdout,
                stderr,
            }) => Ok(output(code, stdout, stderr)),
            Some(Outcome::Killed(signal)) => Ok(ExecOutput {
                stdout: String::new(),
                stderr: String::new(),
                exit: ExitStatus::Missing,
                signal: Some(signal.to_string()),
            }),
            Some(Outcome::StartFails) => Err(ExecError::Other("channel open refused".into())),
            Some(Outcome::Sleep(duration)) => {
                thread::sleep(duration);
                Ok(output(0, "done", ""))
            }
        }
    }
}

/// Trust store with a fixed set of known hostnames.
#[derive(Debug, Default)]
pub(crate) struct StaticTrust {
    known: Vec<String>,
    looked_up_on_runtime: Arc<AtomicBool>,
}

impl StaticTrust {
    pub(crate) fn knowing(hostnames: &[&str]) -> Self {
        Self {
            known: hostnames.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    /// Set once any lookup runs on a tokio runtime thread.
    pub(crate) fn runtime_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.looked_up_on_runtime)
    }
}

impl TrustStore for StaticTrust {
    fn lookup(&self, hostname: &str, port: u16) -> Result<HostKey, TrustError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            self.looked_up_on_runtime.store(true, Ordering::SeqCst);
        }
        if self.known.iter().any(|known| known == hostname) {
            Ok(HostKey {
                key_type: "ssh-ed25519".into(),
                blob: hostname.as_bytes().to_vec(),
            })
        } else {
            Err(TrustError::NotFound {
                host: format!("{hostname}:{port}"),
            })
        }
    }
}

pub(crate) fn policy(timeout: Duration, retry_count: u32, retry_wait: Duration) -> ConnectionPolicy {
    ConnectionPolicy {
        credential: Credential::Password("secret".into()),
        host_key_verification: false,
        connect_timeout: timeout,
        retry_count,
        retry_wait,
    }
}

pub(crate) fn host(hostname: &str) -> HostDescriptor {
    HostDescriptor::new(hostname, "ops")
}

pub(crate) fn commands(names: &[&str]) -> Vec<Command> {
    names
        .iter()
        .map(|name| Command::new(*name, format!("run-{name}")))
        .collect()
}
