use crate::connection::ConnectionManager;
use crate::error::error_chain;
use crate::executor;
use crate::report::{CommandResult, HostResult};
use crate::types::{Command, HostDescriptor, Port};
use crate::worker;
use ssh::{Connector, TrustStore};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Full lifecycle of one host: connect, run every command, record.
pub struct HostRunner<C, T> {
    connections: ConnectionManager<C, T>,
    commands: Arc<[Command]>,
}

impl<C, T> Clone for HostRunner<C, T> {
    fn clone(&self) -> Self {
        Self {
            connections: self.connections.clone(),
            commands: Arc::clone(&self.commands),
        }
    }
}

impl<C, T> fmt::Debug for HostRunner<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRunner")
            .field("connections", &self.connections)
            .field("commands", &self.commands.len())
            .finish()
    }
}

impl<C: Connector, T: TrustStore> HostRunner<C, T> {
    pub fn new(connections: ConnectionManager<C, T>, commands: impl Into<Arc<[Command]>>) -> Self {
        Self {
            connections,
            commands: commands.into(),
        }
    }

    /// Runs `host` to completion. Every failure is recorded in the
    /// returned result.
    pub async fn run(&self, host: HostDescriptor) -> HostResult {
        let started = Instant::now();
        let mut result = HostResult::new(host);

        if let Ok(port) = result.host.normalized_port() {
            result.host.port = Some(Port::from(port));
        }

        match self.connections.connect(&result.host).await {
            Ok(session) => {
                result.connected = true;
                result.commands = self.execute(session).await;
            }
            Err(error) => result.connection_errors = error_chain(&error),
        }

        result.set_run_length(started.elapsed());
        result
    }

    /// Executes the command list on the host's own thread. The session is
    /// closed there once the last command finishes.
    async fn execute(&self, mut session: C::Session) -> Vec<CommandResult> {
        let commands = Arc::clone(&self.commands);
        worker::run("boomerang-exec", move || executor::run(&mut session, &commands))
            .await
            .unwrap_or_else(|error| executor::aborted(&self.commands, &error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behaviour, MockConnector, Outcome, StaticTrust, commands, host, policy};
    use serde_json::json;
    use std::time::Duration;

    fn runner(connector: MockConnector, names: &[&str]) -> HostRunner<MockConnector, StaticTrust> {
        let connections = ConnectionManager::new(
            Arc::new(connector),
            Arc::new(StaticTrust::default()),
            Arc::new(policy(Duration::from_secs(1), 0, Duration::ZERO)),
        );
        HostRunner::new(connections, commands(names))
    }

    #[tokio::test]
    async fn test_connected_host_has_one_result_per_command() {
        let connector = MockConnector::new().host(
            "web-1",
            Behaviour::Accept(vec![Outcome::ok("a"), Outcome::exit(1, "denied")]),
        );
        let runner = runner(connector, &["first", "second", "third"]);

        let result = runner.run(host("web-1")).await;

        assert!(result.connected);
        assert!(result.connection_errors.is_empty());
        assert_eq!(result.commands.len(), 3);
        assert_eq!(result.commands[1].exit_code, 1);
        assert!(result.run_length >= 0.0);
    }

    #[tokio::test]
    async fn test_failed_host_has_errors_and_no_commands() {
        let connector = MockConnector::new().host("web-1", Behaviour::RejectAuth);
        let runner = runner(connector, &["first"]);

        let result = runner.run(host("web-1")).await;

        assert!(!result.connected);
        assert!(result.commands.is_empty());
        assert_eq!(
            result.connection_errors[0],
            "failed client connection after 1 attempt"
        );
        assert_eq!(
            result.connection_errors[1],
            "authentication as [ops] rejected"
        );
    }

    #[tokio::test]
    async fn test_port_normalized_in_result() {
        let connector = MockConnector::new().host("web-1", Behaviour::Accept(Vec::new()));
        let runner = runner(connector, &["first"]);

        let mut descriptor = host("web-1").with_port(Port::Text(String::new()));
        descriptor.extras.insert("rack".into(), json!(4));
        let result = runner.run(descriptor).await;

        assert_eq!(result.host.port, Some(Port::Number(22)));
        assert_eq!(result.host.extras["rack"], 4);
    }

    #[tokio::test]
    async fn test_invalid_port_kept_as_given() {
        let runner = runner(MockConnector::new(), &["first"]);

        let result = runner.run(host("web-1").with_port(Port::Text("abc".into()))).await;

        assert!(!result.connected);
        assert_eq!(result.host.port, Some(Port::Text("abc".into())));
        assert_eq!(result.connection_errors[0], "invalid ssh port");
    }
}
