use crate::connection::ConnectionManager;
use crate::error::FleetError;
use crate::report::{HostResult, Report, ReportMeta, format_elapsed};
use crate::runner::HostRunner;
use crate::types::{Command, ConnectionPolicy, HostDescriptor};
use chrono::{DateTime, Local};
use ssh::{Connector, TrustStore};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Labels stamped into the report metadata.
#[derive(Debug, Clone)]
pub struct RunLabel {
    pub version: String,
    pub run_type: String,
    pub started: DateTime<Local>,
}

/// Runs every host concurrently and gathers one result per host.
pub struct Fleet<C, T> {
    runner: HostRunner<C, T>,
}

impl<C, T> fmt::Debug for Fleet<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fleet").field("runner", &self.runner).finish()
    }
}

impl<C: Connector, T: TrustStore> Fleet<C, T> {
    /// # Errors
    ///
    /// Returns an error if `commands` is empty.
    pub fn new(
        connector: C,
        trust: T,
        policy: ConnectionPolicy,
        commands: Vec<Command>,
    ) -> Result<Self, FleetError> {
        if commands.is_empty() {
            return Err(FleetError::NoCommands);
        }

        let connections =
            ConnectionManager::new(Arc::new(connector), Arc::new(trust), Arc::new(policy));
        Ok(Self {
            runner: HostRunner::new(connections, commands),
        })
    }

    /// Runs every host in its own task and waits for all of them.
    ///
    /// There is no cap on concurrent hosts, and a command that never
    /// returns holds up the whole run.
    ///
    /// # Errors
    ///
    /// Returns an error if `hosts` is empty. Host failures are recorded in
    /// the report instead.
    pub async fn execute(
        &self,
        hosts: Vec<HostDescriptor>,
        label: RunLabel,
    ) -> Result<Report, FleetError> {
        if hosts.is_empty() {
            return Err(FleetError::EmptyInventory);
        }

        let started = Instant::now();
        let collected = Arc::new(Mutex::new(Vec::with_capacity(hosts.len())));

        let tasks: Vec<_> = hosts
            .into_iter()
            .map(|host| {
                let runner = self.runner.clone();
                let collected = Arc::clone(&collected);
                let fallback = host.clone();
                let handle = tokio::spawn(async move {
                    let result = runner.run(host).await;
                    collected.lock().await.push(result);
                });
                (fallback, handle)
            })
            .collect();

        for (host, handle) in tasks {
            if let Err(error) = handle.await {
                collected
                    .lock()
                    .await
                    .push(HostResult::aborted(host, &error));
            }
        }

        let results = std::mem::take(&mut *collected.lock().await);

        Ok(Report {
            metadata: ReportMeta {
                version: label.version,
                run_type: label.run_type,
                timestamp: label.started.to_rfc3339(),
                total_items: results.len(),
                total_time: format_elapsed(started.elapsed()),
            },
            hosts: results,
        })
    }
}
