use crate::error::error_chain;
use crate::types::HostDescriptor;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;

/// Exit code recorded when no exit status could be obtained.
pub const EXIT_CODE_UNKNOWN: i32 = -1;

/// Outcome of one command on one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub name: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Empty exactly when the command exited 0.
    #[serde(rename = "stream_errors", default)]
    pub errors: Vec<String>,
}

impl CommandResult {
    /// A command that produced no usable output.
    pub fn failed(name: impl Into<String>, error: &dyn Error) -> Self {
        Self {
            name: name.into(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: EXIT_CODE_UNKNOWN,
            errors: error_chain(error),
        }
    }
}

/// Complete outcome for one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostResult {
    #[serde(flatten)]
    pub host: HostDescriptor,

    #[serde(rename = "connection")]
    pub connected: bool,

    /// Seconds from task start to completion.
    pub run_length: f64,

    #[serde(default)]
    pub connection_errors: Vec<String>,

    #[serde(rename = "stream_data", default)]
    pub commands: Vec<CommandResult>,
}

impl HostResult {
    pub fn new(host: HostDescriptor) -> Self {
        Self {
            host,
            connected: false,
            run_length: 0.0,
            connection_errors: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Result for a host whose task died before reporting.
    pub fn aborted(host: HostDescriptor, error: &dyn Error) -> Self {
        Self {
            connection_errors: error_chain(error),
            ..Self::new(host)
        }
    }

    /// Records elapsed time, rounded to the millisecond.
    pub fn set_run_length(&mut self, elapsed: Duration) {
        self.run_length = round_millis(elapsed);
    }
}

fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

/// Run-wide report metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    #[serde(rename = "boomerang_version")]
    pub version: String,

    #[serde(rename = "type")]
    pub run_type: String,

    /// Run start, RFC 3339.
    pub timestamp: String,

    pub total_items: usize,

    pub total_time: String,
}

/// The whole run. Host order follows completion, not input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMeta,

    #[serde(rename = "machine_data")]
    pub hosts: Vec<HostResult>,
}

impl Report {
    /// Looks up a host's result by hostname.
    pub fn host(&self, hostname: &str) -> Option<&HostResult> {
        self.hosts.iter().find(|h| h.host.hostname == hostname)
    }

    /// Number of hosts that connected.
    pub fn connected_count(&self) -> usize {
        self.hosts.iter().filter(|h| h.connected).count()
    }
}

/// Formats a duration as `1.234s`, `2m3.456s` or `1h0m5.000s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    let hours = millis / 3_600_000;
    let minutes = millis / 60_000 % 60;
    let seconds = millis / 1000 % 60;
    let fraction = millis % 1000;

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}.{fraction:03}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}.{fraction:03}s")
    } else {
        format!("{seconds}.{fraction:03}s")
    }
}
