use fleet::Command;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How every host is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    Key,
    Agent,
    Password,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// File path or http(s) URL.
    pub inventory: String,

    pub auth: AuthKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_location: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_passphrase: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default = "default_true")]
    pub host_key_check: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_hosts: Option<PathBuf>,

    /// Seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    #[serde(default = "default_retry")]
    pub retry: u32,

    /// Seconds.
    #[serde(default = "default_retry_wait")]
    pub retry_wait: u64,

    #[serde(rename = "type", default)]
    pub run_type: String,

    #[serde(default = "default_raw")]
    pub json_prefix: String,

    #[serde(default = "default_true")]
    pub indent_json: bool,

    #[serde(default)]
    pub keep_latest_file: bool,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    pub commands: Vec<Command>,
}

fn default_true() -> bool {
    true
}

fn default_connection_timeout() -> u64 {
    10
}

fn default_retry() -> u32 {
    1
}

fn default_retry_wait() -> u64 {
    15
}

fn default_raw() -> String {
    "raw".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("raw")
}

impl Config {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_secs(self.retry_wait)
    }

    /// The configured known_hosts file, or ~/.ssh/known_hosts.
    pub fn known_hosts_path(&self) -> Option<PathBuf> {
        self.known_hosts
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".ssh").join("known_hosts")))
    }
}
