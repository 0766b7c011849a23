//! Trusted host keys from an OpenSSH known_hosts file.

use crate::error::TrustError;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

/// A server identity key as raw wire-format bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostKey {
    /// Algorithm name, e.g. `ssh-ed25519`.
    pub key_type: String,
    /// Decoded key blob.
    pub blob: Vec<u8>,
}

impl HostKey {
    /// SHA-256 fingerprint of the key blob.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.blob)
    }
}

/// OpenSSH-style `SHA256:<base64>` fingerprint of a key blob.
pub fn fingerprint(blob: &[u8]) -> String {
    format!("SHA256:{}", STANDARD_NO_PAD.encode(Sha256::digest(blob)))
}

/// Source of previously trusted host keys.
pub trait TrustStore: Send + Sync + 'static {
    /// Returns the trusted key recorded for `hostname:port`.
    ///
    /// # Errors
    ///
    /// Returns an error if no key is recorded or the store cannot be read.
    fn lookup(&self, hostname: &str, port: u16) -> Result<HostKey, TrustError>;
}

/// Trust store backed by a known_hosts file, read on every lookup.
#[derive(Debug, Clone)]
pub struct KnownHostsFile {
    path: PathBuf,
}

impl KnownHostsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TrustStore for KnownHostsFile {
    fn lookup(&self, hostname: &str, port: u16) -> Result<HostKey, TrustError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| TrustError::Io {
            path: self.path.clone(),
            source,
        })?;

        let pattern = host_pattern(hostname, port);

        for (index, line) in contents.lines().enumerate() {
            let Some(entry) = Entry::parse(line) else {
                continue;
            };
            if !entry.matches(&pattern) {
                continue;
            }

            let blob = STANDARD
                .decode(entry.key)
                .map_err(|_| TrustError::Malformed {
                    host: pattern.clone(),
                    path: self.path.clone(),
                    line: index + 1,
                })?;

            return Ok(HostKey {
                key_type: entry.key_type.to_string(),
                blob,
            });
        }

        Err(TrustError::NotFound {
            host: format!("{hostname}:{port}"),
        })
    }
}

/// Host column form: bare name on port 22, `[name]:port` otherwise.
fn host_pattern(hostname: &str, port: u16) -> String {
    if port == 22 {
        hostname.to_string()
    } else {
        format!("[{hostname}]:{port}")
    }
}

/// One `hosts keytype key [comment]` line.
#[derive(Debug)]
struct Entry<'a> {
    hosts: &'a str,
    key_type: &'a str,
    key: &'a str,
}

impl<'a> Entry<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('@') {
            return None;
        }

        let mut fields = line.split_whitespace();
        let hosts = fields.next()?;
        let key_type = fields.next()?;
        let key = fields.next()?;

        Some(Self {
            hosts,
            key_type,
            key,
        })
    }

    fn matches(&self, pattern: &str) -> bool {
        self.hosts.split(',').any(|host| host == pattern)
    }
}
