use crate::error::PortError;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ssh::Credential;
use std::fmt;
use std::time::Duration;

/// Port used when a host does not name one.
pub const DEFAULT_PORT: u16 = 22;

// ============================================================================
// Host Descriptor
// ============================================================================

/// Port as supplied by the inventory: a number or numeric text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Port {
    Number(i64),
    Text(String),
}

impl From<u16> for Port {
    fn from(port: u16) -> Self {
        Self::Number(i64::from(port))
    }
}

/// Identity of one target machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostDescriptor {
    #[serde(default)]
    pub hostname: String,

    #[serde(default)]
    pub username: String,

    #[serde(rename = "ssh_port", default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Port>,

    /// Operator metadata, passed through to the report untouched.
    #[serde(default)]
    pub extras: Map<String, Value>,
}

impl HostDescriptor {
    pub fn new(hostname: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            port: None,
            extras: Map::new(),
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: Port) -> Self {
        self.port = Some(port);
        self
    }

    /// Returns the port to dial: [`DEFAULT_PORT`] when absent or empty,
    /// otherwise the supplied value if it lies in 1..=65535.
    ///
    /// # Errors
    ///
    /// Returns an error if the supplied value is not an integer or is out
    /// of range.
    pub fn normalized_port(&self) -> Result<u16, PortError> {
        let number = match &self.port {
            None => return Ok(DEFAULT_PORT),
            Some(Port::Text(text)) if text.is_empty() => return Ok(DEFAULT_PORT),
            Some(Port::Text(text)) => text
                .parse::<i64>()
                .map_err(|_| PortError::NotANumber(text.clone()))?,
            Some(Port::Number(number)) => *number,
        };

        u16::try_from(number)
            .ok()
            .filter(|port| *port != 0)
            .ok_or(PortError::OutOfRange(number))
    }
}

// ============================================================================
// Command
// ============================================================================

/// A labelled shell command line.
/// Serializes to/from JSON as `{"name": "command line"}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub command_line: String,
}

impl Command {
    pub fn new(name: impl Into<String>, command_line: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command_line: command_line.into(),
        }
    }
}

impl Serialize for Command {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.command_line)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Command {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CommandVisitor;

        impl<'de> Visitor<'de> for CommandVisitor {
            type Value = Command;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map with a single key (command name) and string value")
            }

            fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let (name, command_line): (String, String) = access
                    .next_entry()?
                    .ok_or_else(|| de::Error::custom("expected non-empty map for command"))?;

                if access.next_key::<String>()?.is_some() {
                    return Err(de::Error::custom(
                        "command must have exactly one key (the command name)",
                    ));
                }

                Ok(Command { name, command_line })
            }
        }

        deserializer.deserialize_map(CommandVisitor)
    }
}

// ============================================================================
// Connection Policy
// ============================================================================

/// Run-wide connection rules, shared read-only by every host task.
#[derive(Debug, Clone)]
pub struct ConnectionPolicy {
    pub credential: Credential,
    /// Require the server key to match the trust store. Disabling this is
    /// insecure.
    pub host_key_verification: bool,
    /// Per-attempt bound. Zero means a single attempt with no bound.
    pub connect_timeout: Duration,
    pub retry_count: u32,
    pub retry_wait: Duration,
}
