//! Concurrent remote-execution engine.
//!
//! One task per host: the [`ConnectionManager`] opens a verified session,
//! the [`executor`] runs every command in order, the [`HostRunner`] records
//! the outcome, and [`Fleet`] gathers all outcomes into a [`Report`].

mod connection;
mod error;
pub mod executor;
mod orchestrator;
mod report;
mod runner;
mod types;
mod worker;

#[cfg(test)]
mod testing;

pub use connection::{ConnectionManager, DEADLINE_MARGIN};
pub use error::{FleetError, HostError, PortError, error_chain};
pub use orchestrator::{Fleet, RunLabel};
pub use report::{CommandResult, EXIT_CODE_UNKNOWN, HostResult, Report, ReportMeta, format_elapsed};
pub use runner::HostRunner;
pub use types::{Command, ConnectionPolicy, DEFAULT_PORT, HostDescriptor, Port};
