//! Run configuration: JSON checked against an embedded schema, then
//! deserialized with defaults applied.

mod loader;
mod schema;
mod types;

pub use loader::{DEFAULT_CONFIG_FILE, LoadError, load_from_path, load_from_str};
pub use schema::{ConfigError, ValidationError, ValidationResult, schema, validate};
pub use types::{AuthKind, Config};
