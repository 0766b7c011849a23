//! Host inventory loading from a local file or an HTTP(S) endpoint.
//!
//! Both sources carry the same shape: a JSON array of host records.

use fleet::HostDescriptor;
use reqwest::{Client, StatusCode};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Bound on the whole HTTP exchange.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for inventory loading.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Inventory file does not exist.
    #[error("inventory file [{}] not found", .0.display())]
    NotFound(PathBuf),

    /// Inventory file could not be read.
    #[error("failed to read inventory [{}]", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Request to the inventory endpoint failed.
    #[error("failed to fetch inventory from [{url}]")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Endpoint answered with something other than 200.
    #[error("inventory endpoint [{url}] returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    /// Body is not a JSON array of host records.
    #[error("invalid inventory JSON from [{location}]")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Whether `location` names an HTTP(S) endpoint rather than a file.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Loads the host list from `location`.
///
/// # Errors
///
/// Returns an error if the source cannot be read or does not hold a JSON
/// array of host records.
pub async fn load(location: &str) -> Result<Vec<HostDescriptor>, InventoryError> {
    if is_remote(location) {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|source| InventoryError::Http {
                url: location.to_string(),
                source,
            })?;
        fetch(&client, location).await
    } else {
        read(location)
    }
}

async fn fetch(client: &Client, url: &str) -> Result<Vec<HostDescriptor>, InventoryError> {
    let http_error = |source| InventoryError::Http {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(http_error)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(InventoryError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response.bytes().await.map_err(http_error)?;
    parse(&body, url)
}

fn read(location: &str) -> Result<Vec<HostDescriptor>, InventoryError> {
    let path = PathBuf::from(location);
    if !path.exists() {
        return Err(InventoryError::NotFound(path));
    }

    let contents = fs::read(&path).map_err(|source| InventoryError::Io {
        path: path.clone(),
        source,
    })?;
    parse(&contents, location)
}

fn parse(bytes: &[u8], location: &str) -> Result<Vec<HostDescriptor>, InventoryError> {
    serde_json::from_slice(bytes).map_err(|source| InventoryError::Parse {
        location: location.to_string(),
        source,
    })
}
