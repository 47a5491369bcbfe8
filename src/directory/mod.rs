//! Driver directory gateway: lookup and balance updates by phone identity.

pub mod http;
pub mod memory;

use crate::domain::driver::DriverRecord;
use async_trait::async_trait;
use thiserror::Error;

pub use http::SheetDirectoryClient;
pub use memory::InMemoryDirectory;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("driver directory unavailable: {0}")]
    Unavailable(String),
    #[error("driver directory call timed out")]
    Timeout,
    #[error("balance write rejected: {0}")]
    WriteRejected(String),
    #[error("circuit breaker open - driver directory unavailable")]
    CircuitOpen,
}

/// The spreadsheet-backed directory, seen through its interface boundary.
/// Callers serialize read-modify-write per identity; implementations only
/// promise that a single call is applied atomically.
#[async_trait]
pub trait DriverDirectory: Send + Sync {
    async fn lookup(&self, identity: &str) -> Result<Option<DriverRecord>, DirectoryError>;
    async fn update_balance(&self, identity: &str, new_balance: i64) -> Result<(), DirectoryError>;
}
