//! Driver directory row as this service reads it.

use serde::{Deserialize, Serialize};

/// One row of the spreadsheet-backed driver directory. `balance` is whole
/// rupiah; all balance arithmetic stays in integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRecord {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub balance: i64,
    pub status: String,
    pub rating: Option<i32>,
}

impl DriverRecord {
    /// Email to hand the payment gateway; the directory column is optional.
    pub fn contact_email(&self) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| "driver@bakusam.example".to_string())
    }
}
