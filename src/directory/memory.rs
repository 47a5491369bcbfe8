//! Map-backed directory for tests and local development.

use crate::directory::{DirectoryError, DriverDirectory};
use crate::domain::driver::DriverRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryDirectory {
    records: RwLock<HashMap<String, DriverRecord>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = DriverRecord>) -> Self {
        let directory = Self::new();
        {
            let mut map = directory.records.write().expect("directory lock poisoned");
            for record in records {
                map.insert(record.phone.clone(), record);
            }
        }
        directory
    }

    pub fn insert(&self, record: DriverRecord) {
        self.records
            .write()
            .expect("directory lock poisoned")
            .insert(record.phone.clone(), record);
    }

    pub fn balance_of(&self, identity: &str) -> Option<i64> {
        self.records
            .read()
            .expect("directory lock poisoned")
            .get(identity)
            .map(|r| r.balance)
    }
}

#[async_trait]
impl DriverDirectory for InMemoryDirectory {
    async fn lookup(&self, identity: &str) -> Result<Option<DriverRecord>, DirectoryError> {
        Ok(self
            .records
            .read()
            .expect("directory lock poisoned")
            .get(identity)
            .cloned())
    }

    async fn update_balance(&self, identity: &str, new_balance: i64) -> Result<(), DirectoryError> {
        let mut records = self.records.write().expect("directory lock poisoned");
        match records.get_mut(identity) {
            Some(record) => {
                record.balance = new_balance;
                Ok(())
            }
            None => Err(DirectoryError::WriteRejected(format!(
                "no directory row for {}",
                identity
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DriverRecord {
        DriverRecord {
            id: "DRV-001".to_string(),
            name: "Budi".to_string(),
            phone: "6281234567890".to_string(),
            email: None,
            balance: 100_000,
            status: "active".to_string(),
            rating: Some(9),
        }
    }

    #[tokio::test]
    async fn test_lookup_and_update() {
        let directory = InMemoryDirectory::with_records([record()]);

        let found = directory.lookup("6281234567890").await.unwrap().unwrap();
        assert_eq!(found.balance, 100_000);

        directory.update_balance("6281234567890", 150_000).await.unwrap();
        assert_eq!(directory.balance_of("6281234567890"), Some(150_000));
    }

    #[tokio::test]
    async fn test_unknown_identity() {
        let directory = InMemoryDirectory::new();
        assert!(directory.lookup("6280000000000").await.unwrap().is_none());
        assert!(directory
            .update_balance("6280000000000", 1_000)
            .await
            .is_err());
    }
}
