use std::time::Duration;

use crate::dbs::mongo::MongoStore;
use crate::error::{PersistError, Result};

const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MongoStoreBuilder {
    uri: Option<String>,
    database: Option<String>,
    pool_size: u32,
    timeout: Duration,
}

impl MongoStoreBuilder {
    pub fn new() -> Self {
        Self {
            uri: None,
            database: None,
            pool_size: DEFAULT_POOL_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn database(mut self, db: impl Into<String>) -> Self {
        self.database = Some(db.into());
        self
    }

    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size.max(1);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn build(self) -> Result<MongoStore> {
        let uri = self
            .uri
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| PersistError::Internal("mongodb uri is required".to_string()))?;
        let database = self
            .database
            .ok_or_else(|| PersistError::Internal("database is required".to_string()))?;

        MongoStore::connect(&uri, &database, self.pool_size, self.timeout).await
    }
}

impl Default for MongoStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_requires_uri() {
        let result = MongoStoreBuilder::new().database("fairshare").build().await;
        assert!(matches!(result, Err(PersistError::Internal(_))));
    }

    #[tokio::test]
    async fn test_build_requires_database() {
        let result = MongoStoreBuilder::new().uri("mongodb://localhost:27017").build().await;
        assert!(matches!(result, Err(PersistError::Internal(_))));
    }

    #[test]
    fn test_pool_size_never_zero() {
        assert_eq!(MongoStoreBuilder::new().pool_size(0).pool_size, 1);
    }
}
