use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Table, TableName},
    services::providers::TableProvider,
};

/// Provider serving tables that were built in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableProvider {
    tables: HashMap<TableName, Arc<Table>>,
}

impl InMemoryTableProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: TableName, table: Table) -> Self {
        self.tables.insert(name, Arc::new(table));
        self
    }
}

#[async_trait::async_trait]
impl TableProvider for InMemoryTableProvider {
    async fn load_table(&self, table: TableName) -> AppResult<Arc<Table>> {
        self.tables
            .get(&table)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("table '{}' is not loaded", table)))
    }

    /// Tables are fixed once built, so one version covers the provider's lifetime
    async fn snapshot_version(&self) -> AppResult<Option<String>> {
        Ok(Some("memory".to_string()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_same_snapshot() {
        let provider = InMemoryTableProvider::new()
            .with_table(TableName::Calendar, Table::new("calendar", vec!["date".to_string()]));

        let first = provider.load_table(TableName::Calendar).await.unwrap();
        let second = provider.load_table(TableName::Calendar).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_missing_table_is_an_error() {
        let provider = InMemoryTableProvider::new();
        let result = provider.load_table(TableName::Shiurim).await;
        tokio_test::assert_err!(result);
    }
}
