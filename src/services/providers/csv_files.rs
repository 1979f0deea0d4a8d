use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use crate::{
    error::{AppError, AppResult},
    models::{CellValue, Table, TableName},
    services::providers::TableProvider,
};

/// Reads the reference tables from CSV exports in a data directory.
///
/// Expects `calendar.csv`, `categories.csv` and `shiurim.csv`, each with a header
/// row. Files are read on every load so a refreshed export is picked up without a
/// restart.
#[derive(Debug, Clone)]
pub struct CsvTableProvider {
    data_dir: PathBuf,
}

impl CsvTableProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, table: TableName) -> PathBuf {
        self.data_dir.join(format!("{}.csv", table))
    }
}

/// Parses one CSV file into a table, inferring each cell's type
pub fn read_csv_table(name: &str, path: &Path) -> AppResult<Table> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = Table::new(name, columns);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(CellValue::infer).collect())?;
    }

    Ok(table)
}

#[async_trait::async_trait]
impl TableProvider for CsvTableProvider {
    async fn load_table(&self, table: TableName) -> AppResult<Arc<Table>> {
        let path = self.path_for(table);
        let name = table.to_string();

        tracing::debug!(table = %table, path = %path.display(), "Reading CSV table");

        let loaded = tokio::task::spawn_blocking(move || read_csv_table(&name, &path))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(Arc::new(loaded))
    }

    /// Size and modification time of each file, so any rewrite changes the version
    async fn snapshot_version(&self) -> AppResult<Option<String>> {
        let mut parts = Vec::with_capacity(3);
        for table in [TableName::Calendar, TableName::Categories, TableName::Shiurim] {
            let metadata = tokio::fs::metadata(self.path_for(table)).await?;
            let modified = metadata
                .modified()?
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or_default();
            parts.push(format!("{}-{}-{}", table, metadata.len(), modified));
        }

        Ok(Some(parts.join(".")))
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
