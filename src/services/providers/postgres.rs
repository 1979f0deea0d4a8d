use chrono::NaiveDate;
use sqlx::{
    postgres::PgRow, types::BigDecimal, Column as _, Executor as _, PgPool, Row as _,
    Statement as _, TypeInfo as _,
};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{CellValue, Table, TableName},
    services::providers::TableProvider,
};

/// Postgres relations backing each reference table
#[derive(Debug, Clone)]
pub struct RelationNames {
    pub calendar: String,
    pub categories: String,
    pub shiurim: String,
}

impl Default for RelationNames {
    fn default() -> Self {
        Self {
            calendar: "calendar".to_string(),
            categories: "categories".to_string(),
            shiurim: "shiurim".to_string(),
        }
    }
}

impl RelationNames {
    pub fn relation(&self, table: TableName) -> &str {
        match table {
            TableName::Calendar => &self.calendar,
            TableName::Categories => &self.categories,
            TableName::Shiurim => &self.shiurim,
        }
    }
}

/// Loads reference tables from Postgres.
///
/// The flag columns are open-ended, so rows are fetched with `SELECT *` and each
/// column is decoded according to its Postgres type. The provider reports no
/// snapshot version, so its results are never served from the cache.
#[derive(Clone)]
pub struct PostgresTableProvider {
    pool: PgPool,
    relations: RelationNames,
}

impl PostgresTableProvider {
    pub fn new(pool: PgPool, relations: RelationNames) -> Self {
        Self { pool, relations }
    }

    fn select_all(&self, table: TableName) -> String {
        format!("SELECT * FROM {}", quote_identifier(self.relations.relation(table)))
    }
}

/// Quotes a Postgres identifier, doubling embedded quotes
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Decodes one column of a row into a cell based on the column's SQL type
fn decode_cell(row: &PgRow, index: usize, type_name: &str) -> Result<CellValue, sqlx::Error> {
    let cell = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(CellValue::Bool),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)?
            .map(|v| CellValue::Integer(v.into())),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)?
            .map(|v| CellValue::Integer(v.into())),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(CellValue::Integer),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|v| CellValue::Float(v.into())),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(CellValue::Float),
        "NUMERIC" => row
            .try_get::<Option<BigDecimal>, _>(index)?
            .map(|v| CellValue::infer(&v.to_string())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|d| CellValue::Text(d.format("%Y-%m-%d").to_string())),
        _ => row.try_get::<Option<String>, _>(index)?.map(CellValue::Text),
    };

    Ok(cell.unwrap_or(CellValue::Null))
}

#[async_trait::async_trait]
impl TableProvider for PostgresTableProvider {
    async fn load_table(&self, table: TableName) -> AppResult<Arc<Table>> {
        let query = self.select_all(table);

        // Column names come from the prepared statement so an empty relation
        // still loads with its full header
        let statement = (&self.pool).prepare(query.as_str()).await?;
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut loaded = Table::new(table.to_string(), columns);
        for row in &rows {
            let mut values = Vec::with_capacity(row.columns().len());
            for column in row.columns() {
                let type_name = column.type_info().name();
                let cell = decode_cell(row, column.ordinal(), type_name).map_err(|e| {
                    AppError::DataIntegrity(format!(
                        "column '{}' of table '{}' ({}) could not be decoded: {}",
                        column.name(),
                        table,
                        type_name,
                        e
                    ))
                })?;
                values.push(cell);
            }
            loaded.push_row(values)?;
        }

        tracing::debug!(table = %table, rows = loaded.len(), "Loaded table from Postgres");

        Ok(Arc::new(loaded))
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("calendar"), "\"calendar\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_relation_names() {
        let relations = RelationNames {
            calendar: "luach".to_string(),
            ..RelationNames::default()
        };
        assert_eq!(relations.relation(TableName::Calendar), "luach");
        assert_eq!(relations.relation(TableName::Shiurim), "shiurim");
    }
}
