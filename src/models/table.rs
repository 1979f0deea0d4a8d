use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;

use crate::error::{AppError, AppResult};

/// Identifier of a single shiur (content item)
pub type ShiurId = i64;

/// The reference tables the recommendation engines read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableName {
    Calendar,
    Categories,
    Shiurim,
}

impl Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableName::Calendar => write!(f, "calendar"),
            TableName::Categories => write!(f, "categories"),
            TableName::Shiurim => write!(f, "shiurim"),
        }
    }
}

/// A single typed cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Infers a cell from its textual form: empty is null, then integer, float, text
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::Float(f),
            Ok(_) => CellValue::Null,
            Err(_) => CellValue::Text(raw.to_string()),
        }
    }

    /// True when the cell holds the flag value 1
    pub fn is_flag_set(&self) -> bool {
        match self {
            CellValue::Bool(b) => *b,
            CellValue::Integer(i) => *i == 1,
            CellValue::Float(f) => *f == 1.0,
            CellValue::Null | CellValue::Text(_) => false,
        }
    }

    /// Integer view of the cell. Floats must be integral, text must parse.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Label view of the cell: text as-is, numbers rendered, null or blank is `None`
    pub fn as_label(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) if s.trim().is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// An immutable snapshot of a tabular dataset.
///
/// The column universe is open-ended (flag columns are named after tractates,
/// holidays, parshiyot...), so every lookup goes through [`Table::column_index`]
/// and a missing column is reported as `None` rather than a panic.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        Self {
            name: name.into(),
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// Builds a table from string column names and rows, checking row widths
    pub fn from_rows<C, S>(name: &str, columns: C, rows: Vec<Vec<CellValue>>) -> AppResult<Self>
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(name, columns.into_iter().map(Into::into).collect());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) -> AppResult<()> {
        if row.len() != self.columns.len() {
            return Err(AppError::DataIntegrity(format!(
                "table '{}' has {} columns but a row has {} values",
                self.name,
                self.columns.len(),
                row.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, position: usize) -> Option<Row<'_>> {
        self.rows.get(position).map(|values| Row {
            table: self,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.rows.iter().map(move |values| Row {
            table: self,
            values,
        })
    }
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    values: &'a [CellValue],
}

impl<'a> Row<'a> {
    /// Cell under `column`, or `None` when the table has no such column
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.table
            .column_index(column)
            .map(|i| &self.values[i])
    }

    pub fn values(&self) -> &'a [CellValue] {
        self.values
    }

    /// True when `column` exists and holds the flag value 1
    pub fn flag(&self, column: &str) -> bool {
        self.get(column).is_some_and(CellValue::is_flag_set)
    }

    /// The `shiur` key of this row
    pub fn shiur_id(&self) -> AppResult<ShiurId> {
        self.get("shiur")
            .and_then(CellValue::as_integer)
            .ok_or_else(|| {
                AppError::DataIntegrity(format!(
                    "table '{}' has a row without an integer 'shiur' id",
                    self.table.name
                ))
            })
    }
}
