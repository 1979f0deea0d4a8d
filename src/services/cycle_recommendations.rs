use chrono::NaiveDate;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        CellValue, CycleDefinition, LearningCycle, PositionColumns, Row, ShiurId, Table, TableName,
    },
    services::{
        calendar,
        merge::{self, label_column, shiurim_column},
        providers::TableProvider,
        title_numbers::extract_numbers,
    },
};

/// What a calendar row says a cycle is learning on its date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePosition {
    /// Tractate, sefer or parsha name, used as a category flag column
    pub label: String,
    /// Daf, chapter or perek/mishnah numbers, in title order
    pub numbers: Vec<i64>,
}

/// Resolves daily learning cycles to the matching shiurim
pub struct CycleRecommendationEngine {
    tables: Arc<dyn TableProvider>,
}

impl CycleRecommendationEngine {
    pub fn new(tables: Arc<dyn TableProvider>) -> Self {
        Self { tables }
    }

    /// Shiurim for `cycle` on `date`, in table order.
    ///
    /// A date missing from the calendar yields an empty list. A calendar row whose
    /// position columns are missing or non-numeric is a data integrity error.
    pub async fn recommend(
        &self,
        cycle: LearningCycle,
        date: NaiveDate,
    ) -> AppResult<Vec<ShiurId>> {
        let calendar = self.tables.load_table(TableName::Calendar).await?;
        let Some(row) = calendar::resolve_date(&calendar, date) else {
            tracing::debug!(cycle = %cycle, date = %date, "Date not in calendar");
            return Ok(vec![]);
        };

        let definition = cycle.definition();
        let Some(position) = read_position(&row, &definition)? else {
            tracing::debug!(cycle = %cycle, date = %date, "No learning unit scheduled for date");
            return Ok(vec![]);
        };

        let merged = merge::load_merged(self.tables.as_ref()).await?;
        let shiurim = select_shiurim(&merged, &definition, &position)?;

        tracing::info!(
            cycle = %cycle,
            date = %date,
            label = %position.label,
            numbers = ?position.numbers,
            matches = shiurim.len(),
            "Resolved cycle recommendations"
        );

        Ok(shiurim)
    }
}

/// Reads the cycle's label and position numbers from a calendar row.
///
/// Returns `None` when the row has no label for the cycle. Missing or
/// non-numeric positions are an error either way.
pub fn read_position(
    row: &Row<'_>,
    definition: &CycleDefinition,
) -> AppResult<Option<CyclePosition>> {
    // Positions are validated even when no label is set, so corrupt rows surface
    let numbers = match definition {
        CycleDefinition::Numbered { positions, .. } => read_numbers(row, positions)?,
        CycleDefinition::Parsha { .. } => vec![],
    };

    let Some(label) = row
        .get(definition.subcategory_column())
        .and_then(CellValue::as_label)
    else {
        return Ok(None);
    };

    Ok(Some(CyclePosition { label, numbers }))
}

fn read_numbers(row: &Row<'_>, positions: &PositionColumns) -> AppResult<Vec<i64>> {
    positions
        .columns()
        .into_iter()
        .map(|column| match row.get(column) {
            Some(cell) => cell.as_integer().ok_or_else(|| {
                AppError::DataIntegrity(format!(
                    "calendar column '{}' holds non-numeric position '{}'",
                    column, cell
                ))
            }),
            None => Err(AppError::DataIntegrity(format!(
                "calendar is missing position column '{}'",
                column
            ))),
        })
        .collect()
}

/// Filters the merged categories/shiurim table down to the cycle's shiurim.
///
/// Numbered cycles must match category, label flag and series name, and the
/// leading numbers of the title must equal the calendar position in order.
/// Parsha matches on the two flags alone.
pub fn select_shiurim(
    merged: &Table,
    definition: &CycleDefinition,
    position: &CyclePosition,
) -> AppResult<Vec<ShiurId>> {
    if merged.is_empty() {
        return Ok(vec![]);
    }

    let category = definition.category_column();
    if !merged.has_column(category) {
        tracing::warn!(column = category, "Category column missing from categories table");
        return Ok(vec![]);
    }
    let Some(label) = label_column(merged, &position.label) else {
        tracing::warn!(label = %position.label, "No category column for calendar label");
        return Ok(vec![]);
    };

    let flagged = merged
        .rows()
        .filter(|row| row.flag(category) && row.flag(&label));

    match definition {
        CycleDefinition::Parsha { .. } => flagged.map(|row| row.shiur_id()).collect(),
        CycleDefinition::Numbered { series_name, .. } => {
            let series_column = required_column(merged, "series_name")?;
            let title_column = required_column(merged, "title")?;
            let expected = position.numbers.as_slice();

            flagged
                .filter(|row| {
                    row.get(&series_column)
                        .and_then(CellValue::as_label)
                        .as_deref()
                        == Some(*series_name)
                })
                .filter(|row| {
                    // A digits-only title is typed as a number; read it back as text
                    let title = row
                        .get(&title_column)
                        .and_then(CellValue::as_label)
                        .unwrap_or_default();
                    let numbers = extract_numbers(&title);
                    numbers.len() >= expected.len() && numbers[..expected.len()] == *expected
                })
                .map(|row| row.shiur_id())
                .collect()
        }
    }
}

fn required_column(merged: &Table, base: &str) -> AppResult<String> {
    shiurim_column(merged, base).ok_or_else(|| {
        AppError::DataIntegrity(format!("shiurim table has no '{}' column", base))
    })
}
