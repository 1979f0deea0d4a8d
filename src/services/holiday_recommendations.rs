use chrono::{Days, NaiveDate};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{CellValue, Row, ShiurId, TableName},
    services::{
        calendar,
        merge::{self, label_column},
        providers::TableProvider,
    },
};

pub const HOLIDAY_COLUMN: &str = "holiday";
pub const ROSH_CHODESH_COLUMN: &str = "roshchodesh";

/// Calendar marker that drives a holiday recommendation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarMarker {
    Holiday(String),
    RoshChodesh(String),
}

impl CalendarMarker {
    pub fn label(&self) -> &str {
        match self {
            CalendarMarker::Holiday(label) | CalendarMarker::RoshChodesh(label) => label,
        }
    }
}

/// First marker in range order. Any holiday outranks rosh chodesh.
pub fn find_marker(rows: &[Row<'_>]) -> Option<CalendarMarker> {
    let first = |column: &str| {
        rows.iter()
            .find_map(|row| row.get(column).and_then(CellValue::as_label))
    };

    first(HOLIDAY_COLUMN)
        .map(CalendarMarker::Holiday)
        .or_else(|| first(ROSH_CHODESH_COLUMN).map(CalendarMarker::RoshChodesh))
}

/// Resolves upcoming holidays and rosh chodesh to flagged shiurim
pub struct HolidayRecommendationEngine {
    tables: Arc<dyn TableProvider>,
    window_days: u32,
}

impl HolidayRecommendationEngine {
    pub fn new(tables: Arc<dyn TableProvider>, window_days: u32) -> Self {
        Self {
            tables,
            window_days,
        }
    }

    /// Default end of the lookahead window starting at `start`
    pub fn window_end(&self, start: NaiveDate) -> AppResult<NaiveDate> {
        start
            .checked_add_days(Days::new(self.window_days.into()))
            .ok_or_else(|| AppError::InvalidInput(format!("date out of range: {}", start)))
    }

    /// Shiurim for the first holiday (or failing that, rosh chodesh) between
    /// `start` and `end` inclusive.
    ///
    /// If `start` itself is not in the calendar the range is not scanned.
    pub async fn recommend_holiday(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<ShiurId>> {
        let calendar = self.tables.load_table(TableName::Calendar).await?;
        if calendar::resolve_date(&calendar, start).is_none() {
            tracing::debug!(start = %start, "Start date not in calendar");
            return Ok(vec![]);
        }

        let rows = calendar::resolve_range(&calendar, start, end);
        let Some(marker) = find_marker(&rows) else {
            tracing::debug!(start = %start, end = %end, "No holiday or rosh chodesh in range");
            return Ok(vec![]);
        };

        let merged = merge::load_merged(self.tables.as_ref()).await?;
        let Some(column) = label_column(&merged, marker.label()) else {
            tracing::warn!(marker = ?marker, "No category column for calendar marker");
            return Ok(vec![]);
        };

        let shiurim = merged
            .rows()
            .filter(|row| row.flag(&column))
            .map(|row| row.shiur_id())
            .collect::<AppResult<Vec<_>>>()?;

        tracing::info!(
            start = %start,
            end = %end,
            marker = ?marker,
            matches = shiurim.len(),
            "Resolved holiday recommendations"
        );

        Ok(shiurim)
    }
}
