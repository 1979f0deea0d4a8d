use chrono::NaiveDate;

use crate::models::{CellValue, Row, Table};

/// Column holding the ISO date of each calendar row
pub const DATE_COLUMN: &str = "date";

/// ISO-8601 key used by the calendar table
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn row_date(row: &Row<'_>) -> Option<String> {
    row.get(DATE_COLUMN).and_then(CellValue::as_label)
}

/// Finds the calendar row for `date`. A missing date is a normal outcome.
pub fn resolve_date(calendar: &Table, date: NaiveDate) -> Option<Row<'_>> {
    let key = date_key(date);
    calendar
        .rows()
        .find(|row| row_date(row).as_deref() == Some(key.as_str()))
}

/// All calendar rows with `start <= date <= end`, in table order.
///
/// ISO dates sort lexicographically in chronological order, so the range is
/// compared on the date strings directly.
pub fn resolve_range(calendar: &Table, start: NaiveDate, end: NaiveDate) -> Vec<Row<'_>> {
    let (start, end) = (date_key(start), date_key(end));
    calendar
        .rows()
        .filter(|row| {
            row_date(row).is_some_and(|d| d.as_str() >= start.as_str() && d.as_str() <= end.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn calendar() -> Table {
        Table::from_rows(
            "calendar",
            ["date", "d_masechta", "d_num"],
            ["2024-03-20", "2024-03-21", "2024-03-22", "2024-03-25"]
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    vec![
                        CellValue::Text(d.to_string()),
                        CellValue::Text("Shabbat".to_string()),
                        CellValue::Integer(10 + i as i64),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_existing_date() {
        let table = calendar();
        let row = resolve_date(&table, day("2024-03-21")).unwrap();
        assert_eq!(row.get("d_num"), Some(&CellValue::Integer(11)));
    }

    #[test]
    fn test_resolve_missing_date() {
        let table = calendar();
        assert!(resolve_date(&table, day("2024-03-23")).is_none());
    }

    #[test]
    fn test_resolve_range_is_inclusive_and_skips_gaps() {
        let table = calendar();
        let rows = resolve_range(&table, day("2024-03-21"), day("2024-03-25"));
        let nums: Vec<_> = rows
            .iter()
            .filter_map(|r| r.get("d_num").and_then(CellValue::as_integer))
            .collect();
        assert_eq!(nums, vec![11, 12, 13]);
    }

    #[test]
    fn test_resolve_empty_range() {
        let table = calendar();
        assert!(resolve_range(&table, day("2024-04-01"), day("2024-04-04")).is_empty());
    }
}
