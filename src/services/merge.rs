use std::collections::{HashMap, HashSet};

use crate::{
    error::AppResult,
    models::{CellValue, Table, TableName},
    services::providers::TableProvider,
};

/// Join key shared by the categories and shiurim tables
pub const SHIUR_COLUMN: &str = "shiur";

/// Inner join of categories and shiurim on `shiur`.
///
/// Rows follow categories order, then shiurim order for repeated keys. Non-key
/// columns present in both tables are renamed with `_cat` / `_shiur` suffixes.
pub fn merge_on_shiur(categories: &Table, shiurim: &Table) -> AppResult<Table> {
    let left_names: HashSet<&str> = categories.columns().iter().map(String::as_str).collect();
    let right_names: HashSet<&str> = shiurim.columns().iter().map(String::as_str).collect();

    let mut columns = Vec::with_capacity(categories.columns().len() + shiurim.columns().len());
    for column in categories.columns() {
        if column != SHIUR_COLUMN && right_names.contains(column.as_str()) {
            columns.push(format!("{}_cat", column));
        } else {
            columns.push(column.clone());
        }
    }

    let mut right_positions = Vec::with_capacity(shiurim.columns().len());
    for (position, column) in shiurim.columns().iter().enumerate() {
        if column == SHIUR_COLUMN {
            continue;
        }
        if left_names.contains(column.as_str()) {
            columns.push(format!("{}_shiur", column));
        } else {
            columns.push(column.clone());
        }
        right_positions.push(position);
    }

    let mut by_shiur: HashMap<i64, Vec<usize>> = HashMap::new();
    for (position, row) in shiurim.rows().enumerate() {
        by_shiur.entry(row.shiur_id()?).or_default().push(position);
    }

    let mut merged = Table::new("merged", columns);
    for left in categories.rows() {
        let Some(matches) = by_shiur.get(&left.shiur_id()?) else {
            continue;
        };
        for &position in matches {
            let Some(right) = shiurim.row(position) else {
                continue;
            };
            let mut values: Vec<CellValue> = left.values().to_vec();
            values.extend(right_positions.iter().map(|&i| right.values()[i].clone()));
            merged.push_row(values)?;
        }
    }

    Ok(merged)
}

/// Loads categories and shiurim and joins them
pub async fn load_merged(tables: &dyn TableProvider) -> AppResult<Table> {
    let categories = tables.load_table(TableName::Categories).await?;
    let shiurim = tables.load_table(TableName::Shiurim).await?;
    let merged = merge_on_shiur(&categories, &shiurim)?;

    tracing::debug!(
        categories = categories.len(),
        shiurim = shiurim.len(),
        merged = merged.len(),
        "Merged categories with shiurim"
    );

    Ok(merged)
}

/// Name under which a shiurim column ended up in the merged table
pub fn shiurim_column(merged: &Table, base: &str) -> Option<String> {
    if merged.has_column(base) {
        return Some(base.to_string());
    }
    let suffixed = format!("{}_shiur", base);
    merged.has_column(&suffixed).then_some(suffixed)
}

/// Flag column for a calendar label such as a tractate, parsha or holiday.
///
/// The label is used verbatim. Compound labels ("Bava Metzia") are never split;
/// if the literal name is absent they are also tried in the bracketed form
/// (`[Bava Metzia]`) used by the cleaned category exports.
pub fn label_column(merged: &Table, label: &str) -> Option<String> {
    if merged.has_column(label) {
        return Some(label.to_string());
    }
    if label.chars().any(char::is_whitespace) {
        let bracketed = format!("[{}]", label);
        if merged.has_column(&bracketed) {
            return Some(bracketed);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn int(i: i64) -> CellValue {
        CellValue::Integer(i)
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_merge_keeps_category_order_and_drops_unmatched() {
        let categories = Table::from_rows(
            "categories",
            ["shiur", "Berakhot"],
            vec![vec![int(3), int(1)], vec![int(1), int(0)], vec![int(9), int(1)]],
        )
        .unwrap();
        let shiurim = Table::from_rows(
            "shiurim",
            ["shiur", "title", "series_name"],
            vec![
                vec![int(1), text("Berakhot 2"), text("Daf Yomi")],
                vec![int(3), text("Berakhot 3"), text("Daf Yomi")],
            ],
        )
        .unwrap();

        let merged = merge_on_shiur(&categories, &shiurim).unwrap();
        assert_eq!(merged.columns(), ["shiur", "Berakhot", "title", "series_name"]);
        let ids: Vec<_> = merged.rows().map(|r| r.shiur_id().unwrap()).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(merged.row(0).unwrap().get("title"), Some(&text("Berakhot 3")));
    }

    #[test]
    fn test_merge_suffixes_overlapping_columns() {
        let categories = Table::from_rows(
            "categories",
            ["shiur", "title"],
            vec![vec![int(1), text("category title")]],
        )
        .unwrap();
        let shiurim = Table::from_rows(
            "shiurim",
            ["shiur", "title"],
            vec![vec![int(1), text("Daf 5")]],
        )
        .unwrap();

        let merged = merge_on_shiur(&categories, &shiurim).unwrap();
        assert_eq!(merged.columns(), ["shiur", "title_cat", "title_shiur"]);
        assert_eq!(shiurim_column(&merged, "title").as_deref(), Some("title_shiur"));
    }

    #[test]
    fn test_merge_rejects_non_integer_keys() {
        let categories =
            Table::from_rows("categories", ["shiur"], vec![vec![text("abc")]]).unwrap();
        let shiurim = Table::from_rows("shiurim", ["shiur"], vec![vec![int(1)]]).unwrap();
        assert!(matches!(
            merge_on_shiur(&categories, &shiurim),
            Err(AppError::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_label_column_lookup() {
        let merged = Table::new(
            "merged",
            vec![
                "shiur".to_string(),
                "Berakhot".to_string(),
                "[Lech Lecha]".to_string(),
                "Rosh Hashana".to_string(),
            ],
        );
        assert_eq!(label_column(&merged, "Berakhot").as_deref(), Some("Berakhot"));
        assert_eq!(
            label_column(&merged, "Rosh Hashana").as_deref(),
            Some("Rosh Hashana")
        );
        assert_eq!(
            label_column(&merged, "Lech Lecha").as_deref(),
            Some("[Lech Lecha]")
        );
        assert_eq!(label_column(&merged, "Shabbat"), None);
    }
}
