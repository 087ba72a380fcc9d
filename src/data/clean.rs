use std::collections::HashSet;

use super::model::{CellValue, ColumnKind, Dataset};

/// A destructive cleaning step applied to the loaded dataset.
/// There is no undo; reloading the file restores the original.
#[derive(Debug, Clone, PartialEq)]
pub enum CleaningOp {
    /// Drop rows identical to an earlier row, keeping the first occurrence.
    RemoveDuplicates,
    /// Replace every missing cell with the given sentinel.
    FillMissing(String),
    /// Remove the named columns; unknown names are ignored.
    DropColumns(Vec<String>),
}

/// What a cleaning step changed, for the status line and the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleaningReport {
    pub rows_removed: usize,
    pub cells_filled: usize,
    pub columns_removed: usize,
}

impl CleaningOp {
    pub fn apply(&self, dataset: &mut Dataset) -> CleaningReport {
        match self {
            CleaningOp::RemoveDuplicates => CleaningReport {
                rows_removed: remove_duplicates(dataset),
                ..Default::default()
            },
            CleaningOp::FillMissing(sentinel) => CleaningReport {
                cells_filled: fill_missing(dataset, sentinel),
                ..Default::default()
            },
            CleaningOp::DropColumns(names) => CleaningReport {
                columns_removed: drop_columns(dataset, names),
                ..Default::default()
            },
        }
    }
}

/// Returns the number of rows removed.
pub fn remove_duplicates(dataset: &mut Dataset) -> usize {
    let before = dataset.len();
    let mut seen = HashSet::new();
    dataset.rows.retain(|row| seen.insert(row.clone()));
    before - dataset.len()
}

/// Fill missing cells with `sentinel` parsed into each column's kind.
///
/// An integer column filled with a fractional sentinel is widened to float.
/// A column whose kind cannot hold the sentinel at all (e.g. `"unknown"` in
/// a numeric column) is converted to text first, so the fill never loses
/// the sentinel. Returns the number of cells filled.
pub fn fill_missing(dataset: &mut Dataset, sentinel: &str) -> usize {
    let mut filled = 0;
    for col in 0..dataset.column_count() {
        let missing = dataset.column_cells(col).filter(|v| v.is_null()).count();
        if missing == 0 {
            continue;
        }

        let kind = dataset.column_kinds[col];
        let mut value = kind.parse_field(sentinel);
        if value.is_null() && kind == ColumnKind::Integer {
            value = ColumnKind::Float.parse_field(sentinel);
            if !value.is_null() {
                convert_to_float(dataset, col);
            }
        }
        if value.is_null() {
            convert_to_text(dataset, col);
            value = CellValue::Text(sentinel.to_string());
        }

        for row in &mut dataset.rows {
            if row[col].is_null() {
                row[col] = value.clone();
            }
        }
        filled += missing;
        dataset.refresh_kind(col);
    }
    filled
}

fn convert_to_float(dataset: &mut Dataset, col: usize) {
    for row in &mut dataset.rows {
        if let CellValue::Integer(i) = row[col] {
            row[col] = CellValue::Float(i as f64);
        }
    }
    dataset.column_kinds[col] = ColumnKind::Float;
}

fn convert_to_text(dataset: &mut Dataset, col: usize) {
    for row in &mut dataset.rows {
        if !row[col].is_null() {
            row[col] = CellValue::Text(row[col].to_field());
        }
    }
    dataset.column_kinds[col] = ColumnKind::Text;
}

/// Returns the number of columns removed.
pub fn drop_columns(dataset: &mut Dataset, names: &[String]) -> usize {
    let keep: Vec<bool> = dataset
        .column_names
        .iter()
        .map(|c| !names.contains(c))
        .collect();
    let removed = keep.iter().filter(|k| !**k).count();
    if removed == 0 {
        return 0;
    }

    let mut flags = keep.iter();
    dataset.column_names.retain(|_| *flags.next().unwrap_or(&true));
    let mut flags = keep.iter();
    dataset.column_kinds.retain(|_| *flags.next().unwrap_or(&true));
    for row in &mut dataset.rows {
        let mut flags = keep.iter();
        row.retain(|_| *flags.next().unwrap_or(&true));
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{category_dataset, text};

    #[test]
    fn test_remove_duplicates_keeps_first() {
        let mut ds = category_dataset();
        ds.rows.push(ds.rows[0].clone());
        ds.rows.push(ds.rows[1].clone());
        let report = CleaningOp::RemoveDuplicates.apply(&mut ds);
        assert_eq!(report.rows_removed, 2);
        assert_eq!(ds, category_dataset());
    }

    #[test]
    fn test_fill_missing_numeric_sentinel() {
        let mut ds = Dataset::from_text_records(
            vec!["v".into(), "name".into()],
            vec![vec!["1".into(), "".into()], vec!["".into(), "b".into()]],
        );
        let filled = fill_missing(&mut ds, "0");
        assert_eq!(filled, 2);
        assert_eq!(ds.rows[1][0], CellValue::Integer(0));
        assert_eq!(ds.rows[0][1], text("0"));
        assert_eq!(ds.column_kinds[0], ColumnKind::Integer);
    }

    #[test]
    fn test_fill_missing_fractional_sentinel_widens_integer_column() {
        let mut ds = Dataset::from_text_records(
            vec!["Score".into(), "k".into()],
            vec![
                vec!["1".into(), "a".into()],
                vec!["".into(), "b".into()],
                vec!["3".into(), "c".into()],
            ],
        );
        let filled = fill_missing(&mut ds, "2.5");
        assert_eq!(filled, 1);
        assert_eq!(ds.column_kinds, vec![ColumnKind::Float, ColumnKind::Text]);
        assert_eq!(
            ds.column_cells(0).cloned().collect::<Vec<_>>(),
            vec![CellValue::Float(1.0), CellValue::Float(2.5), CellValue::Float(3.0)]
        );
        assert_eq!(ds.numeric_columns(), vec!["Score".to_string()]);
    }

    #[test]
    fn test_fill_missing_text_sentinel_converts_numeric_column() {
        let mut ds = Dataset::from_text_records(
            vec!["v".into()],
            vec![vec!["1.5".into()], vec!["".into()]],
        );
        fill_missing(&mut ds, "unknown");
        assert_eq!(ds.column_kinds[0], ColumnKind::Text);
        assert_eq!(ds.rows[0][0], text("1.5"));
        assert_eq!(ds.rows[1][0], text("unknown"));
    }

    #[test]
    fn test_drop_columns_preserves_order() {
        let mut ds = Dataset::from_rows(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![CellValue::Integer(1), CellValue::Integer(2), CellValue::Integer(3)]],
        );
        let removed = drop_columns(&mut ds, &["b".to_string(), "zzz".to_string()]);
        assert_eq!(removed, 1);
        assert_eq!(ds.column_names, vec!["a", "c"]);
        assert_eq!(ds.rows[0], vec![CellValue::Integer(1), CellValue::Integer(3)]);
        assert_eq!(ds.column_kinds.len(), 2);
    }
}
