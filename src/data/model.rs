use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a CSV reader infers.
/// Using `BTreeSet` downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Integer(_) => 1,
                Float(_) => 2,
                Timestamp(_) => 3,
                Text(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Mixed numeric columns sort by value, not by variant.
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(std::cmp::Ordering::Less),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(std::cmp::Ordering::Greater),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Timestamp(t) => t.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Timestamp(t) => write!(f, "{}", format_timestamp(t)),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64` when it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text written to a CSV field on export. Nulls become empty fields.
    pub fn to_field(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            // `{:?}` keeps a fractional part on whole numbers, so the column
            // reloads as float.
            CellValue::Float(v) => format!("{v:?}"),
            CellValue::Timestamp(t) => format_timestamp(t),
            CellValue::Null => String::new(),
        }
    }
}

/// Dates at midnight print without a time part, everything else with seconds.
pub fn format_timestamp(t: &NaiveDateTime) -> String {
    if t.time() == chrono::NaiveTime::MIN {
        t.format("%Y-%m-%d").to_string()
    } else {
        t.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

// ---------------------------------------------------------------------------
// Parsing of raw text fields
// ---------------------------------------------------------------------------

/// Field contents read as missing values.
pub const NULL_MARKERS: &[&str] = &["", "NA", "N/A", "#N/A", "NaN", "nan", "null", "NULL", "None"];

pub fn is_null_marker(s: &str) -> bool {
    NULL_MARKERS.contains(&s.trim())
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Parse a date or datetime string. Returns `None` for anything unrecognised.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
}

// ---------------------------------------------------------------------------
// ColumnKind – the single inferred type of a column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Timestamp,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }

    /// Infer the kind of a column from its raw text fields.
    ///
    /// A column without any non-missing field is treated as `Float`, the
    /// same way an all-NaN column reads in a dataframe library.
    pub fn infer_from_fields<'a>(fields: impl IntoIterator<Item = &'a str>) -> ColumnKind {
        let mut seen = false;
        let mut is_int = true;
        let mut is_float = true;
        for field in fields {
            if is_null_marker(field) {
                continue;
            }
            seen = true;
            let field = field.trim();
            if is_int && field.parse::<i64>().is_err() {
                is_int = false;
            }
            if is_float && field.parse::<f64>().is_err() {
                is_float = false;
                break;
            }
        }
        if !seen {
            ColumnKind::Float
        } else if is_int {
            ColumnKind::Integer
        } else if is_float {
            ColumnKind::Float
        } else {
            ColumnKind::Text
        }
    }

    /// Infer the kind of a column from already-typed cells.
    /// `fallback` is used when every cell is missing.
    pub fn infer_from_cells<'a>(
        cells: impl IntoIterator<Item = &'a CellValue>,
        fallback: ColumnKind,
    ) -> ColumnKind {
        let mut seen: Option<ColumnKind> = None;
        for cell in cells {
            let kind = match cell {
                CellValue::Null => continue,
                CellValue::Integer(_) => ColumnKind::Integer,
                CellValue::Float(_) => ColumnKind::Float,
                CellValue::Timestamp(_) => ColumnKind::Timestamp,
                CellValue::Text(_) => return ColumnKind::Text,
            };
            seen = Some(match (seen, kind) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(a), b) if a.is_numeric() && b.is_numeric() => ColumnKind::Float,
                _ => return ColumnKind::Text,
            });
        }
        seen.unwrap_or(fallback)
    }

    /// Convert a raw field into a cell of this kind.
    /// Fields that do not fit the kind become `Null`.
    pub fn parse_field(self, field: &str) -> CellValue {
        if is_null_marker(field) {
            return CellValue::Null;
        }
        let trimmed = field.trim();
        match self {
            ColumnKind::Text => CellValue::Text(field.to_string()),
            ColumnKind::Integer => trimmed
                .parse::<i64>()
                .map(CellValue::Integer)
                .unwrap_or(CellValue::Null),
            ColumnKind::Float => trimmed
                .parse::<f64>()
                .map(CellValue::Float)
                .unwrap_or(CellValue::Null),
            ColumnKind::Timestamp => parse_timestamp(trimmed)
                .map(CellValue::Timestamp)
                .unwrap_or(CellValue::Null),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Text => "text",
            ColumnKind::Integer => "int64",
            ColumnKind::Float => "float64",
            ColumnKind::Timestamp => "datetime",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// One row of the table, positionally aligned with `Dataset::column_names`.
pub type Row = Vec<CellValue>;

/// Replace every whitespace character in a column name with `_`.
pub fn normalize_column_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// The full parsed table. Rows are stored row-major; every row has exactly
/// `column_names.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub column_names: Vec<String>,
    pub column_kinds: Vec<ColumnKind>,
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset from raw text records, inferring one kind per column.
    ///
    /// A header-only table has nothing to infer from and reads as text.
    pub fn from_text_records(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let column_kinds: Vec<ColumnKind> = (0..width)
            .map(|col| {
                if records.is_empty() {
                    return ColumnKind::Text;
                }
                ColumnKind::infer_from_fields(
                    records.iter().map(|r| r.get(col).map(String::as_str).unwrap_or("")),
                )
            })
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                column_kinds
                    .iter()
                    .enumerate()
                    .map(|(col, kind)| kind.parse_field(record.get(col).map(String::as_str).unwrap_or("")))
                    .collect()
            })
            .collect();

        Dataset {
            column_names: headers,
            column_kinds,
            rows,
        }
    }

    /// Build a dataset from typed rows, inferring kinds from the cells.
    /// Short rows are padded with `Null`, long rows truncated.
    pub fn from_rows(column_names: Vec<String>, mut rows: Vec<Row>) -> Self {
        let width = column_names.len();
        for row in &mut rows {
            row.resize(width, CellValue::Null);
        }
        let column_kinds = (0..width)
            .map(|col| ColumnKind::infer_from_cells(rows.iter().map(|r| &r[col]), ColumnKind::Float))
            .collect();
        Dataset {
            column_names,
            column_kinds,
            rows,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.column_index(name).map(|i| self.column_kinds[i])
    }

    /// Columns whose kind is Integer or Float, in table order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.column_names
            .iter()
            .zip(&self.column_kinds)
            .filter(|(_, kind)| kind.is_numeric())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn has_numeric_columns(&self) -> bool {
        self.column_kinds.iter().any(|k| k.is_numeric())
    }

    /// Iterate over the cells of one column.
    pub fn column_cells(&self, col: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |r| &r[col])
    }

    /// Sorted distinct non-missing values of a column.
    pub fn distinct_values(&self, col: usize) -> BTreeSet<CellValue> {
        self.column_cells(col)
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }

    /// `(min, max)` over the non-missing numeric values of a column.
    pub fn numeric_span(&self, col: usize) -> Option<(f64, f64)> {
        self.column_cells(col)
            .filter_map(CellValue::as_f64)
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// First and last calendar day over the non-missing timestamps of a column.
    pub fn date_span(&self, col: usize) -> Option<(NaiveDate, NaiveDate)> {
        let mut stamps = self.column_cells(col).filter_map(CellValue::as_timestamp);
        let first = stamps.next()?;
        let (lo, hi) = stamps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        Some((lo.date(), hi.date()))
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> &[Row] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Replace whitespace in every column name with `_`.
    /// Names that collide afterwards get a `.1`, `.2`, … suffix.
    pub fn normalize_column_names(&mut self) {
        let mut seen: HashSet<String> = HashSet::new();
        for name in &mut self.column_names {
            let base = normalize_column_name(name);
            let mut candidate = base.clone();
            let mut n = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{base}.{n}");
                n += 1;
            }
            *name = candidate;
        }
    }

    /// Reparse a column as timestamps. Values that do not parse become
    /// `Null`; the load never fails because of them.
    /// Returns the number of cells that were nulled.
    pub fn parse_dates(&mut self, column: &str) -> usize {
        let Some(col) = self.column_index(column) else {
            return 0;
        };
        let mut nulled = 0;
        for row in &mut self.rows {
            let cell = &mut row[col];
            let parsed = match &*cell {
                CellValue::Timestamp(t) => CellValue::Timestamp(*t),
                CellValue::Text(s) => parse_timestamp(s).map(CellValue::Timestamp).unwrap_or(CellValue::Null),
                CellValue::Null => CellValue::Null,
                CellValue::Integer(i) => parse_timestamp(&i.to_string())
                    .map(CellValue::Timestamp)
                    .unwrap_or(CellValue::Null),
                CellValue::Float(_) => CellValue::Null,
            };
            if parsed.is_null() && !cell.is_null() {
                nulled += 1;
            }
            *cell = parsed;
        }
        self.column_kinds[col] = ColumnKind::Timestamp;
        nulled
    }

    /// Recompute the kind of a column from its current cells.
    pub fn refresh_kind(&mut self, col: usize) {
        let current = self.column_kinds[col];
        let kind = ColumnKind::infer_from_cells(self.column_cells(col), current);
        self.column_kinds[col] = kind;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    pub(crate) fn category_dataset() -> Dataset {
        Dataset::from_rows(
            vec!["Category".into(), "Value".into()],
            vec![
                vec![text("A"), CellValue::Integer(1)],
                vec![text("B"), CellValue::Integer(2)],
                vec![text("A"), CellValue::Integer(3)],
            ],
        )
    }

    #[test]
    fn test_infer_from_fields() {
        assert_eq!(ColumnKind::infer_from_fields(["1", "2", ""]), ColumnKind::Integer);
        assert_eq!(ColumnKind::infer_from_fields(["1", "2.5"]), ColumnKind::Float);
        assert_eq!(ColumnKind::infer_from_fields(["1", "x"]), ColumnKind::Text);
        assert_eq!(ColumnKind::infer_from_fields(["", "NA"]), ColumnKind::Float);
    }

    #[test]
    fn test_header_only_table_is_text() {
        let ds = Dataset::from_text_records(vec!["Name".into(), "Note".into()], Vec::new());
        assert_eq!(ds.column_kinds, vec![ColumnKind::Text, ColumnKind::Text]);
        assert!(!ds.has_numeric_columns());
    }

    #[test]
    fn test_all_missing_column_with_rows_is_float() {
        let ds = Dataset::from_text_records(
            vec!["Gap".into(), "Name".into()],
            vec![vec!["".into(), "a".into()], vec!["NA".into(), "b".into()]],
        );
        assert_eq!(ds.column_kinds, vec![ColumnKind::Float, ColumnKind::Text]);
    }

    #[test]
    fn test_infer_from_cells_mixed_numeric_is_float() {
        let cells = [CellValue::Integer(1), CellValue::Float(2.5), CellValue::Null];
        assert_eq!(ColumnKind::infer_from_cells(&cells, ColumnKind::Text), ColumnKind::Float);
        let cells = [CellValue::Integer(1), text("x")];
        assert_eq!(ColumnKind::infer_from_cells(&cells, ColumnKind::Float), ColumnKind::Text);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        assert_eq!(parse_timestamp("2024-01-01"), Some(midnight));
        assert_eq!(parse_timestamp("2024/01/01"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-01T00:00:00Z"), Some(midnight));
        assert!(parse_timestamp("2024-01-01 13:45:10").is_some());
        assert_eq!(parse_timestamp("not-a-date"), None);
    }

    #[test]
    fn test_parse_dates_nulls_bad_values() {
        let mut ds = Dataset::from_text_records(
            vec!["Date".into()],
            vec![vec!["2024-01-01".into()], vec!["not-a-date".into()]],
        );
        let nulled = ds.parse_dates("Date");
        assert_eq!(nulled, 1);
        assert_eq!(ds.column_kinds[0], ColumnKind::Timestamp);
        assert!(matches!(ds.rows[0][0], CellValue::Timestamp(_)));
        assert_eq!(ds.rows[1][0], CellValue::Null);
    }

    #[test]
    fn test_normalize_column_names() {
        let mut ds = Dataset::from_rows(
            vec!["Unit Price".into(), "Unit\tPrice".into(), "Qty".into()],
            Vec::new(),
        );
        ds.normalize_column_names();
        assert_eq!(ds.column_names, vec!["Unit_Price", "Unit_Price.1", "Qty"]);
    }

    #[test]
    fn test_distinct_values_and_span() {
        let mut ds = category_dataset();
        ds.rows.push(vec![CellValue::Null, CellValue::Null]);
        let cats: Vec<_> = ds.distinct_values(0).into_iter().collect();
        assert_eq!(cats, vec![text("A"), text("B")]);
        assert_eq!(ds.numeric_span(1), Some((1.0, 3.0)));
        assert_eq!(ds.numeric_columns(), vec!["Value".to_string()]);
    }

    #[test]
    fn test_mixed_numeric_ordering() {
        assert!(CellValue::Integer(2) > CellValue::Float(1.5));
        assert!(CellValue::Null < CellValue::Integer(-10));
    }

    #[test]
    fn test_to_field() {
        assert_eq!(CellValue::Null.to_field(), "");
        assert_eq!(CellValue::Float(2.5).to_field(), "2.5");
        assert_eq!(CellValue::Float(1.0).to_field(), "1.0");
        let t = parse_timestamp("2024-03-05 10:00:00").unwrap();
        assert_eq!(CellValue::Timestamp(t).to_field(), "2024-03-05 10:00:00");
    }
}
