use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type, TimeUnit, TimestampMillisecondType};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset, Row};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Options applied to every loaded table.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Column (as named in the file) opportunistically parsed as timestamps.
    pub date_column: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            date_column: "Date".to_string(),
        }
    }
}

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – comma-separated text with a header row
/// * `.json`         – `[{ "col": value, ... }, ...]`
/// * `.parquet`      – any flat Parquet table
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" | "txt" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            return load_csv_reader(file, options);
        }
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    Ok(finish(dataset, options))
}

/// Load comma-separated text from any reader (an uploaded buffer, a file).
pub fn load_csv_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Dataset> {
    Ok(finish(read_csv(reader)?, options))
}

/// Steps shared by every format: date parsing on the original column name,
/// then whitespace normalisation of all names.
fn finish(mut dataset: Dataset, options: &LoadOptions) -> Dataset {
    if dataset.column_index(&options.date_column).is_some() {
        let nulled = dataset.parse_dates(&options.date_column);
        if nulled > 0 {
            log::warn!(
                "{nulled} value(s) in '{}' could not be parsed as dates and were set to null",
                options.date_column
            );
        }
    }
    dataset.normalize_column_names();
    log::info!(
        "Loaded {} rows with columns {:?}",
        dataset.len(),
        dataset.column_names
    );
    dataset
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Records shorter than the header are padded with missing values.
fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        bail!("CSV file has no columns");
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(record.iter().map(|f| f.to_string()).collect());
    }

    Ok(Dataset::from_text_records(headers, records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Date": "2024-01-01", "Category": "A", "Value": 1.5 },
///   ...
/// ]
/// ```
///
/// Columns are ordered by first appearance; keys missing from a record are
/// missing values.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut column_names: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if seen.insert(key.clone()) {
                column_names.push(key.clone());
            }
        }
    }

    let rows: Vec<Row> = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            column_names
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(Dataset::from_rows(column_names, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Text(b.to_string()),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table.
///
/// Integer columns become `Integer`, floating and decimal columns `Float`,
/// date and timestamp columns `Timestamp`; everything else is rendered to
/// text. Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows: Vec<Row> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns: Vec<Vec<CellValue>> = batch
            .columns()
            .iter()
            .zip(&column_names)
            .map(|(col, name)| {
                column_to_cells(col).with_context(|| format!("converting column '{name}'"))
            })
            .collect::<Result<_>>()?;

        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|c| c[row].clone()).collect());
        }
    }

    Ok(Dataset::from_rows(column_names, rows))
}

// -- Arrow helpers --

/// Convert a whole Arrow column to cells by casting it to one canonical type.
fn column_to_cells(col: &ArrayRef) -> Result<Vec<CellValue>> {
    let data_type = col.data_type();

    if data_type.is_integer() {
        let arr = cast(col, &DataType::Int64)?;
        let arr = arr.as_primitive::<Int64Type>();
        return Ok((0..arr.len())
            .map(|i| if arr.is_null(i) { CellValue::Null } else { CellValue::Integer(arr.value(i)) })
            .collect());
    }

    if data_type.is_floating()
        || matches!(data_type, DataType::Decimal128(_, _) | DataType::Decimal256(_, _))
    {
        let arr = cast(col, &DataType::Float64)?;
        let arr = arr.as_primitive::<Float64Type>();
        return Ok((0..arr.len())
            .map(|i| if arr.is_null(i) { CellValue::Null } else { CellValue::Float(arr.value(i)) })
            .collect());
    }

    if matches!(
        data_type,
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _)
    ) {
        let arr = cast(col, &DataType::Timestamp(TimeUnit::Millisecond, None))?;
        let arr = arr.as_primitive::<TimestampMillisecondType>();
        return Ok((0..arr.len())
            .map(|i| {
                if arr.is_null(i) {
                    CellValue::Null
                } else {
                    arr.value_as_datetime(i)
                        .map(CellValue::Timestamp)
                        .unwrap_or(CellValue::Null)
                }
            })
            .collect());
    }

    let arr = cast(col, &DataType::Utf8)?;
    let arr = arr.as_string::<i32>();
    Ok((0..arr.len())
        .map(|i| {
            if arr.is_null(i) {
                CellValue::Null
            } else {
                CellValue::Text(arr.value(i).to_string())
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::model::ColumnKind;

    fn load_str(text: &str) -> Dataset {
        load_csv_reader(text.as_bytes(), &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_csv_infers_kinds_and_normalizes_names() {
        let ds = load_str("Product Name,Unit Price,Qty\nApple,1.5,3\nPear,2,\n");
        assert_eq!(ds.column_names, vec!["Product_Name", "Unit_Price", "Qty"]);
        assert_eq!(
            ds.column_kinds,
            vec![ColumnKind::Text, ColumnKind::Float, ColumnKind::Integer]
        );
        assert_eq!(ds.rows[1][2], CellValue::Null);
    }

    #[test]
    fn test_csv_date_column_coerces_bad_values() {
        let ds = load_str("Date,Value\n2024-01-01,1\nnot-a-date,2\n");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.kind_of("Date"), Some(ColumnKind::Timestamp));
        assert!(matches!(ds.rows[0][0], CellValue::Timestamp(_)));
        assert_eq!(ds.rows[1][0], CellValue::Null);
    }

    #[test]
    fn test_date_column_is_matched_before_renaming() {
        let options = LoadOptions {
            date_column: "Order Date".to_string(),
        };
        let ds = load_csv_reader("Order Date,Qty\n2024-02-03,1\n".as_bytes(), &options).unwrap();
        assert_eq!(ds.kind_of("Order_Date"), Some(ColumnKind::Timestamp));
    }

    #[test]
    fn test_short_records_are_padded() {
        let ds = load_str("a,b,c\n1,2\n");
        assert_eq!(ds.rows[0].len(), 3);
        assert_eq!(ds.rows[0][2], CellValue::Null);
    }

    #[test]
    fn test_header_only_csv_has_no_numeric_columns() {
        let ds = load_str("Name,Note\n");
        assert_eq!(ds.len(), 0);
        assert_eq!(ds.column_kinds, vec![ColumnKind::Text, ColumnKind::Text]);
        assert!(ds.numeric_columns().is_empty());
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(load_csv_reader("".as_bytes(), &LoadOptions::default()).is_err());
    }

    #[test]
    fn test_load_file_dispatches_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("data.csv");
        std::fs::write(&csv_path, "x,y\n1,2\n3,4\n").unwrap();
        let ds = load_file(&csv_path, &LoadOptions::default()).unwrap();
        assert_eq!(ds.len(), 2);

        let json_path = dir.path().join("data.json");
        let mut f = std::fs::File::create(&json_path).unwrap();
        write!(f, r#"[{{"Date": "2024-01-05", "v": 1}}, {{"v": 2.5, "tag": "x"}}]"#).unwrap();
        drop(f);
        let ds = load_file(&json_path, &LoadOptions::default()).unwrap();
        assert_eq!(ds.column_names, vec!["Date", "v", "tag"]);
        assert_eq!(ds.kind_of("v"), Some(ColumnKind::Float));
        assert_eq!(ds.kind_of("Date"), Some(ColumnKind::Timestamp));
        assert_eq!(ds.rows[1][0], CellValue::Null);

        let bad = dir.path().join("data.xlsx");
        std::fs::write(&bad, "").unwrap();
        assert!(load_file(&bad, &LoadOptions::default()).is_err());
    }
}
