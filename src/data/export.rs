use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::Dataset;

/// Write the dataset as comma-separated text, header first, columns in the
/// current order. Missing cells are written as empty fields.
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record(&dataset.column_names)
        .context("writing CSV header")?;
    for (row_no, row) in dataset.rows.iter().enumerate() {
        writer
            .write_record(row.iter().map(|cell| cell.to_field()))
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

pub fn save_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(dataset, std::io::BufWriter::new(file))?;
    log::info!("Exported {} rows to {}", dataset.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clean::CleaningOp;
    use crate::data::loader::{LoadOptions, load_csv_reader, load_file};
    use crate::data::model::ColumnKind;

    #[test]
    fn test_write_csv_after_cleaning() {
        let input = "Date,Item Name,Qty,Note\n2024-01-01,a,1,x\n2024-01-01,a,1,x\nbad,b,,y\n";
        let mut ds = load_csv_reader(input.as_bytes(), &LoadOptions::default()).unwrap();
        CleaningOp::RemoveDuplicates.apply(&mut ds);
        CleaningOp::DropColumns(vec!["Note".into()]).apply(&mut ds);

        let mut out = Vec::new();
        write_csv(&ds, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Date,Item_Name,Qty\n2024-01-01,a,1\n,b,\n");
    }

    #[test]
    fn test_save_csv_reloads_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned.csv");
        let input = "Date,v\n2024-05-06 07:08:09,1.5\n2024-05-07,2\n";
        let ds = load_csv_reader(input.as_bytes(), &LoadOptions::default()).unwrap();
        save_csv(&ds, &path).unwrap();
        let reloaded = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(reloaded, ds);
    }

    #[test]
    fn test_whole_number_floats_reload_as_float() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whole.csv");
        let ds = load_csv_reader("v\n1.0\n2.0\n".as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(ds.column_kinds, vec![ColumnKind::Float]);

        save_csv(&ds, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "v\n1.0\n2.0\n");
        let reloaded = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(reloaded.column_kinds, vec![ColumnKind::Float]);
        assert_eq!(reloaded, ds);
    }
}
