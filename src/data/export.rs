use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::HerdDataset;

/// Write `dataset` as CSV: header in column order, then each record's cells
/// in text form, missing values as empty fields.
pub fn write_csv<W: Write>(dataset: &HerdDataset, output: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer
        .write_record(&dataset.column_names)
        .context("writing CSV header")?;

    for (row_no, record) in dataset.records.iter().enumerate() {
        writer
            .write_record(
                dataset
                    .column_names
                    .iter()
                    .map(|col| record.get(col).to_string()),
            )
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }

    writer.flush().context("flushing CSV output")?;
    Ok(())
}

/// Write `dataset` as CSV to a file at `path`.
pub fn save_csv(dataset: &HerdDataset, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(dataset, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;
    use crate::data::model::{CellValue, Record};

    #[test]
    fn test_write_csv() {
        let ds = HerdDataset::from_records(
            vec!["EART".into(), "FCM".into(), "VACC".into(), "BREED".into()],
            vec![
                Record::from_iter([
                    ("EART", CellValue::Integer(20017)),
                    ("FCM", CellValue::Float(35.0)),
                    ("VACC", CellValue::Bool(true)),
                    ("BREED", CellValue::Text("Brown Swiss, cross".into())),
                ]),
                Record::from_iter([("EART", CellValue::Integer(20018))]),
            ],
        );
        let mut out = Vec::new();
        write_csv(&ds, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "EART,FCM,VACC,BREED\n20017,35.0,True,\"Brown Swiss, cross\"\n20018,,,\n"
        );

        // what we write reads back as the same table
        assert_eq!(read_csv(text.as_bytes()).unwrap(), ds);
    }
}
