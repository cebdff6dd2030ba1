use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, HerdDataset, Record};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a herd table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one record per line (recommended)
/// * `.json`    – `[{ "EART": 20017, "DIM": 40, ... }, ...]`
/// * `.parquet` – flat columns of strings, ints, floats, bools
pub fn load_file(path: &Path) -> Result<HerdDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} records with columns {:?}",
        dataset.len(),
        dataset.column_names
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per following row.
/// Each cell's type is guessed on its own (see [`guess_cell_type`]).
fn load_csv(path: &Path) -> Result<HerdDataset> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// Parse CSV text from any reader.
pub fn read_csv<R: Read>(input: R) -> Result<HerdDataset> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let values: BTreeMap<String, CellValue> = headers
            .iter()
            .enumerate()
            .map(|(col_idx, col_name)| {
                let cell = record.get(col_idx).map_or(CellValue::Null, guess_cell_type);
                (col_name.clone(), cell)
            })
            .collect();

        records.push(Record { values });
    }

    Ok(HerdDataset::from_records(headers, records))
}

/// Cell texts read as missing values, matching the default set used by
/// the common dataframe CSV readers.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Guess the type of one CSV cell: a missing-value marker is missing, then
/// integer, float, boolean, and text as the fallback.
pub fn guess_cell_type(s: &str) -> CellValue {
    if MISSING_MARKERS.contains(&s) {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return float_cell(f);
    }
    match s {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::Text(s.to_string()),
    }
}

/// NaN marks a missing value, as in the usual dataframe exports.
fn float_cell(v: f64) -> CellValue {
    if v.is_nan() {
        CellValue::Null
    } else {
        CellValue::Float(v)
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "EART": 20017, "DIM": 40, "BREED": "Holstein", "VACC": true },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<HerdDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

/// Parse records-oriented JSON text.
pub fn parse_json(text: &str) -> Result<HerdDataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut records = Vec::with_capacity(rows.len());
    // column order: keys in first-seen order across all rows
    let mut column_names: Vec<String> = Vec::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        for key in obj.keys() {
            if seen.insert(key.as_str()) {
                column_names.push(key.clone());
            }
        }

        let values = obj
            .iter()
            .map(|(key, val)| (key.clone(), json_to_cell(val)))
            .collect();
        records.push(Record { values });
    }

    Ok(HerdDataset::from_records(column_names, records))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                float_cell(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing one herd record per row.
///
/// Columns of type Utf8/LargeUtf8, Int32/Int64, Float32/Float64 and Boolean
/// map onto the matching cell type; other column types are kept as their
/// display text.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<HerdDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let values = schema
                .fields()
                .iter()
                .zip(batch.columns())
                .map(|(field, col)| (field.name().clone(), extract_cell_value(col, row)))
                .collect();
            records.push(Record { values });
        }
    }

    Ok(HerdDataset::from_records(column_names, records))
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell_value(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| CellValue::Text(a.value(row).to_string())),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| CellValue::Text(a.value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(i64::from(a.value(row)))),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| float_cell(f64::from(a.value(row)))),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| float_cell(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        _ => array_value_to_string(col, row).ok().map(CellValue::Text),
    };
    cell.unwrap_or(CellValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    #[test]
    fn test_guess_cell_type() {
        assert_eq!(guess_cell_type(""), CellValue::Null);
        assert_eq!(guess_cell_type("20017"), CellValue::Integer(20017));
        assert_eq!(guess_cell_type("35.5"), CellValue::Float(35.5));
        assert_eq!(guess_cell_type("NaN"), CellValue::Null);
        for marker in ["NA", "N/A", "n/a", "null", "NULL", "None", "#N/A", "<NA>"] {
            assert_eq!(guess_cell_type(marker), CellValue::Null, "{marker}");
        }
        assert_eq!(guess_cell_type("NAB"), CellValue::Text("NAB".into()));
        assert_eq!(guess_cell_type("True"), CellValue::Bool(true));
        assert_eq!(guess_cell_type("false"), CellValue::Bool(false));
        assert_eq!(
            guess_cell_type("Holstein"),
            CellValue::Text("Holstein".into())
        );
    }

    #[test]
    fn test_read_csv_keeps_header_order() {
        let text = "EART,DIM,BREED,VACC\n20017,40,Holstein,True\n20018,,Jersey,\n";
        let ds = read_csv(text.as_bytes()).unwrap();
        assert_eq!(ds.column_names, vec!["EART", "DIM", "BREED", "VACC"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[1].get("DIM"), &CellValue::Null);
        assert_eq!(ds.records[0].get("VACC"), &CellValue::Bool(true));
        assert!(ds.is_bool_like("VACC"));
    }

    #[test]
    fn test_read_csv_missing_markers_keep_column_boolean() {
        let text = "EART,VACC\n20017,True\n20018,NA\n20022,False\n20031,N/A\n";
        let ds = read_csv(text.as_bytes()).unwrap();
        assert_eq!(ds.records[1].get("VACC"), &CellValue::Null);
        assert!(ds.is_bool_like("VACC"));
    }

    #[test]
    fn test_read_csv_ragged_row_is_error() {
        let text = "A,B\n1,2\n3\n";
        assert!(read_csv(text.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_json() {
        let ds = parse_json(
            r#"[{"EART": 20017, "DIM": 40.5, "VACC": true, "NOTE": null},
                {"EART": 20018, "DIM": 12, "VACC": false, "NOTE": "lame"}]"#,
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].get("DIM"), &CellValue::Float(40.5));
        assert_eq!(ds.records[1].get("DIM"), &CellValue::Integer(12));
        assert_eq!(ds.records[0].get("NOTE"), &CellValue::Null);
        assert!(parse_json(r#"{"EART": 1}"#).is_err());
    }

    #[test]
    fn test_parse_json_keeps_source_column_order() {
        let ds = parse_json(
            r#"[{"EART": 20017, "DIM": 40, "BREED": "Jersey"},
                {"EART": 20018, "LAC": 2, "DIM": 12}]"#,
        )
        .unwrap();
        assert_eq!(ds.column_names, vec!["EART", "DIM", "BREED", "LAC"]);
        assert_eq!(ds.records[0].get("LAC"), &CellValue::Null);
        assert!(parse_json("[1, 2]").is_err());
    }

    #[test]
    fn test_load_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herd.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("EART", DataType::Int64, false),
            Field::new("FCM", DataType::Float64, true),
            Field::new("BREED", DataType::Utf8, false),
            Field::new("VACC", DataType::Boolean, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![20017, 20018])),
                Arc::new(Float64Array::from(vec![Some(35.0), None])),
                Arc::new(StringArray::from(vec!["Holstein", "Jersey"])),
                Arc::new(BooleanArray::from(vec![Some(true), None])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.column_names, vec!["EART", "FCM", "BREED", "VACC"]);
        assert_eq!(ds.records[0].get("EART"), &CellValue::Integer(20017));
        assert_eq!(ds.records[1].get("FCM"), &CellValue::Null);
        assert_eq!(ds.records[1].get("BREED"), &CellValue::Text("Jersey".into()));
        assert_eq!(ds.records[0].get("VACC"), &CellValue::Bool(true));
    }

    #[test]
    fn test_load_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("herd.CSV");
        let mut f = std::fs::File::create(&csv_path).unwrap();
        writeln!(f, "EART,LAC\n20017,3").unwrap();
        assert_eq!(load_file(&csv_path).unwrap().len(), 1);

        let other = dir.path().join("herd.xlsx");
        std::fs::write(&other, b"").unwrap();
        let err = load_file(&other).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }
}
