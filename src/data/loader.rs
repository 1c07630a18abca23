use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// RawTable – header + untyped cells
// ---------------------------------------------------------------------------

/// A table read straight from disk, before any cleaning.
///
/// Cells are kept as text (`None` for nulls) so that every source format goes
/// through the same cleaning rules.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a raw table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by records
/// * `.parquet` – any flat schema; nested columns are rendered as text
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(PipelineError::UnsupportedExtension(other.to_string()).into()),
    }?;

    log::debug!(
        "Read {} rows with columns {:?} from {}",
        table.rows.len(),
        table.headers,
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Rows with the wrong number of fields are skipped, not fatal.
fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::debug!("Skipping CSV row {row_no}: {e}");
                continue;
            }
        };
        if record.len() != headers.len() {
            log::debug!(
                "Skipping CSV row {row_no}: {} fields, expected {}",
                record.len(),
                headers.len()
            );
            continue;
        }
        rows.push(
            record
                .iter()
                .map(|cell| {
                    let cell = cell.trim();
                    (!cell.is_empty()).then(|| cell.to_string())
                })
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file as a raw table.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening parquet file {}", path.display()))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch.columns();
        for row in 0..batch.num_rows() {
            let cells = columns
                .iter()
                .map(|col| cell_to_string(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row}: failed to read cell"))?;
            rows.push(cells);
        }
    }

    Ok(RawTable { headers, rows })
}

// -- Parquet / Arrow helpers --

/// Render one Arrow cell as text; nulls become `None`.
fn cell_to_string(col: &Arc<dyn Array>, row: usize) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let text = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row).to_string(),
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row).to_string(),
        _ => array_value_to_string(col.as_ref(), row).context("formatting parquet cell")?,
    };
    Ok(Some(text))
}
