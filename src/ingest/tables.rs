use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use polars::prelude::*;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(ext))
}

/// Read a CSV, gzip-compressed CSV or Parquet table into memory.
/// CSV columns are all read as strings (identifiers like `0704.0001` must not
/// be inferred as floats); use `cast_column` to get typed values.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(anyhow::anyhow!("Input file does not exist: {}", path.display()));
    }

    if has_extension(path, "parquet") {
        return LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to scan parquet: {}", path.display()))?
            .collect()
            .with_context(|| format!("Failed to collect parquet: {}", path.display()));
    }

    let options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0));

    if has_extension(path, "gz") {
        let file =
            File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
        let mut bytes = Vec::new();
        GzDecoder::new(file)
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to decompress: {}", path.display()))?;
        return options
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .with_context(|| format!("Failed to parse CSV: {}", path.display()));
    }

    options
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open CSV: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse CSV: {}", path.display()))
}

/// Column cast to `dtype`, with a readable error naming the table
pub fn cast_column(df: &DataFrame, name: &str, dtype: &DataType) -> Result<Column> {
    let column = df
        .column(name)
        .with_context(|| format!("Missing column '{}'", name))?;
    column
        .cast(dtype)
        .with_context(|| format!("Column '{}' cannot be read as {}", name, dtype))
}
