use anyhow::{Context, Result, anyhow};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

use crate::config::ExportFormat;
use crate::models::{COLUMNS, ProductRecord};

/// Build the output table; columns always appear in `COLUMNS` order, even
/// when there are no records.
pub fn records_to_dataframe(records: &[ProductRecord]) -> Result<DataFrame> {
    let rows: Vec<[&str; 6]> = records.iter().map(ProductRecord::to_row).collect();

    let mut columns = Vec::with_capacity(COLUMNS.len());
    for (position, name) in COLUMNS.iter().enumerate() {
        let values: Vec<&str> = rows.iter().map(|row| row[position]).collect();
        let series = Series::new((*name).into(), values);
        columns.push(series.into());
    }

    DataFrame::new(columns).map_err(|e| anyhow!("Failed to create DataFrame: {}", e))
}

/// Writes a dataset in one of the supported formats
pub struct DatasetWriter {
    format: ExportFormat,
}

impl DatasetWriter {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    pub fn write(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;

        match self.format {
            ExportFormat::Csv => {
                CsvWriter::new(&mut file).include_header(true).finish(df)?;
            }
            ExportFormat::Parquet => {
                ParquetWriter::new(&mut file).finish(df)?;
            }
            ExportFormat::Json => {
                JsonWriter::new(&mut file)
                    .with_json_format(JsonFormat::JsonLines)
                    .finish(df)?;
            }
        }

        info!("💾 Wrote {} rows to {}", df.height(), path.display());
        Ok(())
    }
}
