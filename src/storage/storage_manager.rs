use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};

use crate::config::ExportFormat;

/// Lays out dataset files as `<root>/<source>/<YYYY/MM/DD>/<source>.<ext>`.
pub struct StorageManager {
    root: PathBuf,
}

impl StorageManager {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn dataset_path(&self, source: &str, format: ExportFormat) -> PathBuf {
        self.dataset_path_for(source, format, Utc::now().date_naive())
    }

    pub fn dataset_path_for(&self, source: &str, format: ExportFormat, date: NaiveDate) -> PathBuf {
        self.root
            .join(source)
            .join(date.format("%Y/%m/%d").to_string())
            .join(format!("{}.{}", source, format.extension()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dated_layout() {
        let storage = StorageManager::new("output");
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();

        assert_eq!(
            storage.dataset_path_for("agroplant", ExportFormat::Csv, date),
            PathBuf::from("output/agroplant/2024/03/07/agroplant.csv")
        );
        assert_eq!(
            storage.dataset_path_for("agroplant", ExportFormat::Json, date),
            PathBuf::from("output/agroplant/2024/03/07/agroplant.ndjson")
        );
    }

    #[test]
    fn test_today_path_ends_with_extension() {
        let path = StorageManager::new("out").dataset_path("agroplant", ExportFormat::Parquet);
        assert!(path.starts_with("out/agroplant"));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("parquet"));
    }
}
