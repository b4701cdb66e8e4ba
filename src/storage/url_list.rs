use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Read product URLs from one column of a CSV file.
///
/// Blank cells are dropped and surrounding whitespace is trimmed; order and
/// duplicates are kept as they appear.
pub fn read_url_list(path: &Path, column: &str) -> Result<Vec<String>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open URL list: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse URL list: {}", path.display()))?;

    let urls: Vec<String> = df
        .column(column)
        .with_context(|| format!("Column '{}' not found in {}", column, path.display()))?
        .str()
        .with_context(|| format!("Column '{}' does not contain text", column))?
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(String::from)
        .collect();

    info!("Loaded {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_named_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("urls.csv");
        std::fs::write(
            &path,
            "Назва,Ссылки\nАбакус,https://agroplant.com.ua/uk/abakus\nПорожньо,\nКвадріс, https://agroplant.com.ua/uk/kvadris \n",
        )
        .unwrap();

        let urls = read_url_list(&path, "Ссылки").unwrap();
        assert_eq!(
            urls,
            vec![
                "https://agroplant.com.ua/uk/abakus".to_string(),
                "https://agroplant.com.ua/uk/kvadris".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("urls.csv");
        std::fs::write(&path, "links\nhttps://a/1\n").unwrap();

        let err = read_url_list(&path, "Ссылки").unwrap_err();
        assert!(err.to_string().contains("Ссылки"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_url_list(&dir.path().join("absent.csv"), "Ссылки").is_err());
    }
}
