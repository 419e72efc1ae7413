//! Chromosome sizes tables
//!
//! Tab-separated `name<TAB>length` rows, one chromosome per row. Row order is
//! the chromosome order. Blank lines and `#` comments are skipped; columns after
//! the second are ignored.

use crate::core::{read_text, ChromosomeIndex, FetchError, Result, SizesRow};
use crate::fetch::ChromSizesSource;
use std::io;
use std::path::{Path, PathBuf};

/// Split sizes text into raw rows. Lengths are validated later, when the index is built.
pub fn parse_sizes_text(text: &str) -> std::result::Result<Vec<SizesRow>, FetchError> {
    let mut rows = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('\t');
        match (fields.next(), fields.next()) {
            (Some(name), Some(length)) if !name.is_empty() => {
                rows.push(SizesRow::new(name, length));
            }
            _ => {
                return Err(FetchError::Malformed {
                    line: i + 1,
                    message: format!("expected 'name<TAB>length', got '{}'", line),
                })
            }
        }
    }

    Ok(rows)
}

/// Read a sizes file. A missing file is reported as `Ok(None)`.
pub fn read_sizes_file(path: &Path) -> std::result::Result<Option<Vec<SizesRow>>, FetchError> {
    let text = match read_text(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("chromosome sizes not found at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    parse_sizes_text(&text).map(Some)
}

/// Build a chromosome index straight from a sizes file
pub fn load_index_file(path: &Path) -> Result<Option<ChromosomeIndex>> {
    match read_sizes_file(path)? {
        Some(rows) => Ok(Some(ChromosomeIndex::from_sizes_rows(&rows)?)),
        None => Ok(None),
    }
}

/// Sizes table on the local filesystem (plain, gzip or bzip2)
#[derive(Debug, Clone)]
pub struct FileChromSizes {
    path: PathBuf,
}

impl FileChromSizes {
    /// Source reading `path` on each load
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the sizes file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChromSizesSource for FileChromSizes {
    async fn load_rows(&self) -> std::result::Result<Option<Vec<SizesRow>>, FetchError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_sizes_file(&path))
            .await
            .map_err(|e| FetchError::Upstream(format!("sizes loader task failed: {}", e)))?
    }
}

/// Sizes rows held in memory; `None` behaves like a missing table
#[derive(Debug, Clone, Default)]
pub struct InMemoryChromSizes {
    rows: Option<Vec<SizesRow>>,
}

impl InMemoryChromSizes {
    /// Source serving `rows`
    pub fn new(rows: Vec<SizesRow>) -> Self {
        Self { rows: Some(rows) }
    }

    /// Source with no sizes table
    pub fn missing() -> Self {
        Self { rows: None }
    }
}

impl ChromSizesSource for InMemoryChromSizes {
    async fn load_rows(&self) -> std::result::Result<Option<Vec<SizesRow>>, FetchError> {
        Ok(self.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{IndexError, VcfTilesetError};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_rows() {
        let text = "# hg-like\nchr1\t1000\n\nchr2\t2000\textra\r\n";
        let rows = parse_sizes_text(text).unwrap();
        assert_eq!(rows, vec![SizesRow::new("chr1", "1000"), SizesRow::new("chr2", "2000")]);
    }

    #[test]
    fn test_parse_missing_column() {
        let err = parse_sizes_text("chr1\t1000\nchr2\n").unwrap_err();
        assert!(matches!(err, FetchError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_missing_file_is_absent() {
        let rows = read_sizes_file(Path::new("/nonexistent/hg38.chrom.sizes")).unwrap();
        assert!(rows.is_none());
    }

    #[test]
    fn test_load_index_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "chr2\t2000\nchr1\t1000\n").unwrap();
        file.flush().unwrap();

        let index = load_index_file(file.path()).unwrap().unwrap();
        let names: Vec<&str> = index.chrom_names().collect();
        assert_eq!(names, vec!["chr2", "chr1"]);
        assert_eq!(index.total_length(), 3000);
    }

    #[test]
    fn test_load_index_file_bad_length() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "chr1\t1e3\n").unwrap();
        file.flush().unwrap();

        let err = load_index_file(file.path()).unwrap_err();
        assert!(matches!(
            err,
            VcfTilesetError::Index(IndexError::InvalidSizesData { line: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "chr1\t10\n").unwrap();
        file.flush().unwrap();

        let source = FileChromSizes::new(file.path());
        let rows = source.load_rows().await.unwrap().unwrap();
        assert_eq!(rows, vec![SizesRow::new("chr1", "10")]);

        let missing = FileChromSizes::new("/nonexistent/sizes.tsv");
        assert!(missing.load_rows().await.unwrap().is_none());
    }
}
