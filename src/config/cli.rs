use crate::core::parse::discover_logs;
use crate::core::{LogSource, Storage};
use crate::utils::error::{PlotterError, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}

/// Access logs on the local file system, read from the leaf directories under `root`.
#[derive(Debug, Clone)]
pub struct LocalLogSource {
    root: PathBuf,
}

impl LocalLogSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LogSource for LocalLogSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn log_files(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(PlotterError::NoLogLinesError {
                path: self.describe(),
            });
        }

        Ok(discover_logs(&self.root)?
            .into_iter()
            .map(|path| path.display().to_string())
            .collect())
    }

    fn open(&self, file: &str) -> Result<Box<dyn BufRead + Send>> {
        Ok(Box::new(BufReader::new(File::open(file)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_storage_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());

        storage.write_file("nested/report.csv", b"a,b\n").await.unwrap();

        let written = fs::read(dir.path().join("nested/report.csv")).unwrap();
        assert_eq!(written, b"a,b\n");
    }

    #[test]
    fn test_log_source_missing_root() {
        let source = LocalLogSource::new("/definitely/not/here");
        let err = source.log_files().unwrap_err();
        assert!(matches!(err, PlotterError::NoLogLinesError { .. }));
    }

    #[test]
    fn test_log_source_reads_leaf_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("2019")).unwrap();
        fs::write(dir.path().join("2019/access_log"), "line one\nline two\n").unwrap();

        let source = LocalLogSource::new(dir.path());
        let files = source.log_files().unwrap();
        assert_eq!(files.len(), 1);

        let lines: Vec<String> = source
            .open(&files[0])
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["line one", "line two"]);
    }
}
