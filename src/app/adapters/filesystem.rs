//! Local-filesystem byte supplier
//!
//! Reads log files and discovers them under directories. The engine itself
//! never touches the filesystem; the inspection binary goes through here.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{Error, Result};

/// Extension of death-log files
pub const LOG_EXTENSION: &str = "csv";

/// Read a whole file into memory
pub fn read_source(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::file_not_found(path.display().to_string()));
    }
    let bytes = std::fs::read(path)
        .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Open a file for streaming
pub fn open_reader(path: &Path) -> Result<BufReader<File>> {
    if !path.exists() {
        return Err(Error::file_not_found(path.display().to_string()));
    }
    let file = File::open(path)
        .map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;
    Ok(BufReader::new(file))
}

/// Source identifier for a path: its file name, or the full path if it has none
pub fn source_id(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Expand files and directories into a sorted list of log files.
///
/// Files named explicitly are kept whatever their extension; directories
/// are walked for `*.csv` files.
pub fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            return Err(Error::file_not_found(path.display().to_string()));
        }

        for entry in WalkDir::new(path).follow_links(false) {
            let entry = entry?;
            let candidate = entry.path();
            if candidate.is_file()
                && candidate.extension().and_then(|ext| ext.to_str()) == Some(LOG_EXTENSION)
            {
                files.push(candidate.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();

    info!("Discovered {} log file(s)", files.len());
    for file in &files {
        debug!("  Found: {}", file.display());
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_read_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2025.05.09-00.00.00.csv");
        fs::write(&path, b"a;b;c\n").unwrap();

        assert_eq!(read_source(&path).unwrap(), b"a;b;c\n");
        assert_eq!(source_id(&path), "2025.05.09-00.00.00.csv");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.csv");

        assert!(matches!(read_source(&missing), Err(Error::FileNotFound { .. })));
        assert!(matches!(open_reader(&missing), Err(Error::FileNotFound { .. })));
        assert!(collect_sources(&[missing]).is_err());
    }

    #[test]
    fn test_open_reader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "line\n").unwrap();

        let mut text = String::new();
        open_reader(&path).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "line\n");
    }

    #[test]
    fn test_collect_sources_walks_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("server1").join("deathlogs");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("b.csv"), "").unwrap();
        fs::write(nested.join("a.csv"), "").unwrap();
        fs::write(nested.join("notes.txt"), "").unwrap();

        let explicit = dir.path().join("manual.log");
        fs::write(&explicit, "").unwrap();

        let files = collect_sources(&[dir.path().to_path_buf(), explicit.clone()]).unwrap();

        assert_eq!(files.len(), 3);
        assert!(files.contains(&explicit));
        assert!(files.contains(&nested.join("a.csv")));
        assert!(!files.iter().any(|f| f.ends_with("notes.txt")));
    }
}
