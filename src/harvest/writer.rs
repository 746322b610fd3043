//! Newline-delimited output writing.

use crate::error::HarvestError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write URLs newline-delimited (UTF-8) to `path`, creating parent
/// directories as needed. The caller passes an already-sorted slice.
pub fn write_sorted(path: &Path, urls: &[String]) -> Result<(), HarvestError> {
    let io = |source| HarvestError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
    }

    let file = File::create(path).map_err(io)?;
    let mut writer = BufWriter::new(file);
    for url in urls {
        writeln!(writer, "{url}").map_err(io)?;
    }
    writer.flush().map_err(io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_one_url_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        let urls = vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
        ];

        write_sorted(&path, &urls).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "https://example.com/a\nhttps://example.com/b\n");
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep/nested/urls.txt");

        write_sorted(&path, &[]).unwrap();

        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_unwritable_path_is_typed_error() {
        let err = write_sorted(Path::new("/proc/definitely/not/writable.txt"), &[]);
        assert!(matches!(err, Err(HarvestError::OutputWrite { .. })));
    }
}
