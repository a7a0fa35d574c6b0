use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Write `contents` to `dir/name` atomically.
///
/// The bytes go to a temporary file in `dir` first and are then renamed
/// over the target, so an interrupted export never leaves a partial file.
/// An existing file with the same name is replaced.
///
/// # Errors
///
/// Returns an error if `dir` is not writable or the rename fails. The
/// temporary file is removed in that case.
pub fn write_download(dir: &Path, name: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
    let target = dir.join(name);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(&target).map_err(|err| err.error)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_download_creates_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_download(dir.path(), "mermaid-chart.svg", b"<svg/>").unwrap();
        assert_eq!(path, dir.path().join("mermaid-chart.svg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"<svg/>");
    }

    #[test]
    fn test_write_download_replaces_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        write_download(dir.path(), "out.svg", b"first").unwrap();
        let path = write_download(dir.path(), "out.svg", b"second").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_download_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(write_download(&missing, "out.svg", b"x").is_err());
        assert!(!missing.exists());
    }
}
