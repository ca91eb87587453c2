//! Whole-file writes that never leave a half-written target behind.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Write `contents` to a sibling temp file, then rename it over `path`.
///
/// Creates the parent directory if needed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("file"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_parent_and_replaces() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("doc.md");

        write_atomic(&path, "first\n").expect("first write");
        write_atomic(&path, "second\n").expect("second write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "second\n");
        assert!(!temp.path().join("nested").join("doc.md.tmp").exists());
    }
}
