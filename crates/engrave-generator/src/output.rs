//! Whole-file output.
//!
//! Every artifact is written to a temporary sibling and renamed into place,
//! so a failed write never leaves a truncated file behind.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;
use tracing::trace;

/// Write `contents` to `path`, replacing any existing file atomically.
pub fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_ref())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    trace!(path = %path.display(), "wrote file");
    Ok(())
}

/// Copy `source` to `dest` through a temporary sibling of `dest`.
pub fn copy_atomic(source: &Path, dest: &Path) -> io::Result<u64> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;

    let mut input = File::open(source)?;
    let mut file = NamedTempFile::new_in(dir)?;
    let bytes = io::copy(&mut input, &mut file)?;
    file.as_file().sync_all()?;
    file.persist(dest).map_err(|e| e.error)?;

    trace!(src = %source.display(), dest = %dest.display(), bytes, "copied file");
    Ok(bytes)
}

/// Create a directory and its parents if absent.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/out.json");

        write_atomic(&path, "[]").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_write_atomic_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.html");

        write_atomic(&path, "first version, longer").unwrap();
        write_atomic(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");

        // no temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_copy_atomic() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.jpg");
        fs::write(&source, b"\x89PNG").unwrap();

        let dest = dir.path().join("out/photos/a.jpg");
        assert_eq!(copy_atomic(&source, &dest).unwrap(), 4);
        assert_eq!(fs::read(&dest).unwrap(), b"\x89PNG");
    }

    #[test]
    fn test_ensure_dir_idempotent() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("x/y");

        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
