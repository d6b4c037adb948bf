//! Idempotent file-system effects.
//!
//! Every file the pipeline produces goes through [`write_atomic`] or
//! [`copy_atomic`]: the bytes land in a temporary file inside the destination
//! directory, which is then renamed over the target. An interrupted run
//! leaves either the old file or the new one, never a truncated one.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::PrepError;

const TEMP_PREFIX: &str = ".trackprep-";
const TEMP_SUFFIX: &str = ".tmp";

/// Creates `dir` and its parents if they do not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<(), PrepError> {
    fs::create_dir_all(dir).map_err(PrepError::file_io(dir))
}

/// Replaces `path` with `contents`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PrepError> {
    let dir = parent_dir(path);
    ensure_dir(dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(PrepError::file_io(path))?;
    temp.write_all(contents).map_err(PrepError::file_io(path))?;
    temp.flush().map_err(PrepError::file_io(path))?;

    temp.persist(path).map_err(|e| PrepError::FileIo {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Copies `src` to `dst` byte for byte, replacing `dst` atomically.
pub fn copy_atomic(src: &Path, dst: &Path) -> Result<u64, PrepError> {
    let mut reader = File::open(src).map_err(PrepError::file_io(src))?;

    let dir = parent_dir(dst);
    ensure_dir(dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(PrepError::file_io(dst))?;
    let copied = io::copy(&mut reader, &mut temp).map_err(PrepError::file_io(src))?;

    temp.persist(dst).map_err(|e| PrepError::FileIo {
        path: dst.to_path_buf(),
        source: e.error,
    })?;
    Ok(copied)
}

/// Removes `path` if it exists. Returns whether a file was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool, PrepError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(PrepError::file_io(path)(e)),
    }
}

/// Absolute, symlink-free form of `path`, which need not exist yet.
///
/// The longest existing prefix is canonicalized and the missing components
/// are appended unchanged, so two spellings of one directory resolve to the
/// same path whether or not it has been created.
pub fn resolve_path(path: &Path) -> Result<PathBuf, PrepError> {
    let mut missing: Vec<OsString> = Vec::new();
    let mut existing = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };

    loop {
        match fs::canonicalize(existing) {
            Ok(base) => {
                return Ok(missing.iter().rev().fold(base, |acc, name| acc.join(name)));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => match existing.file_name() {
                Some(name) => {
                    missing.push(name.to_os_string());
                    existing = parent_dir(existing);
                }
                None => return Err(PrepError::file_io(path)(e)),
            },
            Err(e) => return Err(PrepError::file_io(path)(e)),
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_parents_and_replaces() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("a/b/labels.txt");

        write_atomic(&path, b"first\n").expect("first write");
        write_atomic(&path, b"second\n").expect("second write");

        assert_eq!(fs::read_to_string(&path).expect("read back"), "second\n");
    }

    #[test]
    fn write_atomic_leaves_no_temp_files() {
        let temp = tempfile::tempdir().expect("create temp dir");
        write_atomic(&temp.path().join("x.txt"), b"x").expect("write");

        let names: Vec<_> = fs::read_dir(temp.path())
            .expect("list dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("x.txt")]);
    }

    #[test]
    fn copy_atomic_copies_bytes() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = temp.path().join("src.bin");
        fs::write(&src, [1u8, 2, 3]).expect("write src");

        let copied = copy_atomic(&src, &temp.path().join("out/dst.bin")).expect("copy");
        assert_eq!(copied, 3);
        assert_eq!(
            fs::read(temp.path().join("out/dst.bin")).expect("read dst"),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn remove_if_exists_tolerates_missing_files() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("stale.txt");
        fs::write(&path, "0 0.5 0.5 1 1\n").expect("write file");

        assert!(remove_if_exists(&path).expect("first remove"));
        assert!(!path.exists());
        assert!(!remove_if_exists(&path).expect("second remove"));
    }

    #[test]
    fn resolve_path_unifies_spellings() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let raw = temp.path().join("raw");
        fs::create_dir(&raw).expect("create raw");

        let direct = resolve_path(&raw).expect("resolve raw");
        let dotted = resolve_path(&temp.path().join(".").join("raw")).expect("resolve ./raw");
        let via_parent = resolve_path(&raw.join("..").join("raw")).expect("resolve raw/../raw");
        assert_eq!(direct, dotted);
        assert_eq!(direct, via_parent);
        assert!(direct.is_absolute());
    }

    #[test]
    fn resolve_path_keeps_missing_tail() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let base = fs::canonicalize(temp.path()).expect("canonical temp dir");

        let resolved = resolve_path(&temp.path().join("out/square")).expect("resolve");
        assert_eq!(resolved, base.join("out").join("square"));
    }

    #[test]
    fn copy_atomic_reports_missing_source_path() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = temp.path().join("missing.jpg");
        let err = copy_atomic(&src, &temp.path().join("dst.jpg")).unwrap_err();
        match err {
            PrepError::FileIo { path, .. } => assert_eq!(path, src),
            other => panic!("unexpected error: {other}"),
        }
    }
}
