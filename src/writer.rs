//! Output persistence: tree serialization to disk and static resource copies.
//!
//! Writes are deliberately unceremonious. There is no rollback on partial
//! failure — a crash mid-write leaves an output whose timestamp the next run
//! judges stale, so rerunning the build is always the recovery path.
//! Directory creation is idempotent; only one build runs at a time, so the
//! create-then-write sequence needs no coordination.

use crate::dom::{self, Document};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Dom(#[from] dom::DomError),
    #[error("no such file to copy: {0}")]
    SourceCopyMissing(PathBuf),
}

/// What a copy request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    /// Existing copy is newer than the source — skipped.
    SkippedFresh,
}

/// Serialize a composed tree and persist it, creating intermediate
/// directories as needed.
pub fn write_tree(doc: &Document, path: &Path) -> Result<(), WriteError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let html = dom::serialize(doc)?;
    std::fs::write(path, html)?;
    Ok(())
}

/// Copy a static resource into `dest_dir` (keeping its file name) unless the
/// existing copy is already newer than the source.
///
/// A missing source file is fatal to the run: a requested resource that does
/// not exist means the site would be silently incomplete.
pub fn copy_if_newer(source: &Path, dest_dir: &Path) -> Result<CopyOutcome, WriteError> {
    let source_meta = match std::fs::metadata(source) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WriteError::SourceCopyMissing(source.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let file_name = source
        .file_name()
        .ok_or_else(|| WriteError::SourceCopyMissing(source.to_path_buf()))?;
    let dest = dest_dir.join(file_name);

    if let (Ok(dest_meta), Ok(src_mtime)) = (std::fs::metadata(&dest), source_meta.modified()) {
        if let Ok(dest_mtime) = dest_meta.modified() {
            if dest_mtime > src_mtime {
                return Ok(CopyOutcome::SkippedFresh);
            }
        }
    }

    std::fs::create_dir_all(dest_dir)?;
    std::fs::copy(source, &dest)?;
    Ok(CopyOutcome::Copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn set_age(path: &Path, age_secs: u64) {
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn write_tree_creates_intermediate_directories() {
        let tmp = TempDir::new().unwrap();
        let doc = dom::parse("<p>hello</p>");
        let path = tmp.path().join("2024-01-01/post.html");
        write_tree(&doc, &path).unwrap();
        assert!(path.exists());
        assert!(fs::read_to_string(&path).unwrap().contains("<p>hello</p>"));
    }

    #[test]
    fn write_tree_is_idempotent_over_existing_directories() {
        let tmp = TempDir::new().unwrap();
        let doc = dom::parse("<p>x</p>");
        let path = tmp.path().join("d/post.html");
        write_tree(&doc, &path).unwrap();
        write_tree(&doc, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn copy_if_newer_copies_when_dest_absent() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("main.css");
        fs::write(&src, "body {}").unwrap();
        let out = tmp.path().join("output");

        let outcome = copy_if_newer(&src, &out).unwrap();
        assert_eq!(outcome, CopyOutcome::Copied);
        assert_eq!(fs::read_to_string(out.join("main.css")).unwrap(), "body {}");
    }

    #[test]
    fn copy_if_newer_skips_when_dest_newer() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("main.css");
        fs::write(&src, "old").unwrap();
        set_age(&src, 100);

        let out = tmp.path().join("output");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("main.css"), "already copied").unwrap();

        let outcome = copy_if_newer(&src, &out).unwrap();
        assert_eq!(outcome, CopyOutcome::SkippedFresh);
        assert_eq!(
            fs::read_to_string(out.join("main.css")).unwrap(),
            "already copied"
        );
    }

    #[test]
    fn copy_if_newer_recopies_when_source_newer() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("output");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("main.css"), "stale copy").unwrap();
        set_age(&out.join("main.css"), 100);

        let src = tmp.path().join("main.css");
        fs::write(&src, "fresh source").unwrap();

        let outcome = copy_if_newer(&src, &out).unwrap();
        assert_eq!(outcome, CopyOutcome::Copied);
        assert_eq!(
            fs::read_to_string(out.join("main.css")).unwrap(),
            "fresh source"
        );
    }

    #[test]
    fn missing_copy_source_is_hard_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.css");
        let result = copy_if_newer(&missing, tmp.path());
        assert!(matches!(result, Err(WriteError::SourceCopyMissing(_))));
    }
}
